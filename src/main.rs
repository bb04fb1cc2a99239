mod github;
mod stats;
mod svg;

use github::GithubClient;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = GithubClient::new()?;
    let login = github::resolve_login()?;

    // Complete repository listing; any failure here aborts the run.
    let repos = client.language_repos(&login).await?;

    let by_count = stats::languages_by_repo_count(&repos);
    if by_count.is_empty() {
        eprintln!("Warning: no repository language data found for {login}");
    }

    // Commit counts are only fetched for repositories that tally somewhere.
    let counted: Vec<&stats::Repo> = repos
        .iter()
        .filter(|repo| repo.counted_language().is_some())
        .collect();
    let commit_counts = client.commit_counts(&login, &counted).await;
    let by_activity = stats::commit_weighted_languages(
        counted
            .iter()
            .zip(&commit_counts)
            .filter_map(|(repo, count)| repo.counted_language().map(|lang| (lang, *count))),
    );

    let document = svg::render(
        &stats::top_n_with_other(&by_count, stats::TOP_N),
        &stats::top_n_with_other(&by_activity, stats::TOP_N),
    );
    fs::write(svg::OUTPUT_FILE, document)?;

    println!("Wrote {}", svg::OUTPUT_FILE);

    Ok(())
}
