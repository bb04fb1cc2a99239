use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::{LINK, RETRY_AFTER};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::stats::Repo;

const USER_AGENT: &str = "langchart";

/// Commit listings are one independent call per repository; this bounds how
/// many are in flight at once.
const COMMIT_FETCH_CONCURRENCY: usize = 8;

/// Public, owner-affiliated, non-fork repositories with the declared primary
/// language and a secondary breakdown as fallback.
const REPOSITORIES_QUERY: &str = r#"
query ($login: String!, $after: String) {
  user(login: $login) {
    repositories(first: 100, after: $after, privacy: PUBLIC, ownerAffiliations: OWNER, isFork: false) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name
        primaryLanguage { name }
        languages(first: 20) { edges { node { name } } }
      }
    }
  }
}
"#;

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a GitHub client using the GITHUB_TOKEN env variable.
    pub fn new() -> Result<Self> {
        let token =
            std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable not set")?;
        Ok(Self {
            token: Arc::new(token),
            http: Arc::new(Client::new()),
        })
    }

    /// Low-level GraphQL request with basic retry/backoff and `errors` checking.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        let body = serde_json::json!({ "query": query, "variables": variables });

        loop {
            attempt += 1;

            let req = self
                .http
                .post("https://api.github.com/graphql")
                .bearer_auth(&*self.token)
                .header("User-Agent", USER_AGENT)
                .json(&body);

            let resp = req
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Network error sending GraphQL request: {e}"))?;

            let status = resp.status();
            let headers = resp.headers().clone();

            // Parse JSON (even for non-2xx to capture error payloads)
            let json: Value = resp
                .json()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON from GitHub: {e}"))?;

            // If GraphQL returned an `errors` field, treat it as an error.
            if let Some(errors) = json.get("errors") {
                return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
            }

            if status.is_success() {
                return Ok(json);
            }

            // If rate limited, honor Retry-After header when present
            if status.as_u16() == 429 {
                if attempt >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "GitHub API returned 429 (rate-limited) and retries exhausted"
                    ));
                }
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            // Retry on 5xx server errors
            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                sleep(backoff).await;
                continue;
            }

            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }
    }

    /// Fetch every public, owner-affiliated, non-fork repository of `login`,
    /// following the cursor until the listing is exhausted. Any failure here
    /// is fatal: all aggregation depends on a complete repository set.
    pub async fn language_repos(&self, login: &str) -> Result<Vec<Repo>> {
        #[derive(Deserialize)]
        struct RepoPageResponse {
            data: Option<RepoPageData>,
        }
        #[derive(Deserialize)]
        struct RepoPageData {
            user: Option<RepoPageUser>,
        }
        #[derive(Deserialize)]
        struct RepoPageUser {
            repositories: RepoConnection,
        }
        #[derive(Deserialize)]
        struct RepoConnection {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Option<Vec<RepoNode>>,
        }
        #[derive(Deserialize)]
        struct PageInfo {
            #[serde(rename = "hasNextPage")]
            has_next_page: bool,
            #[serde(rename = "endCursor")]
            end_cursor: Option<String>,
        }
        #[derive(Deserialize)]
        struct RepoNode {
            name: String,
            #[serde(rename = "primaryLanguage")]
            primary_language: Option<LanguageName>,
            languages: Option<LanguageConnection>,
        }
        #[derive(Deserialize)]
        struct LanguageName {
            name: String,
        }
        #[derive(Deserialize)]
        struct LanguageConnection {
            edges: Option<Vec<LanguageEdge>>,
        }
        #[derive(Deserialize)]
        struct LanguageEdge {
            node: LanguageName,
        }

        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = serde_json::json!({ "login": login, "after": cursor });
            let json = self.graphql(REPOSITORIES_QUERY, variables).await?;
            let parsed: RepoPageResponse = serde_json::from_value(json)
                .context("Failed to deserialize repository page response")?;

            let page = parsed
                .data
                .and_then(|d| d.user)
                .map(|u| u.repositories)
                .ok_or_else(|| anyhow::anyhow!("No repository data returned for user {login}"))?;

            if let Some(nodes) = page.nodes {
                for node in nodes {
                    // Prefer the declared primary language, else the first
                    // entry of the secondary breakdown, else no language.
                    let language = node.primary_language.map(|l| l.name).or_else(|| {
                        node.languages
                            .and_then(|c| c.edges)
                            .and_then(|edges| edges.into_iter().next())
                            .map(|edge| edge.node.name)
                    });
                    repos.push(Repo {
                        name: node.name,
                        language,
                    });
                }
            }

            if !page.page_info.has_next_page {
                break;
            }
            cursor = page.page_info.end_cursor;
        }

        Ok(repos)
    }

    /// Best-effort commit count for one repository. Any failure degrades to
    /// a count of 1 with a warning, so commit counting never aborts a run.
    pub async fn commit_count(&self, login: &str, repo: &str) -> u64 {
        match self.try_commit_count(login, repo).await {
            Ok(count) => count,
            Err(e) => {
                eprintln!("Warning: commit count for {login}/{repo} failed ({e:#}); defaulting to 1");
                1
            }
        }
    }

    /// Commit counts for each repository, index-aligned with `repos`. The
    /// calls are independent, so they run through a bounded fan-out.
    pub async fn commit_counts(&self, login: &str, repos: &[&Repo]) -> Vec<u64> {
        stream::iter(repos)
            .map(|repo| self.commit_count(login, &repo.name))
            .buffered(COMMIT_FETCH_CONCURRENCY)
            .collect()
            .await
    }

    /// Estimate the commit count from a single page-size-1 commit listing:
    /// with a paginated response the last page number equals the count,
    /// otherwise the returned page is already the complete list.
    async fn try_commit_count(&self, login: &str, repo: &str) -> Result<u64> {
        let url = format!("https://api.github.com/repos/{login}/{repo}/commits?per_page=1");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&*self.token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network error fetching commits: {e}"))?;

        let status = resp.status();
        let headers = resp.headers().clone();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "commit listing returned HTTP {}: {body}",
                status.as_u16()
            ));
        }

        match headers.get(LINK).and_then(|v| v.to_str().ok()) {
            Some(link) => last_page_from_link(link).ok_or_else(|| {
                anyhow::anyhow!("could not parse last-page number from Link header: {link}")
            }),
            // Small repos return the full list in one page.
            None => {
                let commits: Vec<Value> = resp
                    .json()
                    .await
                    .context("Failed to deserialize commit listing")?;
                Ok(commits.len() as u64)
            }
        }
    }
}

/// Page number from the `rel="last"` segment of a Link header. The URL also
/// carries `per_page=`, so only the text after the final `page=` counts.
fn last_page_from_link(link: &str) -> Option<u64> {
    let last = link.split(',').find(|part| part.contains("rel=\"last\""))?;
    let tail = last.rsplit("page=").next()?;
    tail.split('>').next()?.parse().ok()
}

/// Account login from GH_USERNAME, falling back to the owner half of the
/// GITHUB_REPOSITORY slug provided by CI.
pub fn resolve_login() -> Result<String> {
    login_from(
        std::env::var("GH_USERNAME").ok(),
        std::env::var("GITHUB_REPOSITORY").ok(),
    )
    .context("Could not determine GitHub login; set GH_USERNAME or GITHUB_REPOSITORY")
}

fn login_from(username: Option<String>, repo_slug: Option<String>) -> Option<String> {
    username.filter(|name| !name.is_empty()).or_else(|| {
        repo_slug
            .and_then(|slug| slug.split('/').next().map(str::to_string))
            .filter(|owner| !owner.is_empty())
    })
}
