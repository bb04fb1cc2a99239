use std::collections::BTreeMap;

/// How many languages each chart shows before the rest collapses into "Other".
pub const TOP_N: usize = 5;

/// Languages dropped from both tallies. Empty by default.
pub const EXCLUDED_LANGUAGES: &[&str] = &[];

/// A public, non-fork repository with its best-effort primary language.
#[derive(Debug, Clone)]
pub struct Repo {
    pub name: String,
    pub language: Option<String>,
}

impl Repo {
    /// Language this repository is tallied under, if any.
    ///
    /// `None` when GitHub reports no language or when the language is on the
    /// exclusion list; such repositories contribute to neither tally.
    pub fn counted_language(&self) -> Option<&str> {
        self.language
            .as_deref()
            .filter(|lang| !EXCLUDED_LANGUAGES.contains(lang))
    }
}

/// A language tally. `BTreeMap` keeps iteration order deterministic, so equal
/// values sort reproducibly in `top_n_with_other`.
pub type Tally = BTreeMap<String, u64>;

/// Number of repositories per language.
pub fn languages_by_repo_count(repos: &[Repo]) -> Tally {
    let mut counts = Tally::new();
    for repo in repos {
        if let Some(lang) = repo.counted_language() {
            *counts.entry(lang.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Summed commit counts per language, from (language, commits) pairs.
pub fn commit_weighted_languages<'a, I>(pairs: I) -> Tally
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut weighted = Tally::new();
    for (lang, commits) in pairs {
        *weighted.entry(lang.to_string()).or_insert(0) += commits;
    }
    weighted
}

/// The `n` largest entries by value, descending, plus a trailing "Other"
/// entry holding the exact sum of everything past rank `n`. "Other" is
/// omitted when that remainder is zero. Ties keep the tally's alphabetical
/// order (the sort is stable).
pub fn top_n_with_other(tally: &Tally, n: usize) -> Vec<(String, u64)> {
    let mut items: Vec<(String, u64)> = tally.iter().map(|(k, v)| (k.clone(), *v)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));

    let other: u64 = items.iter().skip(n).map(|(_, v)| v).sum();
    items.truncate(n);
    if other > 0 {
        items.push(("Other".to_string(), other));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(name: &str, language: Option<&str>) -> Repo {
        Repo {
            name: name.to_string(),
            language: language.map(str::to_string),
        }
    }

    fn tally(entries: &[(&str, u64)]) -> Tally {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn repo_count_tally_skips_languageless_repos() {
        let repos = vec![
            repo("alpha", Some("Rust")),
            repo("beta", Some("Rust")),
            repo("gamma", Some("Go")),
            repo("dotfiles", None),
        ];

        let counts = languages_by_repo_count(&repos);

        assert_eq!(counts, tally(&[("Go", 1), ("Rust", 2)]));
    }

    #[test]
    fn empty_repo_list_yields_empty_tallies() {
        assert!(languages_by_repo_count(&[]).is_empty());

        let no_pairs: [(&str, u64); 0] = [];
        assert!(commit_weighted_languages(no_pairs).is_empty());
    }

    #[test]
    fn commit_weights_sum_per_language() {
        let weighted =
            commit_weighted_languages([("Rust", 40), ("Go", 3), ("Rust", 2), ("Python", 1)]);

        assert_eq!(weighted, tally(&[("Go", 3), ("Python", 1), ("Rust", 42)]));
    }

    #[test]
    fn top_n_collapses_remainder_into_other() {
        // Worked example: six languages, N=5, the Ruby entry becomes "Other".
        let data = tally(&[
            ("Go", 12),
            ("Rust", 7),
            ("Python", 3),
            ("TS", 2),
            ("C", 1),
            ("Ruby", 1),
        ]);

        let top = top_n_with_other(&data, 5);

        assert_eq!(
            top,
            vec![
                ("Go".to_string(), 12),
                ("Rust".to_string(), 7),
                ("Python".to_string(), 3),
                ("TS".to_string(), 2),
                ("C".to_string(), 1),
                ("Other".to_string(), 1),
            ]
        );
        let total: u64 = top.iter().map(|(_, v)| v).sum();
        assert_eq!(total, 26);
    }

    #[test]
    fn top_n_output_is_bounded_and_other_is_exact() {
        let data = tally(&[
            ("A", 10),
            ("B", 9),
            ("C", 8),
            ("D", 7),
            ("E", 6),
            ("F", 5),
            ("G", 4),
        ]);

        let top = top_n_with_other(&data, 5);

        assert_eq!(top.len(), 6);
        assert_eq!(top.last(), Some(&("Other".to_string(), 9)));
    }

    #[test]
    fn other_omitted_when_remainder_is_zero() {
        let data = tally(&[("A", 3), ("B", 2)]);
        let top = top_n_with_other(&data, 5);
        assert_eq!(top, vec![("A".to_string(), 3), ("B".to_string(), 2)]);

        // Entries past rank n that sum to zero also drop out.
        let data = tally(&[("A", 3), ("B", 2), ("C", 0)]);
        let top = top_n_with_other(&data, 2);
        assert_eq!(top, vec![("A".to_string(), 3), ("B".to_string(), 2)]);
    }

    #[test]
    fn top_n_is_already_sorted() {
        let data = tally(&[("A", 1), ("B", 50), ("C", 3), ("D", 3), ("E", 7), ("F", 2)]);

        let top = top_n_with_other(&data, 4);

        // Everything before "Other" is descending; re-sorting changes nothing.
        let ranked = &top[..top.len() - 1];
        let mut resorted = ranked.to_vec();
        resorted.sort_by(|a, b| b.1.cmp(&a.1));
        assert_eq!(ranked, &resorted[..]);
        assert_eq!(top.last().map(|(label, _)| label.as_str()), Some("Other"));
    }

    #[test]
    fn equal_values_break_ties_deterministically() {
        let data = tally(&[("Zig", 2), ("Ada", 2), ("Nim", 2)]);
        let top = top_n_with_other(&data, 2);

        assert_eq!(
            top,
            vec![
                ("Ada".to_string(), 2),
                ("Nim".to_string(), 2),
                ("Other".to_string(), 2),
            ]
        );
    }
}
