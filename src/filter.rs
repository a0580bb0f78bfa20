use crate::alias;
use crate::config::FilterConfig;
use crate::error::{LensError, Result};
use crate::model::{
    Commit, Dataset, DateRange, ExtendedCommit, ExtendedFileChange, FileChange, Identity, Mutations,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Compiled include/exclude file patterns.
#[derive(Debug, Clone)]
pub struct FileFilters {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl FileFilters {
    /// Compiles every non-empty pattern, failing on the first invalid one.
    pub fn compile(config: &FilterConfig) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(&config.include_file_filters)?,
            exclude: compile_patterns(&config.exclude_file_filters)?,
        })
    }

    /// A path must match no exclude pattern and at least one include pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(path))
            || !self.include.iter().any(|re| re.is_match(path))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| Regex::new(p).map_err(|e| LensError::invalid_pattern(p, e)))
        .collect()
}

/// Builds the extended commit list for every project, ordered by committer time.
///
/// Commits by excluded authors are dropped entirely.
pub fn build_extended_commits(dataset: &Dataset, config: &FilterConfig) -> Result<Vec<ExtendedCommit>> {
    let filters = FileFilters::compile(config)?;
    let excluded_authors: HashSet<&str> = config.exclude_authors.iter().map(String::as_str).collect();
    let excluded_hashes: HashSet<&str> = config.exclude_commits.iter().map(String::as_str).collect();

    let mut commits: Vec<ExtendedCommit> = dataset
        .commits()
        .filter_map(|(project, commit)| {
            let author = alias::resolve(&commit.author, config);
            if excluded_authors.contains(author.name.as_str()) {
                trace!(hash = %commit.hash, author = %author.name, "excluded author, skipped");
                return None;
            }
            let commit_excluded = excluded_hashes.contains(commit.hash.as_str())
                || (commit.is_merge && !config.include_merge_commits);
            Some(extend_commit(&project.name, commit, author, commit_excluded, &filters, config))
        })
        .collect();

    // stable: equal timestamps keep encounter order
    commits.sort_by(|a, b| a.committer.time.cmp(&b.committer.time));

    debug!(
        commits = commits.len(),
        excluded = commits.iter().filter(|c| c.excluded).count(),
        "built extended commits"
    );
    Ok(commits)
}

fn extend_commit(
    project: &str,
    commit: &Commit,
    author: Identity,
    commit_excluded: bool,
    filters: &FileFilters,
    config: &FilterConfig,
) -> ExtendedCommit {
    let extended_files = extended_files(&commit.files, commit_excluded, filters);
    let mutations = total_mutations(&extended_files, commit_excluded);
    let (title, description) = split_message(&commit.message);

    ExtendedCommit {
        hash: commit.hash.clone(),
        message: commit.message.clone(),
        is_merge: commit.is_merge,
        project: project.to_string(),
        title,
        description,
        author,
        committer: alias::resolve(&commit.committer, config),
        additions: mutations.additions,
        deletions: mutations.deletions,
        raw_additions: mutations.raw_additions,
        raw_deletions: mutations.raw_deletions,
        extended_files,
        excluded: mutations.additions == 0 && mutations.deletions == 0,
    }
}

/// Drops rename-origin records and decides exclusion for each remaining file.
///
/// Order: commit exclusion, exclude patterns, include patterns, pure renames.
pub fn extended_files(
    files: &[FileChange],
    commit_excluded: bool,
    filters: &FileFilters,
) -> Vec<ExtendedFileChange> {
    files
        .iter()
        .filter(|f| !f.is_rename_origin())
        .map(|f| ExtendedFileChange {
            excluded: commit_excluded
                || filters.is_excluded(&f.filepath)
                || f.similarity == Some(100),
            file: f.clone(),
        })
        .collect()
}

/// Sums line mutations; binary files never count.
pub fn total_mutations(files: &[ExtendedFileChange], commit_excluded: bool) -> Mutations {
    files
        .iter()
        .filter(|f| !f.file.is_binary)
        .fold(Mutations::default(), |mut acc, f| {
            if !f.excluded && !commit_excluded {
                acc.additions += f.file.additions;
                acc.deletions += f.file.deletions;
            }
            acc.raw_additions += f.file.raw_additions;
            acc.raw_deletions += f.file.raw_deletions;
            acc
        })
}

/// Splits a commit message into a trimmed title and description at the first newline.
pub fn split_message(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((title, rest)) => (title.trim().to_string(), rest.trim().to_string()),
        None => (message.trim().to_string(), String::new()),
    }
}

pub fn commits_in_range(commits: &[ExtendedCommit], range: &DateRange) -> Vec<ExtendedCommit> {
    commits
        .iter()
        .filter(|c| range.contains(&c.committer.time))
        .cloned()
        .collect()
}

pub fn first_commit_time(commits: &[ExtendedCommit]) -> Option<DateTime<Utc>> {
    commits.first().map(|c| c.committer.time)
}

pub fn last_commit_time(commits: &[ExtendedCommit]) -> Option<DateTime<Utc>> {
    commits.last().map(|c| c.committer.time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, Aggregation};
    use crate::group::{group_by, GroupBy};
    use crate::model::Project;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
    }

    fn ident(name: &str, time: DateTime<Utc>) -> Identity {
        Identity {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            time,
        }
    }

    fn file(path: &str, add: u64, del: u64) -> FileChange {
        FileChange {
            filepath: path.to_string(),
            additions: add,
            deletions: del,
            raw_additions: add,
            raw_deletions: del,
            is_binary: false,
            similarity: None,
            rename_to: None,
        }
    }

    fn commit(hash: &str, author: &str, time: DateTime<Utc>, files: Vec<FileChange>) -> Commit {
        Commit {
            hash: hash.to_string(),
            message: format!("commit {hash}"),
            is_merge: false,
            author: ident(author, time),
            committer: ident(author, time),
            files,
        }
    }

    fn single(commits: Vec<Commit>) -> Dataset {
        Dataset {
            projects: vec![Project { name: "app".to_string(), commits }],
        }
    }

    #[test]
    fn orders_by_committer_time_stably() {
        let data = Dataset {
            projects: vec![
                Project {
                    name: "a".to_string(),
                    commits: vec![
                        commit("late", "x", at(3), vec![file("f.rs", 1, 0)]),
                        commit("tie1", "x", at(2), vec![file("f.rs", 1, 0)]),
                    ],
                },
                Project {
                    name: "b".to_string(),
                    commits: vec![
                        commit("tie2", "x", at(2), vec![file("f.rs", 1, 0)]),
                        commit("early", "x", at(1), vec![file("f.rs", 1, 0)]),
                    ],
                },
            ],
        };
        let result = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        let hashes: Vec<_> = result.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["early", "tie1", "tie2", "late"]);
        assert_eq!(result[0].project, "b");
    }

    #[test]
    fn rename_origin_records_are_dropped() {
        let mut origin = file("old.rs", 0, 4);
        origin.rename_to = Some("new.rs".to_string());
        let data = single(vec![commit("c", "x", at(1), vec![origin, file("new.rs", 4, 0)])]);
        let result = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        let paths: Vec<_> = result[0].extended_files.iter().map(|f| f.file.filepath.as_str()).collect();
        assert_eq!(paths, vec!["new.rs"]);
        assert_eq!(result[0].raw_deletions, 0);
    }

    #[test]
    fn pure_renames_are_excluded() {
        let mut renamed = file("new.rs", 0, 0);
        renamed.similarity = Some(100);
        let mut edited = file("moved.rs", 3, 1);
        edited.similarity = Some(80);
        let data = single(vec![commit("c", "x", at(1), vec![renamed, edited])]);
        let result = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        assert!(result[0].extended_files[0].excluded);
        assert!(!result[0].extended_files[1].excluded);
        assert_eq!(result[0].additions, 3);
    }

    #[test]
    fn merges_excluded_by_default_but_keep_raw_totals() {
        let mut merge = commit("m", "x", at(1), vec![file("a.rs", 5, 1)]);
        merge.is_merge = true;
        let data = single(vec![merge]);

        let result = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        let m = &result[0];
        assert!(m.excluded);
        assert_eq!((m.additions, m.deletions), (0, 0));
        assert_eq!((m.raw_additions, m.raw_deletions), (5, 1));
        assert!(m.extended_files.iter().all(|f| f.excluded));

        let config = FilterConfig {
            include_merge_commits: true,
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        assert!(!result[0].excluded);
        assert_eq!(result[0].additions, 5);
    }

    #[test]
    fn excluded_commit_hashes() {
        let data = single(vec![
            commit("keep", "x", at(1), vec![file("a.rs", 1, 1)]),
            commit("drop", "x", at(2), vec![file("a.rs", 1, 1)]),
        ]);
        let config = FilterConfig {
            exclude_commits: vec!["drop".to_string()],
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        assert!(!result[0].excluded);
        assert!(result[1].excluded);
        assert_eq!(result[1].additions, 0);
    }

    #[test]
    fn excluded_authors_match_resolved_name() {
        let data = single(vec![
            commit("c1", "bot", at(1), vec![file("a.rs", 1, 0)]),
            commit("c2", "alice", at(2), vec![file("a.rs", 1, 0)]),
        ]);
        let config = FilterConfig {
            exclude_authors: vec!["Build Bot".to_string()],
            ..FilterConfig::default().with_alias("Build Bot", &["bot"])
        };
        let result = build_extended_commits(&data, &config).unwrap();
        let hashes: Vec<_> = result.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c2"]);
        assert!(!result[0].excluded);
    }

    #[test]
    fn excluded_author_forms_no_group() {
        let data = single(vec![
            commit("c1", "bot", at(1), vec![file("a.rs", 3, 0)]),
            commit("c2", "alice", at(2), vec![file("a.rs", 1, 0)]),
        ]);
        let config = FilterConfig {
            exclude_authors: vec!["bot".to_string()],
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        let ranked = aggregate(group_by(&result, GroupBy::Author), Aggregation::Commits, 1);
        let groups: Vec<_> = ranked.iter().map(|g| (g.group.name.as_str(), g.aggregate)).collect();
        assert_eq!(groups, vec![("alice", 1)]);
    }

    #[test]
    fn exclude_filters_override_include_filters() {
        let data = single(vec![commit(
            "c",
            "x",
            at(1),
            vec![file("src/a.rs", 2, 0), file("src/gen/b.rs", 7, 0), file("README.md", 3, 0)],
        )]);
        let config = FilterConfig {
            include_file_filters: vec![r"\.rs$".to_string()],
            exclude_file_filters: vec!["gen/".to_string()],
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        let excluded: Vec<_> = result[0].extended_files.iter().map(|f| f.excluded).collect();
        assert_eq!(excluded, vec![false, true, true]);
        assert_eq!(result[0].additions, 2);
        assert_eq!(result[0].raw_additions, 12);
    }

    #[test]
    fn commit_with_everything_filtered_is_excluded() {
        let data = single(vec![commit("c", "x", at(1), vec![file("docs/a.md", 4, 0)])]);
        let config = FilterConfig {
            exclude_file_filters: vec![r"\.md$".to_string()],
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        assert!(result[0].excluded);
    }

    #[test]
    fn binary_files_never_count() {
        let mut bin = file("logo.png", 100, 50);
        bin.is_binary = true;
        let data = single(vec![commit("c", "x", at(1), vec![bin, file("a.rs", 1, 2)])]);
        let result = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        let c = &result[0];
        assert_eq!(c.mutations(), Mutations { additions: 1, deletions: 2, raw_additions: 1, raw_deletions: 2 });
        assert!(!c.extended_files[0].excluded);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let data = single(vec![commit("c", "x", at(1), vec![file("a.rs", 1, 0)])]);
        let config = FilterConfig {
            exclude_file_filters: vec!["(unclosed".to_string()],
            ..FilterConfig::default()
        };
        match build_extended_commits(&data, &config) {
            Err(LensError::InvalidFilterPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected InvalidFilterPattern, got {other:?}"),
        }
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let config = FilterConfig {
            include_file_filters: vec!["".to_string(), r"\.rs$".to_string()],
            exclude_file_filters: vec!["".to_string()],
            ..FilterConfig::default()
        };
        let filters = FileFilters::compile(&config).unwrap();
        assert!(!filters.is_excluded("src/lib.rs"));
        assert!(filters.is_excluded("README.md"));
    }

    #[test]
    fn empty_include_list_excludes_every_file() {
        let data = single(vec![
            commit("c1", "x", at(1), vec![file("a.rs", 3, 0)]),
            commit("c2", "x", at(2), vec![file("b.md", 1, 0)]),
        ]);
        let config = FilterConfig {
            include_file_filters: Vec::new(),
            ..FilterConfig::default()
        };
        let result = build_extended_commits(&data, &config).unwrap();
        assert!(result.iter().all(|c| c.extended_files.iter().all(|f| f.excluded)));
        assert!(result.iter().all(|c| c.excluded && c.additions == 0));
        assert_eq!(result[0].raw_additions, 3);

        let missing: FilterConfig = serde_json::from_str("{}").unwrap();
        assert!(!FileFilters::compile(&missing).unwrap().is_excluded("a.rs"));
    }

    #[test]
    fn splits_title_and_description() {
        assert_eq!(
            split_message("  Fix parser \n\nLonger\nbody  "),
            ("Fix parser".to_string(), "Longer\nbody".to_string())
        );
        assert_eq!(split_message("Only title"), ("Only title".to_string(), String::new()));
        assert_eq!(split_message(""), (String::new(), String::new()));
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let data = single(vec![
            commit("a", "x", at(1), vec![file("a.rs", 1, 0)]),
            commit("b", "y", at(1), vec![file("b.rs", 0, 1)]),
        ]);
        let config = FilterConfig::default();
        assert_eq!(
            build_extended_commits(&data, &config).unwrap(),
            build_extended_commits(&data, &config).unwrap()
        );
    }

    #[test]
    fn range_filter_is_inclusive() {
        let data = single(vec![
            commit("a", "x", at(1), vec![file("a.rs", 1, 0)]),
            commit("b", "x", at(2), vec![file("a.rs", 1, 0)]),
            commit("c", "x", at(3), vec![file("a.rs", 1, 0)]),
        ]);
        let commits = build_extended_commits(&data, &FilterConfig::default()).unwrap();
        let range = DateRange::new(at(2), at(3));
        let kept: Vec<_> = commits_in_range(&commits, &range).into_iter().map(|c| c.hash).collect();
        assert_eq!(kept, vec!["b".to_string(), "c".to_string()]);

        let narrow = DateRange::new(at(2) + Duration::seconds(1), at(3) - Duration::seconds(1));
        assert!(commits_in_range(&commits, &narrow).is_empty());
        assert_eq!(first_commit_time(&commits), Some(at(1)));
        assert_eq!(last_commit_time(&commits), Some(at(3)));
    }

    #[test]
    fn empty_dataset_gives_empty_list() {
        let result = build_extended_commits(&Dataset::default(), &FilterConfig::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(first_commit_time(&result), None);
    }
}
