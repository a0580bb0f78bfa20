use crate::filter::total_mutations;
use crate::model::{CommitGroup, ExtendedCommit, ExtendedFileChange};
use crate::util::{case_insensitive_cmp, file_type_key};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Author,
    Project,
    /// Keyed by lowercased file extension. A commit touching several file
    /// types contributes a partial commit, holding only the matching files,
    /// to each of those groups.
    Filetype,
}

/// Partitions commits into groups sorted case-insensitively by name.
pub fn group_by(commits: &[ExtendedCommit], dimension: GroupBy) -> Vec<CommitGroup> {
    let mut groups: HashMap<String, CommitGroup> = HashMap::new();

    for commit in commits {
        for (key, member) in keyed_members(commit, dimension) {
            groups
                .entry(key.clone())
                .or_insert_with(|| CommitGroup::new(key, &member))
                .add_commit(member);
        }
    }

    let mut result: Vec<CommitGroup> = groups.into_values().collect();
    result.sort_by(|a, b| case_insensitive_cmp(&a.name, &b.name));
    debug!(?dimension, groups = result.len(), "grouped commits");
    result
}

fn keyed_members(commit: &ExtendedCommit, dimension: GroupBy) -> Vec<(String, ExtendedCommit)> {
    match dimension {
        GroupBy::Author => vec![(commit.author.name.clone(), commit.clone())],
        GroupBy::Project => vec![(commit.project.clone(), commit.clone())],
        GroupBy::Filetype => split_by_file_type(commit),
    }
}

/// Commits without surfaced files have no file type and are left out.
fn split_by_file_type(commit: &ExtendedCommit) -> Vec<(String, ExtendedCommit)> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<ExtendedFileChange>> = HashMap::new();
    for file in &commit.extended_files {
        let key = file_type_key(&file.file.filepath);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(file.clone());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let files = buckets.remove(&key)?;
            let mutations = total_mutations(&files, false);
            let partial = ExtendedCommit {
                additions: mutations.additions,
                deletions: mutations.deletions,
                raw_additions: mutations.raw_additions,
                raw_deletions: mutations.raw_deletions,
                excluded: mutations.additions == 0 && mutations.deletions == 0,
                extended_files: files,
                ..commit.clone()
            };
            Some((key, partial))
        })
        .collect()
}
