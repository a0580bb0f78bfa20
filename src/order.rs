use crate::model::ExtendedCommit;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Sort key for commit tables. All orders are descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Time,
    Mutations,
    Additions,
    Deletions,
}

pub fn sort_commits(commits: &[ExtendedCommit], order: OrderBy) -> Vec<ExtendedCommit> {
    let mut sorted = commits.to_vec();
    match order {
        OrderBy::Time => sorted.sort_by_key(|c| Reverse(c.committer.time)),
        OrderBy::Mutations => sorted.sort_by_key(|c| Reverse(c.additions + c.deletions)),
        OrderBy::Additions => sorted.sort_by_key(|c| Reverse(c.additions)),
        OrderBy::Deletions => sorted.sort_by_key(|c| Reverse(c.deletions)),
    }
    sorted
}
