use crate::model::{AggregatedCommitGroup, CommitGroup, ExtendedCommit};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Per-commit value summed into groups and chart buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    #[value(alias = "count")]
    #[serde(alias = "count")]
    Commits,
    Mutations,
    #[value(alias = "diff")]
    Difference,
    Additions,
    Deletions,
}

impl Aggregation {
    pub fn apply(self, commit: &ExtendedCommit) -> i64 {
        let additions = commit.additions as i64;
        let deletions = commit.deletions as i64;
        match self {
            Aggregation::Commits => 1,
            Aggregation::Mutations => additions + deletions,
            Aggregation::Difference => additions - deletions,
            Aggregation::Additions => additions,
            Aggregation::Deletions => deletions,
        }
    }

    pub fn sum(self, commits: &[ExtendedCommit]) -> i64 {
        commits.iter().map(|c| self.apply(c)).sum()
    }
}

/// Reduces each group to its aggregate and ranks groups from highest to lowest.
///
/// Ranking is stable, so tied groups keep their name order.
pub fn aggregate(
    groups: Vec<CommitGroup>,
    aggregation: Aggregation,
    period_count: usize,
) -> Vec<AggregatedCommitGroup> {
    let periods = period_count.max(1) as f64;
    let mut result: Vec<AggregatedCommitGroup> = groups
        .into_iter()
        .map(|group| {
            let total = aggregation.sum(&group.commits);
            AggregatedCommitGroup {
                group,
                aggregate: total,
                average: total as f64 / periods,
            }
        })
        .collect();
    result.sort_by_key(|g| Reverse(g.aggregate));
    result
}
