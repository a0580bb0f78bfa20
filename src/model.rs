use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SCHEMA_VERSION: u32 = 1;

/// An author or committer signature as recorded in history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub filepath: String,
    pub additions: u64,
    pub deletions: u64,
    #[serde(default)]
    pub raw_additions: u64,
    #[serde(default)]
    pub raw_deletions: u64,
    #[serde(default)]
    pub is_binary: bool,
    /// 0-100, only present for renames and copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
    /// Set on the origin side of a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

impl FileChange {
    pub fn is_rename_origin(&self) -> bool {
        self.rename_to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_merge: bool,
    pub author: Identity,
    pub committer: Identity,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Dataset {
    pub fn commits(&self) -> impl Iterator<Item = (&Project, &Commit)> {
        self.projects
            .iter()
            .flat_map(|p| p.commits.iter().map(move |c| (p, c)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedFileChange {
    #[serde(flatten)]
    pub file: FileChange,
    pub excluded: bool,
}

/// Additions and deletions of a commit, before (`raw_*`) and after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutations {
    pub additions: u64,
    pub deletions: u64,
    pub raw_additions: u64,
    pub raw_deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedCommit {
    pub hash: String,
    pub message: String,
    pub is_merge: bool,
    pub project: String,
    pub title: String,
    pub description: String,
    pub author: Identity,
    pub committer: Identity,
    pub additions: u64,
    pub deletions: u64,
    pub raw_additions: u64,
    pub raw_deletions: u64,
    pub extended_files: Vec<ExtendedFileChange>,
    pub excluded: bool,
}

impl ExtendedCommit {
    pub fn mutations(&self) -> Mutations {
        Mutations {
            additions: self.additions,
            deletions: self.deletions,
            raw_additions: self.raw_additions,
            raw_deletions: self.raw_deletions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitGroup {
    pub name: String,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
    pub commits: Vec<ExtendedCommit>,
}

impl CommitGroup {
    pub fn new(name: String, first: &ExtendedCommit) -> Self {
        Self {
            name,
            first_commit: first.author.time,
            last_commit: first.author.time,
            commits: Vec::new(),
        }
    }

    pub fn add_commit(&mut self, commit: ExtendedCommit) {
        self.first_commit = self.first_commit.min(commit.author.time);
        self.last_commit = self.last_commit.max(commit.author.time);
        self.commits.push(commit);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCommitGroup {
    #[serde(flatten)]
    pub group: CommitGroup,
    pub aggregate: i64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineColor {
    pub border_color: String,
    pub background_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub label: String,
    pub data: Vec<ChartPoint>,
    #[serde(flatten)]
    pub color: LineColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub lines: Vec<Line>,
    pub others: Vec<String>,
    pub has_negatives: bool,
}

/// Inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        timestamp >= &self.start && timestamp <= &self.end
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub entries: Vec<ExtendedCommit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub aliases_resolved: bool,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub periods: usize,
    pub groups: Vec<GroupSummary>,
}

/// An aggregated group without its member commits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
    pub commit_count: usize,
    pub aggregate: i64,
    pub average: f64,
}

impl From<&AggregatedCommitGroup> for GroupSummary {
    fn from(g: &AggregatedCommitGroup) -> Self {
        Self {
            name: g.group.name.clone(),
            first_commit: g.group.first_commit,
            last_commit: g.group.last_commit,
            commit_count: g.group.commits.len(),
            aggregate: g.aggregate,
            average: g.average,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub chart: Arc<ChartData>,
}
