use crate::model::{ExtendedCommit, ExtendedFileChange, FileChange, Identity};
use chrono::{DateTime, TimeZone, Utc};

pub fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn ymd_h(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn ext_file(path: &str, additions: u64, deletions: u64) -> ExtendedFileChange {
    ExtendedFileChange {
        file: FileChange {
            filepath: path.to_string(),
            additions,
            deletions,
            raw_additions: additions,
            raw_deletions: deletions,
            is_binary: false,
            similarity: None,
            rename_to: None,
        },
        excluded: false,
    }
}

/// An already-extended commit whose totals are the sum of `files`.
pub fn ext_commit(
    hash: &str,
    project: &str,
    author: &str,
    time: DateTime<Utc>,
    files: Vec<ExtendedFileChange>,
) -> ExtendedCommit {
    let additions = files.iter().map(|f| f.file.additions).sum();
    let deletions = files.iter().map(|f| f.file.deletions).sum();
    let ident = Identity {
        name: author.to_string(),
        email: format!("{author}@example.com"),
        time,
    };
    ExtendedCommit {
        hash: hash.to_string(),
        message: hash.to_string(),
        is_merge: false,
        project: project.to_string(),
        title: hash.to_string(),
        description: String::new(),
        author: ident.clone(),
        committer: ident,
        additions,
        deletions,
        raw_additions: additions,
        raw_deletions: deletions,
        excluded: additions == 0 && deletions == 0,
        extended_files: files,
    }
}

pub fn simple_commit(hash: &str, author: &str, time: DateTime<Utc>, add: u64, del: u64) -> ExtendedCommit {
    ext_commit(hash, "app", author, time, vec![ext_file("src/lib.rs", add, del)])
}
