//! Records and keys shared by the statistics maps

use std::fmt;

use serde::{Serialize, Serializer};

/// Composite key of every date-indexed map
///
/// Orders by timestamp first, so records of several repositories interleave
/// chronologically. Two repositories committing in the same second keep
/// separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StampKey {
    pub stamp: i64,
    pub repository: String,
}

impl StampKey {
    pub fn new(stamp: i64, repository: impl Into<String>) -> Self {
        Self {
            stamp,
            repository: repository.into(),
        }
    }

    /// Parse the `"<stamp> <repository>"` display form
    pub fn parse(text: &str) -> Option<Self> {
        let (stamp, repository) = text.split_once(' ')?;
        Some(Self::new(stamp.parse().ok()?, repository))
    }
}

impl fmt::Display for StampKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.stamp, self.repository)
    }
}

impl Serialize for StampKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One line of the commit graph stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMeta {
    pub timestamp: i64,
    pub author: String,
    pub email_domain: String,
    pub timezone: String,
}

impl CommitMeta {
    /// Parse `<stamp> <date> <time> <tz> <author> <<mail>>`
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.splitn(5, ' ');
        let timestamp = parts.next()?.parse().ok()?;
        let _date = parts.next()?;
        let _time = parts.next()?;
        let timezone = parts.next()?.to_string();
        let (author, mail) = parts.next()?.split_once('<')?;
        let mail = mail.trim_end_matches('>');
        let email_domain = match mail.rsplit_once('@') {
            Some((_, domain)) => domain.to_string(),
            None => "?".to_string(),
        };
        Some(Self {
            timestamp,
            author: author.trim_end().to_string(),
            email_domain,
            timezone,
        })
    }
}

/// Timeline entry of one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateChange {
    pub files: u64,
    pub inserted: u64,
    pub deleted: u64,
    /// Lines in the repository after this commit
    pub lines: i64,
}

/// Changes of one author at one stamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthorChange {
    pub lines_added: u64,
    pub lines_removed: u64,
    /// The author's running commit count in the repository
    pub commits: u64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub merge_commit: bool,
}

/// Tracked files at one revision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub files: u64,
    pub delta_files: i64,
}

/// Blame-owned lines of one author at one revision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthorLines {
    pub lines: u64,
    pub delta_lines: i64,
}
