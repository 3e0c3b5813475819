//! Per-author statistics and their cross-repository merge

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

/// Author statistics keyed by author name
pub type AuthorMap = BTreeMap<String, AuthorStats>;

/// Statistics for a single author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    /// Commits, merges included
    pub commits: u64,
    /// Lines inserted by non-merge commits
    pub lines_added: u64,
    /// Lines deleted by non-merge commits
    pub lines_removed: u64,
    /// Earliest commit timestamp (commits may arrive in any date order)
    pub first_commit_stamp: Option<i64>,
    /// Latest commit timestamp
    pub last_commit_stamp: Option<i64>,
    /// Earliest calendar day with a commit
    pub first_active_day: Option<NaiveDate>,
    /// Every calendar day with a commit
    pub active_days: BTreeSet<NaiveDate>,
}

fn min_of<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn max_of<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl AuthorStats {
    /// Create new empty author statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit seen in the commit graph
    pub fn observe_commit(&mut self, stamp: i64, day: NaiveDate) {
        self.first_commit_stamp = min_of(self.first_commit_stamp, Some(stamp));
        self.last_commit_stamp = max_of(self.last_commit_stamp, Some(stamp));
        self.first_active_day = min_of(self.first_active_day, Some(day));
        self.active_days.insert(day);
    }

    /// Count a commit with its line changes
    pub fn add_changes(&mut self, inserted: u64, deleted: u64) {
        self.commits += 1;
        self.lines_added += inserted;
        self.lines_removed += deleted;
    }

    /// Count a commit without line changes
    pub fn add_merge_commit(&mut self) {
        self.commits += 1;
    }

    /// Number of distinct days with a commit
    pub fn active_day_count(&self) -> usize {
        self.active_days.len()
    }

    /// Fold `other` into `self`: min/max of the extremes, union of days, sums
    pub fn merge(&mut self, other: &AuthorStats) {
        self.commits += other.commits;
        self.lines_added += other.lines_added;
        self.lines_removed += other.lines_removed;
        self.first_commit_stamp = min_of(self.first_commit_stamp, other.first_commit_stamp);
        self.last_commit_stamp = max_of(self.last_commit_stamp, other.last_commit_stamp);
        self.first_active_day = min_of(self.first_active_day, other.first_active_day);
        self.active_days.extend(other.active_days.iter().copied());
    }

    pub fn merged(mut self, other: &AuthorStats) -> Self {
        self.merge(other);
        self
    }
}

/// Merge every author of `from` into `into`
pub fn merge_author_maps(into: &mut AuthorMap, from: &AuthorMap) {
    for (author, stats) in from {
        into.entry(author.clone()).or_default().merge(stats);
    }
}
