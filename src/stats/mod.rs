//! Statistics aggregation
//!
//! [`StatisticsAggregator`] is the in-memory model filled by the collector
//! passes. Maps grow monotonically during a run; every date-indexed map is
//! keyed by [`StampKey`] so several repositories can share one model.
//! Author statistics accumulate per repository and are merged into the
//! cross-repository totals by [`StatisticsAggregator::finish_repository`].

pub mod activity;
pub mod authors;
pub mod extensions;
pub mod model;
pub mod tags;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::warn;
use serde::Serialize;

use crate::extract::tasks::AuthorLineCounts;
use crate::shortstat::{ChangeRecord, CommitHeader};

pub use activity::{ActivityStats, BusiestCounter, HourOfWeek};
pub use authors::{merge_author_maps, AuthorMap, AuthorStats};
pub use extensions::{classify_extension, ExtensionMap, ExtensionStats};
pub use model::{AuthorChange, AuthorLines, CommitMeta, DateChange, FileCount, StampKey};
pub use tags::{TagInfo, TagMap};

const SECONDS_PER_DAY: i64 = 86_400;

fn utc(stamp: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(stamp, 0)
}

/// Aggregated repository statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatisticsAggregator {
    total_authors: BTreeSet<String>,
    authors: AuthorMap,
    /// Authors of the repository being collected
    #[serde(skip)]
    pending_authors: AuthorMap,
    tags: BTreeMap<String, TagMap>,

    first_commit_stamp: Option<i64>,
    last_commit_stamp: Option<i64>,
    total_commits: u64,
    domains: BTreeMap<String, u64>,
    activity: ActivityStats,
    commits_by_month: BTreeMap<String, u64>,
    commits_by_year: BTreeMap<i32, u64>,
    author_of_month: BTreeMap<String, BTreeMap<String, u64>>,
    author_of_year: BTreeMap<i32, BTreeMap<String, u64>>,
    first_active_day: Option<NaiveDate>,
    active_days: BTreeSet<NaiveDate>,
    commits_by_timezone: BTreeMap<String, u64>,

    total_size: u64,
    total_files: u64,
    extensions: ExtensionMap,

    total_lines: BTreeMap<String, i64>,
    total_lines_added: BTreeMap<String, u64>,
    total_lines_removed: BTreeMap<String, u64>,
    changes_by_date: BTreeMap<StampKey, DateChange>,
    lines_added_by_month: BTreeMap<String, u64>,
    lines_removed_by_month: BTreeMap<String, u64>,
    lines_added_by_year: BTreeMap<i32, u64>,
    lines_removed_by_year: BTreeMap<i32, u64>,
    changes_by_date_by_author: BTreeMap<StampKey, BTreeMap<String, AuthorChange>>,

    files_by_stamp: BTreeMap<StampKey, FileCount>,
    lines_by_date_by_author: BTreeMap<StampKey, BTreeMap<String, AuthorLines>>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // Updates

    /// Names reported by `git shortlog -s`
    pub fn add_authors<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.total_authors.extend(names.into_iter().map(Into::into));
    }

    pub fn record_tags(&mut self, repository: &str, tags: TagMap) {
        self.tags.insert(repository.to_string(), tags);
    }

    /// Fold one commit of the commit graph into the activity maps
    pub fn record_commit_meta(&mut self, meta: &CommitMeta) {
        let Some(date) = utc(meta.timestamp) else {
            warn!("Ignoring commit with out-of-range timestamp {}", meta.timestamp);
            return;
        };
        let stamp = meta.timestamp;
        let day = date.date_naive();

        self.total_commits += 1;
        self.first_commit_stamp = Some(self.first_commit_stamp.map_or(stamp, |s| s.min(stamp)));
        self.last_commit_stamp = Some(self.last_commit_stamp.map_or(stamp, |s| s.max(stamp)));
        *self.domains.entry(meta.email_domain.clone()).or_insert(0) += 1;
        self.activity.record(&date);

        self.pending_authors
            .entry(meta.author.clone())
            .or_default()
            .observe_commit(stamp, day);

        let month = date.format("%Y-%m").to_string();
        *self
            .author_of_month
            .entry(month.clone())
            .or_default()
            .entry(meta.author.clone())
            .or_insert(0) += 1;
        *self.commits_by_month.entry(month).or_insert(0) += 1;

        let year = date.year();
        *self
            .author_of_year
            .entry(year)
            .or_default()
            .entry(meta.author.clone())
            .or_insert(0) += 1;
        *self.commits_by_year.entry(year).or_insert(0) += 1;

        self.first_active_day = Some(self.first_active_day.map_or(day, |d| d.min(day)));
        self.active_days.insert(day);
        *self.commits_by_timezone.entry(meta.timezone.clone()).or_insert(0) += 1;
    }

    /// A blob of the end revision
    pub fn record_file(&mut self, size: u64) {
        self.total_size += size;
        self.total_files += 1;
    }

    pub fn record_extension(&mut self, ext: impl Into<String>, lines: u64) {
        self.extensions.add(ext, lines);
    }

    /// A commit of the timeline pass
    pub fn record_change(&mut self, repository: &str, header: &CommitHeader, change: ChangeRecord) {
        let lines = self.total_lines.entry(repository.to_string()).or_insert(0);
        *lines += change.inserted as i64 - change.deleted as i64;
        let lines = *lines;
        *self.total_lines_added.entry(repository.to_string()).or_insert(0) += change.inserted;
        *self.total_lines_removed.entry(repository.to_string()).or_insert(0) += change.deleted;

        self.changes_by_date.insert(
            StampKey::new(header.stamp, repository),
            DateChange {
                files: change.files,
                inserted: change.inserted,
                deleted: change.deleted,
                lines,
            },
        );

        if let Some(date) = utc(header.stamp) {
            let month = date.format("%Y-%m").to_string();
            *self.lines_added_by_month.entry(month.clone()).or_insert(0) += change.inserted;
            *self.lines_removed_by_month.entry(month).or_insert(0) += change.deleted;
            *self.lines_added_by_year.entry(date.year()).or_insert(0) += change.inserted;
            *self.lines_removed_by_year.entry(date.year()).or_insert(0) += change.deleted;
        }
    }

    /// A non-merge commit of the per-author pass
    pub fn record_author_change(&mut self, repository: &str, header: &CommitHeader, change: ChangeRecord) {
        let author = self.pending_authors.entry(header.author.clone()).or_default();
        author.add_changes(change.inserted, change.deleted);
        let commits = author.commits;
        self.changes_by_date_by_author
            .entry(StampKey::new(header.stamp, repository))
            .or_default()
            .insert(
                header.author.clone(),
                AuthorChange {
                    lines_added: change.inserted,
                    lines_removed: change.deleted,
                    commits,
                    merge_commit: false,
                },
            );
    }

    /// A commit of the per-author pass without a diffstat
    pub fn record_merge_commit(&mut self, repository: &str, header: &CommitHeader) {
        let author = self.pending_authors.entry(header.author.clone()).or_default();
        author.add_merge_commit();
        let commits = author.commits;
        self.changes_by_date_by_author
            .entry(StampKey::new(header.stamp, repository))
            .or_default()
            .insert(
                header.author.clone(),
                AuthorChange {
                    lines_added: 0,
                    lines_removed: 0,
                    commits,
                    merge_commit: true,
                },
            );
    }

    /// File counts per revision, oldest first
    pub fn record_file_trees(&mut self, repository: &str, counts: &[(i64, u64)]) {
        let mut previous = 0i64;
        for &(stamp, files) in counts {
            let files_now = files as i64;
            self.files_by_stamp.insert(
                StampKey::new(stamp, repository),
                FileCount {
                    files,
                    delta_files: files_now - previous,
                },
            );
            previous = files_now;
        }
    }

    /// Blame ownership per revision, oldest first
    ///
    /// Authors who owned lines at the previous revision and none now are
    /// recorded with zero lines and the negated previous count.
    pub fn record_lines_by_author(&mut self, repository: &str, revisions: &[(i64, AuthorLineCounts)]) {
        let empty = AuthorLineCounts::new();
        let mut previous = &empty;
        for (stamp, current) in revisions {
            let entry = self
                .lines_by_date_by_author
                .entry(StampKey::new(*stamp, repository))
                .or_default();
            entry.clear();

            for (author, &before) in previous {
                if !current.contains_key(author) {
                    entry.insert(
                        author.clone(),
                        AuthorLines {
                            lines: 0,
                            delta_lines: -(before as i64),
                        },
                    );
                }
            }
            for (author, &lines) in current {
                let before = previous.get(author).copied().unwrap_or(0);
                entry.insert(
                    author.clone(),
                    AuthorLines {
                        lines,
                        delta_lines: lines as i64 - before as i64,
                    },
                );
            }
            previous = current;
        }
    }

    /// Merge the current repository's authors into the totals
    pub fn finish_repository(&mut self) {
        let pending = std::mem::take(&mut self.pending_authors);
        merge_author_maps(&mut self.authors, &pending);
    }

    // Accessors

    pub fn total_authors(&self) -> &BTreeSet<String> {
        &self.total_authors
    }

    pub fn authors(&self) -> &AuthorMap {
        &self.authors
    }

    pub fn author(&self, name: &str) -> Option<&AuthorStats> {
        self.authors.get(name)
    }

    /// Author names by descending commit count, ties by name
    pub fn authors_sorted(&self, limit: Option<usize>) -> Vec<&str> {
        let mut sorted: Vec<(&String, &AuthorStats)> = self.authors.iter().collect();
        sorted.sort_by(|a, b| b.1.commits.cmp(&a.1.commits).then_with(|| a.0.cmp(b.0)));
        sorted
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// E-mail domains by descending commit count, ties by name
    pub fn domains_sorted(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<(&str, u64)> = self.domains.iter().map(|(d, c)| (d.as_str(), *c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    pub fn tags(&self) -> &BTreeMap<String, TagMap> {
        &self.tags
    }

    pub fn total_commits(&self) -> u64 {
        self.total_commits
    }

    pub fn first_commit_date(&self) -> Option<DateTime<Utc>> {
        self.first_commit_stamp.and_then(utc)
    }

    pub fn last_commit_date(&self) -> Option<DateTime<Utc>> {
        self.last_commit_stamp.and_then(utc)
    }

    /// Calendar days spanned by the history, both ends included
    pub fn commit_delta_days(&self) -> i64 {
        match (self.first_commit_stamp, self.last_commit_stamp) {
            (Some(first), Some(last)) => {
                last.div_euclid(SECONDS_PER_DAY) - first.div_euclid(SECONDS_PER_DAY) + 1
            }
            _ => 0,
        }
    }

    pub fn activity(&self) -> &ActivityStats {
        &self.activity
    }

    pub fn commits_by_month(&self) -> &BTreeMap<String, u64> {
        &self.commits_by_month
    }

    pub fn commits_by_year(&self) -> &BTreeMap<i32, u64> {
        &self.commits_by_year
    }

    pub fn author_of_month(&self) -> &BTreeMap<String, BTreeMap<String, u64>> {
        &self.author_of_month
    }

    pub fn author_of_year(&self) -> &BTreeMap<i32, BTreeMap<String, u64>> {
        &self.author_of_year
    }

    pub fn first_active_day(&self) -> Option<NaiveDate> {
        self.first_active_day
    }

    pub fn active_days(&self) -> &BTreeSet<NaiveDate> {
        &self.active_days
    }

    pub fn commits_by_timezone(&self) -> &BTreeMap<String, u64> {
        &self.commits_by_timezone
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_files(&self) -> u64 {
        self.total_files
    }

    pub fn extensions(&self) -> &ExtensionMap {
        &self.extensions
    }

    /// Sum of every repository's running line total
    pub fn total_lines_of_code(&self) -> i64 {
        self.total_lines.values().sum()
    }

    pub fn total_lines_added(&self) -> u64 {
        self.total_lines_added.values().sum()
    }

    pub fn total_lines_removed(&self) -> u64 {
        self.total_lines_removed.values().sum()
    }

    pub fn changes_by_date(&self) -> &BTreeMap<StampKey, DateChange> {
        &self.changes_by_date
    }

    pub fn changes_by_date_by_author(&self) -> &BTreeMap<StampKey, BTreeMap<String, AuthorChange>> {
        &self.changes_by_date_by_author
    }

    pub fn lines_added_by_month(&self) -> &BTreeMap<String, u64> {
        &self.lines_added_by_month
    }

    pub fn lines_removed_by_month(&self) -> &BTreeMap<String, u64> {
        &self.lines_removed_by_month
    }

    pub fn lines_added_by_year(&self) -> &BTreeMap<i32, u64> {
        &self.lines_added_by_year
    }

    pub fn lines_removed_by_year(&self) -> &BTreeMap<i32, u64> {
        &self.lines_removed_by_year
    }

    pub fn files_by_stamp(&self) -> &BTreeMap<StampKey, FileCount> {
        &self.files_by_stamp
    }

    pub fn lines_by_date_by_author(&self) -> &BTreeMap<StampKey, BTreeMap<String, AuthorLines>> {
        &self.lines_by_date_by_author
    }
}
