//! Tags and the commits attributed to each of them
//!
//! Tags are walked oldest first; each tag is credited with the commits
//! reachable from it and not from the previous credited tag, so the
//! partitions are disjoint and together cover the newest tag's history.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::command::{CommandOutput, ExecTime};

/// One tag of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub stamp: i64,
    pub hash: String,
    pub date: NaiveDate,
    pub commits: u64,
    pub authors: BTreeMap<String, u64>,
}

impl TagInfo {
    /// Build from the tag hash and its `%at %aN` log line
    pub fn from_log(hash: impl Into<String>, log_line: &str) -> Option<Self> {
        let stamp: i64 = log_line.split(' ').next()?.trim().parse().ok()?;
        let date = DateTime::from_timestamp(stamp, 0)?.date_naive();
        Some(Self {
            stamp,
            hash: hash.into(),
            date,
            commits: 0,
            authors: BTreeMap::new(),
        })
    }
}

/// Tags of one repository keyed by name
pub type TagMap = BTreeMap<String, TagInfo>;

/// `(hash, tag name)` pairs from `git show-ref --tags`
pub fn parse_show_ref(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(hash, reference)| {
            let name = reference.strip_prefix("refs/tags/").unwrap_or(reference);
            (hash.to_string(), name.to_string())
        })
        .collect()
}

/// `(author, commits)` pairs from `git shortlog -s`
pub fn parse_shortlog(output: &str) -> Vec<(String, u64)> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let split = line.find(char::is_whitespace)?;
            let commits = line[..split].parse().ok()?;
            Some((line[split..].trim_start().to_string(), commits))
        })
        .collect()
}

/// Tag names ordered oldest first, ties broken by name
pub fn chronological(tags: &TagMap) -> Vec<String> {
    let mut ordered: Vec<(i64, &String)> = tags.iter().map(|(name, info)| (info.stamp, name)).collect();
    ordered.sort();
    ordered.into_iter().map(|(_, name)| name.clone()).collect()
}

/// Credit each tag with the commits since the previous credited tag
///
/// `shortlog(tag, previous)` runs `git shortlog -s <tag> [^<previous>]`.
/// A tag whose range is empty is left untouched and does not become the
/// lower bound of the next one.
pub async fn partition_tags<F, Fut>(tags: &mut TagMap, mut shortlog: F) -> ExecTime
where
    F: FnMut(String, Option<String>) -> Fut,
    Fut: Future<Output = CommandOutput>,
{
    let mut exec = ExecTime::default();
    let mut previous: Option<String> = None;

    for name in chronological(tags) {
        let output = shortlog(name.clone(), previous.clone()).await;
        exec.record(output.elapsed);
        let entries = parse_shortlog(output.text());
        if entries.is_empty() {
            continue;
        }
        if let Some(tag) = tags.get_mut(&name) {
            for (author, commits) in entries {
                tag.commits += commits;
                *tag.authors.entry(author).or_insert(0) += commits;
            }
        }
        previous = Some(name);
    }
    exec
}
