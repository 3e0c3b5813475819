//! Shortstat Stream Parser
//!
//! Turns the interleaved output of
//! `git log --shortstat --pretty=format:"%at %aN"` into per-commit change
//! records. The log is replayed oldest first (reversed), so a commit's
//! diffstat line arrives before its header line:
//!
//! ```text
//!  2 files changed, 5 insertions(+), 1 deletion(-)    Initial -> ChangesByCommit
//! 1700000100 Alice                                    ChangesByCommit -> CommitInfo
//!                                                     CommitInfo -> Initial
//! ```
//!
//! [`transition`] is the pure state function; [`ShortstatReplay`] carries the
//! state and pending counts between lines and emits [`ShortstatEvent`]s.

use std::fmt;
use std::sync::OnceLock;

use chrono::DateTime;
use log::warn;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Position of the parser within the diffstat stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Initial,
    CommitInfo,
    ChangesByCommit,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserState::Initial => "Initial",
            ParserState::CommitInfo => "CommitInfo",
            ParserState::ChangesByCommit => "ChangesByCommit",
        };
        f.write_str(name)
    }
}

/// Counts from one diffstat line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub files: u64,
    pub inserted: u64,
    pub deleted: u64,
}

impl ChangeRecord {
    pub fn new(files: u64, inserted: u64, deleted: u64) -> Self {
        Self {
            files,
            inserted,
            deleted,
        }
    }
}

/// A line the current state has no transition for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected line in state {state}: '{line}'")]
pub struct ParseError {
    pub state: ParserState,
    pub line: String,
}

fn diffstat_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"files? changed").expect("static pattern"))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("static pattern"))
}

/// Whether `line` is a `N file(s) changed, ...` summary
pub fn is_diffstat(line: &str) -> bool {
    diffstat_pattern().is_match(line)
}

/// The unix timestamp that starts a commit header line, if any
///
/// The first token is the text before the first space, untrimmed, so the
/// indented diffstat line never qualifies.
pub fn header_stamp(line: &str) -> Option<i64> {
    if is_diffstat(line) {
        return None;
    }
    let token = line.split(' ').next()?;
    let stamp = token.parse::<i64>().ok()?;
    DateTime::from_timestamp(stamp, 0).map(|_| stamp)
}

/// Extract the counts from a diffstat line
///
/// One number is the file count. Two numbers are the file count plus
/// insertions or deletions, depending on which marker is present. Otherwise
/// the first three numbers are taken in order, a missing one reading zero.
pub fn parse_change_counts(line: &str) -> ChangeRecord {
    let numbers: Vec<u64> = number_pattern()
        .find_iter(line)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let nth = |i: usize| numbers.get(i).copied().unwrap_or(0);

    match numbers.len() {
        1 => ChangeRecord::new(nth(0), 0, 0),
        2 if line.contains("(+)") => ChangeRecord::new(nth(0), nth(1), 0),
        2 if line.contains("(-)") => ChangeRecord::new(nth(0), 0, nth(1)),
        _ => ChangeRecord::new(nth(0), nth(1), nth(2)),
    }
}

/// Apply one line to `state`
///
/// The change record is present only when the line enters `ChangesByCommit`.
pub fn transition(
    state: ParserState,
    line: &str,
) -> Result<(ParserState, Option<ChangeRecord>), ParseError> {
    let error = || ParseError {
        state,
        line: line.to_string(),
    };

    match state {
        ParserState::Initial => {
            if header_stamp(line).is_some() {
                Ok((ParserState::CommitInfo, None))
            } else if is_diffstat(line) {
                Ok((ParserState::ChangesByCommit, Some(parse_change_counts(line))))
            } else {
                Err(error())
            }
        }
        ParserState::CommitInfo => {
            if line.is_empty() {
                Ok((ParserState::Initial, None))
            } else if is_diffstat(line) {
                Ok((ParserState::ChangesByCommit, Some(parse_change_counts(line))))
            } else {
                Ok((ParserState::CommitInfo, None))
            }
        }
        ParserState::ChangesByCommit => {
            if line.is_empty() {
                Ok((ParserState::Initial, None))
            } else if header_stamp(line).is_some() {
                Ok((ParserState::CommitInfo, None))
            } else {
                Err(error())
            }
        }
    }
}

/// `<stamp> <author>` header of one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHeader {
    pub stamp: i64,
    pub author: String,
}

impl CommitHeader {
    pub fn parse(line: &str) -> Option<Self> {
        let stamp = header_stamp(line)?;
        let author = line.split_once(' ').map(|(_, rest)| rest).unwrap_or("");
        Some(Self {
            stamp,
            author: author.to_string(),
        })
    }
}

/// Commit boundaries seen during a replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortstatEvent {
    /// A header closing the diffstat that preceded it
    Commit {
        header: CommitHeader,
        change: ChangeRecord,
    },
    /// A header with no diffstat of its own, such as a merge
    EmptyCommit { header: CommitHeader },
}

impl ShortstatEvent {
    pub fn header(&self) -> &CommitHeader {
        match self {
            ShortstatEvent::Commit { header, .. } | ShortstatEvent::EmptyCommit { header } => header,
        }
    }
}

/// Drives [`transition`] over a stream of lines
#[derive(Debug, Default)]
pub struct ShortstatReplay {
    state: ParserState,
    pending: ChangeRecord,
    errors: usize,
}

impl ShortstatReplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn pending(&self) -> ChangeRecord {
        self.pending
    }

    /// Lines rejected so far
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Consume one line, returning the commit it completes, if any
    pub fn feed(&mut self, line: &str) -> Option<ShortstatEvent> {
        let previous = self.state;
        let (next, change) = match transition(previous, line) {
            Ok(step) => step,
            Err(e) => {
                warn!("{}", e);
                self.errors += 1;
                self.pending = ChangeRecord::default();
                self.state = ParserState::Initial;
                return None;
            }
        };

        if let Some(change) = change {
            self.pending = change;
        }
        self.state = next;

        if next != ParserState::CommitInfo {
            return None;
        }
        let header = CommitHeader::parse(line)?;
        match previous {
            ParserState::ChangesByCommit => Some(ShortstatEvent::Commit {
                header,
                change: self.pending,
            }),
            ParserState::Initial | ParserState::CommitInfo => {
                Some(ShortstatEvent::EmptyCommit { header })
            }
        }
    }
}

/// Events and rejected lines from one replay
#[derive(Debug, Default)]
pub struct ReplayLog {
    pub events: Vec<ShortstatEvent>,
    pub errors: usize,
}

/// Replay newest-first log output oldest first
pub fn replay_reversed(output: &str) -> ReplayLog {
    let mut replay = ShortstatReplay::new();
    let events = output
        .trim_end_matches('\n')
        .lines()
        .rev()
        .filter_map(|line| replay.feed(line))
        .collect();
    ReplayLog {
        events,
        errors: replay.errors(),
    }
}
