//! Collector configuration
//!
//! Settings come from the `[collect]` section of the configuration file and
//! from `-c key=value` overrides on the command line, applied in that order.
//! Keys are validated strictly; an unknown key or a malformed value is fatal
//! before any extraction starts.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No such key \"{0}\" in config")]
    UnknownKey(String),

    #[error("Invalid value for {key}: '{value}' ({expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Malformed override '{0}', expected key=value")]
    MalformedOverride(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of the extraction passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorConfig {
    /// Domains kept by reporting consumers
    pub max_domains: usize,
    /// Longest extension kept in the extension histogram
    pub max_ext_length: usize,
    /// Authors kept by reporting consumers
    pub max_authors: usize,
    /// Lower bound of the history range, empty for the whole history
    pub commit_begin: String,
    /// Upper bound of the history range
    pub commit_end: String,
    /// Follow only first parents in the line-count timeline
    pub linear_linestats: bool,
    /// Defaults to the repository names joined with ", "
    pub project_name: String,
    /// Concurrent extraction tasks
    pub processes: usize,
    /// Passed to git as `--since`
    pub start_date: String,
    /// Collect blame-based line ownership per revision
    pub lines_by_date: bool,
    /// Per-command deadline in seconds, 0 for none
    pub task_timeout: u64,
    /// Stylesheet name for HTML report consumers
    pub style: String,
    /// Authors listed in full by reporting consumers
    pub authors_top: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_domains: 10,
            max_ext_length: 10,
            max_authors: 20,
            commit_begin: String::new(),
            commit_end: "HEAD".to_string(),
            linear_linestats: true,
            project_name: String::new(),
            processes: num_cpus::get(),
            start_date: String::new(),
            lines_by_date: false,
            task_timeout: 0,
            style: "gitstats.css".to_string(),
            authors_top: 5,
        }
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "non-negative integer",
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "boolean (1/0, true/false)",
        }),
    }
}

impl CollectorConfig {
    /// Every recognised key
    pub const KEYS: &'static [&'static str] = &[
        "max_domains",
        "max_ext_length",
        "max_authors",
        "commit_begin",
        "commit_end",
        "linear_linestats",
        "project_name",
        "processes",
        "start_date",
        "lines_by_date",
        "task_timeout",
        "style",
        "authors_top",
    ];

    /// Set one key from its textual value
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "max_domains" => self.max_domains = parse_count(key, value)?,
            "max_ext_length" => self.max_ext_length = parse_count(key, value)?,
            "max_authors" => self.max_authors = parse_count(key, value)?,
            "commit_begin" => self.commit_begin = value.to_string(),
            "commit_end" => self.commit_end = value.to_string(),
            "linear_linestats" => self.linear_linestats = parse_flag(key, value)?,
            "project_name" => self.project_name = value.to_string(),
            "processes" => self.processes = parse_count(key, value)?,
            "start_date" => self.start_date = value.to_string(),
            "lines_by_date" => self.lines_by_date = parse_flag(key, value)?,
            "task_timeout" => self.task_timeout = parse_count(key, value)? as u64,
            "style" => self.style = value.to_string(),
            "authors_top" => self.authors_top = parse_count(key, value)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply a `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedOverride(assignment.to_string()))?;
        self.apply(key.trim(), value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processes == 0 {
            return Err(ConfigError::Invalid("processes must be at least 1".to_string()));
        }
        if self.commit_begin.contains(char::is_whitespace) || self.commit_end.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid("commit bounds must not contain whitespace".to_string()));
        }
        Ok(())
    }

    /// `commit_end`, or `commit_begin..commit_end` when a full range is
    /// requested and a lower bound is set
    pub fn commit_range(&self, end_only: bool) -> String {
        let end = if self.commit_end.is_empty() { "HEAD" } else { &self.commit_end };
        if end_only || self.commit_begin.is_empty() {
            end.to_string()
        } else {
            format!("{}..{}", self.commit_begin, end)
        }
    }

    /// Revision arguments for history commands
    pub fn log_range(&self, end_only: bool) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        if !self.start_date.is_empty() {
            args.push(format!("--since={}", self.start_date));
        }
        args.push(self.commit_range(end_only));
        args
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.task_timeout > 0).then(|| Duration::from_secs(self.task_timeout))
    }
}
