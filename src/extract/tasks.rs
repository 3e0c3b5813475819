//! Per-item extraction tasks
//!
//! Each task runs one git command through a [`CommandRunner`] and returns
//! the parsed value together with the time spent in the command. Command
//! failures degrade to an empty value.

use std::collections::BTreeMap;

use crate::command::{CommandRunner, CommandSpec, ExecTime, Timed};

/// Git file mode of a submodule (gitlink) entry
pub const SUBMODULE_MODE: &str = "160000";

/// Tracked blob paths at one revision
pub type FileTree = Vec<String>;

/// Lines owned per author
pub type AuthorLineCounts = BTreeMap<String, u64>;

/// One entry of `git ls-tree -r -z [-l]` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub oid: String,
    /// Present with `-l` for blobs
    pub size: Option<u64>,
    pub path: String,
}

impl TreeEntry {
    /// Parse `<mode> <type> <oid>[ <size>]\t<path>`
    pub fn parse(line: &str) -> Option<Self> {
        let (meta, path) = line.split_once('\t')?;
        let mut fields = meta.split_whitespace();
        let mode = fields.next()?.to_string();
        let kind = fields.next()?.to_string();
        let oid = fields.next()?.to_string();
        let size = fields.next().and_then(|s| s.parse().ok());
        Some(Self {
            mode,
            kind,
            oid,
            size,
            path: path.to_string(),
        })
    }

    pub fn is_submodule(&self) -> bool {
        self.mode == SUBMODULE_MODE
    }
}

/// Parse every NUL-terminated entry of a tree listing, submodules excluded
///
/// Paths are taken verbatim; `-z` disables git's quoting of unusual names.
pub fn parse_tree_entries(output: &str) -> Vec<TreeEntry> {
    output
        .split('\0')
        .filter(|record| !record.is_empty())
        .filter_map(TreeEntry::parse)
        .filter(|entry| !entry.is_submodule())
        .collect()
}

/// Paths of a tree listing, submodules excluded
pub fn parse_file_tree(output: &str) -> FileTree {
    parse_tree_entries(output)
        .into_iter()
        .map(|entry| entry.path)
        .collect()
}

/// Count `author ` lines of `git blame --line-porcelain` output
pub fn parse_blame_authors(output: &str) -> AuthorLineCounts {
    let mut counts = AuthorLineCounts::new();
    for author in output.lines().filter_map(|line| line.strip_prefix("author ")) {
        *counts.entry(author.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Number of newline characters
pub fn count_lines(content: &str) -> u64 {
    content.bytes().filter(|&b| b == b'\n').count() as u64
}

fn with_prefix(mut spec: CommandSpec, prefix: Option<&str>) -> CommandSpec {
    if let Some(prefix) = prefix {
        spec = spec.arg("--").arg(prefix);
    }
    spec
}

/// Lines in a blob
pub async fn count_blob_lines(runner: &CommandRunner, blob: &str) -> Timed<u64> {
    let output = runner
        .run_or_empty(&[CommandSpec::git(["cat-file", "blob", blob])])
        .await;
    Timed::new(count_lines(&output.stdout), ExecTime::single(output.elapsed))
}

/// Files tracked in `tree`, optionally restricted to a subdirectory
pub async fn file_tree_at(runner: &CommandRunner, tree: &str, prefix: Option<&str>) -> Timed<FileTree> {
    let spec = with_prefix(CommandSpec::git(["ls-tree", "-r", "-z", tree]), prefix);
    let output = runner.run_or_empty(&[spec]).await;
    Timed::new(parse_file_tree(&output.stdout), ExecTime::single(output.elapsed))
}

/// Full listing with blob sizes at `revision`
pub async fn tree_entries_at(
    runner: &CommandRunner,
    revision: &str,
    prefix: Option<&str>,
) -> Timed<Vec<TreeEntry>> {
    let spec = with_prefix(CommandSpec::git(["ls-tree", "-r", "-l", "-z", revision]), prefix);
    let output = runner.run_or_empty(&[spec]).await;
    Timed::new(parse_tree_entries(&output.stdout), ExecTime::single(output.elapsed))
}

/// Lines of `path` at `commit`, per author of the last change to each line
pub async fn blame_authors(runner: &CommandRunner, commit: &str, path: &str) -> Timed<AuthorLineCounts> {
    let spec = CommandSpec::git(["blame", "--line-porcelain", commit, "--", path]);
    let output = runner.run_or_empty(&[spec]).await;
    Timed::new(parse_blame_authors(output.text()), ExecTime::single(output.elapsed))
}
