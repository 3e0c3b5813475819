//! History Collection
//!
//! Runs the extraction passes over each repository in turn and folds their
//! output into one [`StatisticsAggregator`]:
//!
//! 1. authors (`git shortlog -s`)
//! 2. tags and the commits credited to each
//! 3. commit graph (activity, domains, timezones, author extremes)
//! 4. files of the end revision (sizes, extension histogram)
//! 5. line-count timeline (shortstat, first parent by default)
//! 6. per-author changes (shortstat, every parent)
//! 7. revision list (files per revision, optional blame ownership)
//!
//! Time spent in external commands is accumulated in an [`ExecTime`].
//! Cancelling the extractor's token stops collection before the next pass.

pub mod config;
pub mod error;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::command::{CommandError, CommandOutput, CommandRunner, CommandSpec, ExecTime, Timed};
use crate::extract::tasks::{self, AuthorLineCounts};
use crate::extract::{or_default, ParallelExtractor};
use crate::git::RepositoryTarget;
use crate::shortstat::{replay_reversed, ShortstatEvent};
use crate::stats::tags::{self as tag_stats, TagInfo, TagMap};
use crate::stats::{classify_extension, CommitMeta, StatisticsAggregator};

pub use config::{CollectorConfig, ConfigError};
pub use error::{CollectError, CollectResult};

const SHORTSTAT_FORMAT: &str = "--pretty=format:%at %aN";
const COMMIT_GRAPH_FORMAT: &str = "--pretty=format:%at %ai %aN <%aE>";
const REVLIST_FORMAT: &str = "--pretty=format:%at %T %H";

/// The model handed to reporting consumers
#[derive(Debug, Serialize)]
pub struct CollectedStatistics {
    pub project_name: String,
    pub repositories: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub config: CollectorConfig,
    pub exec_time: ExecTime,
    pub statistics: StatisticsAggregator,
}

/// One revision of the revision list
#[derive(Debug, Clone, PartialEq, Eq)]
struct Revision {
    stamp: i64,
    tree: String,
    commit: String,
}

impl Revision {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let stamp = parts.next()?.parse().ok()?;
        Some(Self {
            stamp,
            tree: parts.next()?.to_string(),
            commit: parts.next()?.to_string(),
        })
    }
}

/// `rev-list --pretty` output without its `commit <hash>` lines
fn strip_commit_lines(output: &CommandOutput) -> impl Iterator<Item = &str> {
    output
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with("commit"))
}

/// Runs the extraction passes and owns the aggregate
pub struct Collector {
    config: CollectorConfig,
    extractor: ParallelExtractor,
    stats: StatisticsAggregator,
    exec: ExecTime,
    repositories: Vec<String>,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> CollectResult<Self> {
        config.validate()?;
        let extractor = ParallelExtractor::new(config.processes);
        Ok(Self {
            config,
            extractor,
            stats: StatisticsAggregator::new(),
            exec: ExecTime::default(),
            repositories: Vec::new(),
        })
    }

    /// Share `token` with the extractor; cancelling it stops the run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.extractor = self.extractor.with_cancellation_token(token);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn extractor(&self) -> &ParallelExtractor {
        &self.extractor
    }

    pub fn statistics(&self) -> &StatisticsAggregator {
        &self.stats
    }

    pub fn exec_time(&self) -> ExecTime {
        self.exec
    }

    fn runner(&self, target: &RepositoryTarget) -> CommandRunner {
        CommandRunner::new(target.root.clone()).with_timeout(self.config.timeout())
    }

    async fn run(&mut self, runner: &CommandRunner, spec: CommandSpec) -> CommandOutput {
        let cancel = self.extractor.cancellation_token();
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => CommandOutput::default(),
            output = runner.run_or_empty(std::slice::from_ref(&spec)) => output,
        };
        self.exec.record(output.elapsed);
        output
    }

    fn ensure_running(&self) -> CollectResult<()> {
        if self.extractor.is_cancelled() {
            return Err(CollectError::Interrupted);
        }
        Ok(())
    }

    fn absorb<T>(&mut self, timed: Timed<T>) -> T {
        self.exec.absorb(timed.exec);
        timed.value
    }

    /// Collect every repository in order
    pub async fn collect_all(&mut self, targets: &[RepositoryTarget]) -> CollectResult<()> {
        for target in targets {
            self.collect_repository(target).await?;
        }
        Ok(())
    }

    /// Run every pass over one repository and merge its authors into the totals
    ///
    /// Returns [`CollectError::Interrupted`] once cancelled; the repository's
    /// partial data is then left out of the author totals.
    pub async fn collect_repository(&mut self, target: &RepositoryTarget) -> CollectResult<()> {
        info!("Collecting data from {} ({})", target.name, target.root.display());
        let runner = self.runner(target);

        self.ensure_running()?;
        self.collect_authors(&runner, target).await;
        self.ensure_running()?;
        self.collect_tags(&runner, target).await;
        self.ensure_running()?;
        self.collect_commit_graph(&runner, target).await;
        self.ensure_running()?;
        self.collect_files(&runner, target).await;
        self.ensure_running()?;
        self.collect_timeline(&runner, target).await;
        self.ensure_running()?;
        self.collect_changes_by_author(&runner, target).await;
        self.ensure_running()?;
        self.collect_revisions(&runner, target).await;
        self.ensure_running()?;

        self.stats.finish_repository();
        self.repositories.push(target.name.clone());
        Ok(())
    }

    async fn collect_authors(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let spec = CommandSpec::git(["shortlog", "-s"])
            .args(self.config.log_range(false))
            .args(target.path_filter());
        let output = self.run(runner, spec).await;
        let names: Vec<String> = tag_stats::parse_shortlog(output.text())
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        debug!("{} authors in {}", names.len(), target.name);
        self.stats.add_authors(names);
    }

    async fn collect_tags(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let started = std::time::Instant::now();
        let output = match runner.run(&CommandSpec::git(["show-ref", "--tags"])).await {
            Ok(output) => output,
            // show-ref exits non-zero when there is nothing to show
            Err(CommandError::Failed { .. }) => {
                debug!("No tags in {}", target.name);
                CommandOutput::default()
            }
            Err(e) => {
                warn!("No data from external command: {}", e);
                CommandOutput::default()
            }
        };
        self.exec.record(started.elapsed());

        let refs = tag_stats::parse_show_ref(output.text());
        let tag_runner = runner.clone();
        let infos = self
            .extractor
            .map_ordered(refs.clone(), move |(hash, _name): (String, String)| {
                let runner = tag_runner.clone();
                async move {
                    let spec = CommandSpec::git(["log", hash.as_str(), SHORTSTAT_FORMAT, "-n", "1"]);
                    let output = runner.run_or_empty(&[spec]).await;
                    Timed::new(
                        TagInfo::from_log(hash, output.text()),
                        ExecTime::single(output.elapsed),
                    )
                }
            })
            .await;

        let mut tags = TagMap::new();
        for ((_, name), info) in refs.into_iter().zip(or_default(infos)) {
            if let Some(info) = self.absorb(info) {
                tags.insert(name, info);
            }
        }

        let filter = target.path_filter();
        let exec = tag_stats::partition_tags(&mut tags, |tag, previous| {
            let mut spec = CommandSpec::git(["shortlog", "-s"]).arg(tag);
            if let Some(previous) = previous {
                spec = spec.arg(format!("^{}", previous));
            }
            let spec = spec.args(filter.clone());
            let runner = runner.clone();
            async move { runner.run_or_empty(&[spec]).await }
        })
        .await;
        self.exec.absorb(exec);

        debug!("{} tags in {}", tags.len(), target.name);
        self.stats.record_tags(&target.name, tags);
    }

    async fn collect_commit_graph(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let spec = CommandSpec::git(["rev-list", COMMIT_GRAPH_FORMAT])
            .args(self.config.log_range(false))
            .args(target.path_filter());
        let output = self.run(runner, spec).await;

        let mut commits = 0usize;
        for line in strip_commit_lines(&output) {
            match CommitMeta::parse(line) {
                Some(meta) => {
                    self.stats.record_commit_meta(&meta);
                    commits += 1;
                }
                None => warn!("Skipping malformed commit line: '{}'", line),
            }
        }
        debug!("{} commits in {}", commits, target.name);
    }

    async fn collect_files(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let end = self.config.commit_range(true);
        let listing = tasks::tree_entries_at(runner, &end, target.prefix()).await;
        let entries = self.absorb(listing);

        let mut blobs = Vec::with_capacity(entries.len());
        for entry in entries {
            self.stats.record_file(entry.size.unwrap_or(0));
            let ext = classify_extension(&entry.path, self.config.max_ext_length);
            blobs.push((ext, entry.oid));
        }

        let blob_runner = runner.clone();
        let counts = self
            .extractor
            .map_ordered(blobs.clone(), move |(_ext, oid): (String, String)| {
                let runner = blob_runner.clone();
                async move { tasks::count_blob_lines(&runner, &oid).await }
            })
            .await;

        for ((ext, _), lines) in blobs.into_iter().zip(or_default(counts)) {
            let lines = self.absorb(lines);
            self.stats.record_extension(ext, lines);
        }
    }

    async fn collect_timeline(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let mut spec = CommandSpec::git(["log", "--shortstat"]);
        if self.config.linear_linestats {
            spec = spec.args(["--first-parent", "-m"]);
        }
        let spec = spec
            .arg(SHORTSTAT_FORMAT)
            .args(self.config.log_range(false))
            .args(target.path_filter());
        let output = self.run(runner, spec).await;

        let log = replay_reversed(&output.stdout);
        if log.errors > 0 {
            warn!("{} unparseable lines in the timeline of {}", log.errors, target.name);
        }
        for event in log.events {
            if let ShortstatEvent::Commit { header, change } = event {
                self.stats.record_change(&target.name, &header, change);
            }
        }
    }

    async fn collect_changes_by_author(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let spec = CommandSpec::git(["log", "--shortstat", "--date-order", SHORTSTAT_FORMAT])
            .args(self.config.log_range(false))
            .args(target.path_filter());
        let output = self.run(runner, spec).await;

        let log = replay_reversed(&output.stdout);
        if log.errors > 0 {
            warn!("{} unparseable lines in the author log of {}", log.errors, target.name);
        }
        for event in log.events {
            match event {
                ShortstatEvent::Commit { header, change } => {
                    self.stats.record_author_change(&target.name, &header, change)
                }
                ShortstatEvent::EmptyCommit { header } => {
                    self.stats.record_merge_commit(&target.name, &header)
                }
            }
        }
    }

    async fn collect_revisions(&mut self, runner: &CommandRunner, target: &RepositoryTarget) {
        let spec = CommandSpec::git(["rev-list", REVLIST_FORMAT])
            .args(self.config.log_range(false))
            .args(target.path_filter());
        let output = self.run(runner, spec).await;

        let mut revisions: Vec<Revision> = strip_commit_lines(&output)
            .filter_map(|line| {
                let revision = Revision::parse(line);
                if revision.is_none() {
                    warn!("Skipping malformed revision line: '{}'", line);
                }
                revision
            })
            .collect();
        revisions.reverse();

        let tree_runner = runner.clone();
        let prefix = target.prefix.clone();
        let trees = self
            .extractor
            .map_ordered(
                revisions.iter().map(|r| r.tree.clone()).collect::<Vec<_>>(),
                move |tree: String| {
                    let runner = tree_runner.clone();
                    let prefix = prefix.clone();
                    async move { tasks::file_tree_at(&runner, &tree, prefix.as_deref()).await }
                },
            )
            .await;
        let trees: Vec<Vec<String>> = or_default(trees)
            .into_iter()
            .map(|timed| self.absorb(timed))
            .collect();

        let counts: Vec<(i64, u64)> = revisions
            .iter()
            .zip(&trees)
            .map(|(revision, tree)| (revision.stamp, tree.len() as u64))
            .collect();
        self.stats.record_file_trees(&target.name, &counts);
        debug!("{} revisions in {}", revisions.len(), target.name);

        if !self.config.lines_by_date {
            return;
        }

        let mut ownership = Vec::with_capacity(revisions.len());
        for (revision, tree) in revisions.iter().zip(trees) {
            let blame_runner = runner.clone();
            let commit = revision.commit.clone();
            let (counts, exec) = self
                .extractor
                .map_reduce(
                    tree,
                    move |path: String| {
                        let runner = blame_runner.clone();
                        let commit = commit.clone();
                        async move { tasks::blame_authors(&runner, &commit, &path).await }
                    },
                    (AuthorLineCounts::new(), ExecTime::default()),
                    |(mut counts, mut exec): (AuthorLineCounts, ExecTime),
                     timed: Timed<AuthorLineCounts>| {
                        for (author, lines) in timed.value {
                            *counts.entry(author).or_insert(0) += lines;
                        }
                        exec.absorb(timed.exec);
                        (counts, exec)
                    },
                )
                .await;
            self.exec.absorb(exec);
            ownership.push((revision.stamp, counts));
        }
        self.stats.record_lines_by_author(&target.name, &ownership);
    }

    /// Hand the model over, defaulting the project name to the repositories
    pub fn finish(self) -> CollectedStatistics {
        let project_name = if self.config.project_name.is_empty() {
            self.repositories.join(", ")
        } else {
            self.config.project_name.clone()
        };
        CollectedStatistics {
            project_name,
            repositories: self.repositories,
            generated_at: Utc::now(),
            config: self.config,
            exec_time: self.exec,
            statistics: self.stats,
        }
    }
}
