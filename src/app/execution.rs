//! Application execution: resolve inputs, collect, write and summarize

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::collector::{CollectedStatistics, Collector};
use crate::git::RepositoryTarget;
use crate::{cli, config, output};

use super::initialization::build_collector_config;

/// Resolve every repository path, failing on the first that is not a repository
pub fn resolve_targets(paths: &[PathBuf]) -> Result<Vec<RepositoryTarget>> {
    paths
        .iter()
        .map(|path| {
            RepositoryTarget::resolve(path)
                .with_context(|| format!("Invalid repository path {}", path.display()))
        })
        .collect()
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub collected: CollectedStatistics,
    pub statistics_file: PathBuf,
}

/// Validate inputs, run the collector and write the model
///
/// Configuration, output directory and repository paths are all checked
/// before the first git command runs.
pub async fn collect(args: &cli::Args, config: &config::ConfigManager) -> Result<RunOutcome> {
    collect_with_cancellation(args, config, CancellationToken::new()).await
}

/// [`collect`], stopping early once `cancel` fires
///
/// An interrupted run writes no statistics file.
pub async fn collect_with_cancellation(
    args: &cli::Args,
    config: &config::ConfigManager,
    cancel: CancellationToken,
) -> Result<RunOutcome> {
    let collector_config = build_collector_config(args, config)?;

    let output_path = args
        .output_path()
        .ok_or_else(|| anyhow::anyhow!("Missing output path"))?;
    let output_dir = output::prepare_output_dir(output_path)?;
    let targets = resolve_targets(args.repository_paths())?;

    let mut collector = Collector::new(collector_config)?.with_cancellation(cancel);
    collector.collect_all(&targets).await?;
    let collected = collector.finish();

    let statistics_file = output::write_statistics(&output_dir, &collected)?;
    Ok(RunOutcome {
        collected,
        statistics_file,
    })
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, stopping outstanding git commands");
        cancel.cancel();
    }
}

/// Full run with console summary and timing line
pub async fn run_collection(args: cli::Args, config: config::ConfigManager) -> Result<()> {
    let started = Instant::now();

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let outcome = collect_with_cancellation(&args, &config, cancel).await;
    watcher.abort();
    let outcome = outcome?;
    info!(
        "Collected {} commits from {} repositories",
        outcome.collected.statistics.total_commits(),
        outcome.collected.repositories.len()
    );

    print!("{}", output::render_summary(&outcome.collected));
    println!();
    println!(
        "{}",
        output::execution_time_line(started.elapsed(), outcome.collected.exec_time)
    );
    println!("Statistics written to {}", outcome.statistics_file.display());
    Ok(())
}
