use clap::{ArgAction, Parser};
use anyhow::Result;
use std::path::{Path, PathBuf};
use log::debug;

/// Git history statistics collector
#[derive(Parser, Debug, Clone)]
#[command(name = "repostats")]
#[command(about = "Mines one or more git repositories into commit, line, author, tag and extension statistics")]
#[command(version)]
pub struct Args {
    /// Repository paths followed by the output directory
    #[arg(value_name = "PATH", required = true, num_args = 2..)]
    pub paths: Vec<PathBuf>,

    /// Override a collector setting, e.g. -c max_ext_length=4 (repeatable)
    #[arg(short = 'c', long = "set", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub overrides: Vec<String>,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,
}

impl Args {
    /// Repository paths, every positional except the last
    pub fn repository_paths(&self) -> &[PathBuf] {
        match self.paths.split_last() {
            Some((_, repositories)) => repositories,
            None => &[],
        }
    }

    /// Output directory, the last positional
    pub fn output_path(&self) -> Option<&Path> {
        self.paths.last().map(PathBuf::as_path)
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Parse from an explicit argument list
pub fn parse_args_from<I, T>(iter: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(iter).map_err(|e| anyhow::anyhow!("{}", e))
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    if args.paths.len() < 2 {
        return Err(anyhow::anyhow!(
            "Expected at least one repository path followed by an output path"
        ));
    }

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {}
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if let Some(bad) = args.overrides.iter().find(|o| !o.contains('=')) {
        return Err(anyhow::anyhow!(
            "Invalid override '{}', expected key=value", bad
        ));
    }

    Ok(())
}
