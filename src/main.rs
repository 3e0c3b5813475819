use anyhow::{Context, Result};
use log::{error, Level};
use std::process;

use repostats::{app, cli, config, logging};

fn main() {
    let args = cli::parse_args();

    let (config_manager, console_shows_errors) = match setup(&args) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args, config_manager) {
        error!("{:#}", e);
        if !console_shows_errors {
            eprintln!("Error: {:#}", e);
        }
        process::exit(1);
    }
}

/// Validate arguments, load configuration and install the logger
fn setup(args: &cli::Args) -> Result<(config::ConfigManager, bool)> {
    cli::validate_args(args)?;

    let config_manager = app::load_configuration(args)?;

    let log_config = app::configure_logging(args, &config_manager)?;
    let console_shows_errors = log_config.console_shows(Level::Error);
    logging::init_logger(log_config)?;

    Ok((config_manager, console_shows_errors))
}

fn run(args: cli::Args, config_manager: config::ConfigManager) -> Result<()> {
    // Single runtime for the whole run
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(app::run_collection(args, config_manager))
}
