//! Application initialization and configuration

use anyhow::{Context, Result};
use log::debug;
use crate::collector::CollectorConfig;
use crate::{cli, config, logging};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    use log::LevelFilter;
    use std::str::FromStr;

    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        match config.get_log_level("base", "console-level") {
            Ok(Some(level)) => level,
            Ok(None) => LevelFilter::Info,
            Err(e) => {
                eprintln!("Ignoring console-level from configuration: {}", e);
                LevelFilter::Info
            }
        }
    };

    let format = if !args.log_format.is_empty() && args.log_format != "text" {
        logging::LogFormat::from_str(&args.log_format)
            .map_err(|e| anyhow::anyhow!(e))?
    } else {
        config
            .get_value("base", "log-format")
            .and_then(|format_str| logging::LogFormat::from_str(format_str).ok())
            .unwrap_or(logging::LogFormat::Text)
    };

    let log_file_path = args.log_file.clone()
        .or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => match config.get_log_level("base", "file-log-level") {
            Ok(level) => level,
            Err(e) => {
                eprintln!("Ignoring file-log-level from configuration: {}", e);
                None
            }
        },
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), level) => (
            logging::LogDestination::Both(file_path),
            Some(level.unwrap_or(console_level)),
        ),
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => {
            return Err(anyhow::anyhow!("Log file level specified without log file"));
        }
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Collector settings: configuration file first, then `-c key=value` overrides
pub fn build_collector_config(args: &cli::Args, config: &config::ConfigManager) -> Result<CollectorConfig> {
    let mut collector_config = config.get_collector_config()?;
    for assignment in &args.overrides {
        collector_config
            .apply_override(assignment)
            .with_context(|| format!("Invalid override '{}'", assignment))?;
    }
    collector_config.validate()?;
    debug!("Collector configuration: {:?}", collector_config);
    Ok(collector_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn args(argv: &[&str]) -> cli::Args {
        cli::parse_args_from(std::iter::once("repostats").chain(argv.iter().copied())).unwrap()
    }

    fn manager(sections: &[(&str, &[(&str, &str)])]) -> config::ConfigManager {
        let mut configuration = config::Configuration::new();
        for (section, values) in sections {
            let values: HashMap<String, String> = values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            configuration.insert(section.to_string(), values);
        }
        config::ConfigManager::from_config(configuration)
    }

    #[test]
    fn test_overrides_win_over_file() {
        let manager = manager(&[("collect", &[("max_authors", "5"), ("commit_end", "main")])]);
        let config = build_collector_config(&args(&["-c", "max_authors=7", "repo", "out"]), &manager).unwrap();
        assert_eq!(config.max_authors, 7);
        assert_eq!(config.commit_end, "main");
    }

    #[test]
    fn test_unknown_override_is_fatal() {
        let manager = manager(&[]);
        let err = build_collector_config(&args(&["-c", "theme=a.css", "repo", "out"]), &manager).unwrap_err();
        assert!(format!("{:#}", err).contains("No such key"));
    }

    #[test]
    fn test_zero_processes_is_fatal() {
        let manager = manager(&[]);
        assert!(build_collector_config(&args(&["-c", "processes=0", "repo", "out"]), &manager).is_err());
    }

    #[test]
    fn test_logging_levels_from_flags() {
        let manager = manager(&[]);
        let config = configure_logging(&args(&["--verbose", "repo", "out"]), &manager).unwrap();
        assert_eq!(config.console_level, log::LevelFilter::Debug);
        assert_eq!(config.destination, logging::LogDestination::Console);

        let config = configure_logging(&args(&["--quiet", "repo", "out"]), &manager).unwrap();
        assert_eq!(config.console_level, log::LevelFilter::Error);
    }

    #[test]
    fn test_logging_file_from_configuration() {
        let manager = manager(&[(
            "base",
            &[("log-file", "/tmp/repostats.log"), ("file-log-level", "trace"), ("log-format", "json")],
        )]);
        let config = configure_logging(&args(&["repo", "out"]), &manager).unwrap();
        assert_eq!(
            config.destination,
            logging::LogDestination::Both(PathBuf::from("/tmp/repostats.log"))
        );
        assert_eq!(config.file_level, Some(log::LevelFilter::Trace));
        assert_eq!(config.format, logging::LogFormat::Json);
    }

    #[test]
    fn test_malformed_configured_levels_fall_back() {
        let manager = manager(&[(
            "base",
            &[
                ("log-file", "/tmp/repostats.log"),
                ("file-log-level", "loud"),
                ("console-level", "chatty"),
            ],
        )]);
        let config = configure_logging(&args(&["repo", "out"]), &manager).unwrap();
        assert_eq!(config.console_level, log::LevelFilter::Info);
        assert_eq!(config.file_level, Some(log::LevelFilter::Info));
    }
}
