//! Command Execution Error Types

use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while running an external command pipeline
#[derive(Debug, Error)]
pub enum CommandError {
    /// A pipeline needs at least one stage
    #[error("Empty command pipeline")]
    EmptyPipeline,

    /// The program could not be started
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting one stage's stdout to the next stage's stdin failed
    #[error("Failed to connect pipeline after '{command}': {source}")]
    Pipe {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the pipeline or reading its output failed
    #[error("I/O error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The final stage exited unsuccessfully
    #[error("'{command}' failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The pipeline exceeded its deadline and was killed
    #[error("'{command}' did not finish within {limit:?} and was killed")]
    Timeout { command: String, limit: Duration },
}

impl CommandError {
    /// The command line this error refers to, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::EmptyPipeline => None,
            Self::Spawn { command, .. }
            | Self::Pipe { command, .. }
            | Self::Io { command, .. }
            | Self::Failed { command, .. }
            | Self::Timeout { command, .. } => Some(command),
        }
    }

    /// Whether the failure came from the deadline rather than the command itself
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for command execution
pub type CommandResult<T> = Result<T, CommandError>;
