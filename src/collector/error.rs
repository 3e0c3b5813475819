//! Collector Error Types

use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;

/// Fatal errors raised before or during collection
#[derive(Debug, Error)]
pub enum CollectError {
    /// Invalid collector settings
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured repository path does not exist
    #[error("Path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    /// A configured path is not inside a git repository
    #[error("Not a git repository: {}: {source}", path.display())]
    NotARepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// A path could not be resolved
    #[error("Failed to resolve path {}: {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory is missing and cannot be created, or is a file
    #[error("Output path is not a directory or does not exist: {} ({reason})", path.display())]
    OutputPath { path: PathBuf, reason: String },

    /// Collection was cancelled before every pass completed
    #[error("Collection interrupted")]
    Interrupted,
}

impl CollectError {
    pub fn output_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OutputPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for collection
pub type CollectResult<T> = Result<T, CollectError>;
