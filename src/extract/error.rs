//! Parallel Extraction Error Types

use thiserror::Error;
use tokio::task::JoinError;

/// Errors raised by the extraction worker pool
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The batch was cancelled before the task finished
    #[error("Extraction task cancelled")]
    Cancelled,

    /// The task panicked or was aborted by the runtime
    #[error("Extraction task failed to join: {0}")]
    Join(String),

    /// The worker pool was shut down
    #[error("Extraction worker pool is closed")]
    Closed,
}

impl From<JoinError> for ExtractError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            ExtractError::Cancelled
        } else {
            ExtractError::Join(err.to_string())
        }
    }
}

/// Result type for extraction tasks
pub type ExtractResult<T> = Result<T, ExtractError>;
