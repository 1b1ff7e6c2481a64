//! Error types for the watch layer.

use thiserror::Error;

/// Errors from watching and the conflict/merge pipeline.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Error from the core model or a file-system adapter.
    #[error(transparent)]
    Core(#[from] tangle_core::CoreError),

    /// The native watch backend failed.
    #[error("watch backend error: {0}")]
    Notify(#[from] notify::Error),

    /// An event channel closed while the pipeline was still running.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Result type for watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;
