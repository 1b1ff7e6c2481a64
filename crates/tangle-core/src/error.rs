//! Error types for the core graph model.

use thiserror::Error;

/// Errors produced by core graph operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Point lookup on a page or block that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A page path normalized outside the graph root.
    #[error("invalid page path outside root: {0}")]
    InvalidPath(String),

    /// A concurrent external edit diverged from the in-memory state.
    #[error("conflicting edits detected in {0}")]
    ConflictDetected(String),

    /// IO error from a file-system adapter.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
