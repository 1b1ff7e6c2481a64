//! Error types for the persistence layer.

use thiserror::Error;

/// Errors from WAL, atomic-write, snapshot, and indexing operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying file-system call failed. Not retried automatically; the
    /// WAL keeps the entry so recovery can retry on next startup.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// WAL entry, snapshot, or fingerprint table failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A page path normalized outside the graph root. Rejected before any
    /// disk write is attempted.
    #[error("invalid page path outside root: {0}")]
    InvalidPath(String),

    /// Error from the core graph model.
    #[error(transparent)]
    Core(#[from] tangle_core::CoreError),

    /// Error from the sidecar index.
    #[error(transparent)]
    Index(#[from] tangle_index::IndexError),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
