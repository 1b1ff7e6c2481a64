//! Error types for the sidecar index.

use thiserror::Error;

/// Errors from sidecar index operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Underlying SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Link payloads failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Index file or its directory could not be created.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sidecar index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
