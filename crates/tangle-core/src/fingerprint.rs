//! File fingerprints for cheap change detection.
//!
//! A fingerprint is `(mtime, size, content hash)`. The hash uses BLAKE3,
//! hex-encoded, so two files are considered unchanged only when all three
//! components match.

use serde::{Deserialize, Serialize};

use crate::traits::FileStat;

/// Fingerprint of one file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Modification time in milliseconds since the epoch.
    #[serde(rename = "mtime")]
    pub mtime_ms: u64,
    /// File size in bytes.
    pub size: u64,
    /// Hex-encoded BLAKE3 digest of the content.
    pub hash: String,
}

impl Fingerprint {
    /// Fingerprint file content together with its stat info.
    pub fn of(content: &str, stat: &FileStat) -> Self {
        Self {
            mtime_ms: stat.mtime_ms,
            size: stat.size,
            hash: hash_content(content),
        }
    }
}

/// Hex-encoded BLAKE3 digest of a string.
pub fn hash_content(content: &str) -> String {
    let digest = blake3::hash(content.as_bytes());
    hex::encode(digest.as_bytes())
}
