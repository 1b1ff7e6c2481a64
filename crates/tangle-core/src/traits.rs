//! File-system abstraction consumed by the index builder and watch pipeline.
//!
//! The core never talks to the file system directly; everything goes through
//! [`FsAdapter`] so desktop, mobile, and test hosts can plug in their own
//! implementations. Watching is delivered separately as an event stream by
//! the watch crate, since channel plumbing is host-specific.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Minimal stat info used for fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Modification time in milliseconds since the epoch.
    pub mtime_ms: u64,
    /// File size in bytes.
    pub size: u64,
}

/// Read-only file-system access, async at every call.
#[async_trait]
pub trait FsAdapter: Send + Sync {
    /// List all regular files under `dir`, recursively, as paths relative to
    /// `dir`. Internal bookkeeping directories (anything starting with `.`)
    /// are not listed.
    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Read a file as UTF-8 text.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Stat a file.
    async fn stat(&self, path: &Path) -> Result<FileStat>;
}
