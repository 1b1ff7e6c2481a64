//! In-memory file system for tests.
//!
//! Backs the [`FsAdapter`] trait with a plain map so parser, index, and
//! watch-pipeline tests run without touching disk. Each write bumps a fake
//! mtime so fingerprint comparisons behave like a real file system.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::traits::{FileStat, FsAdapter};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    stat: FileStat,
}

/// A thread-safe in-memory [`FsAdapter`].
#[derive(Debug, Default)]
pub struct MemoryFsAdapter {
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    clock: AtomicU64,
}

impl MemoryFsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file, advancing the fake mtime.
    pub fn write(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let content = content.into();
        let mtime_ms = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let stat = FileStat { mtime_ms, size: content.len() as u64 };
        self.files
            .lock()
            .expect("memory fs lock")
            .insert(path.into(), MemoryFile { content, stat });
    }

    /// Remove a file if present.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files
            .lock()
            .expect("memory fs lock")
            .remove(path.as_ref());
    }
}

#[async_trait]
impl FsAdapter for MemoryFsAdapter {
    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().expect("memory fs lock");
        Ok(files
            .keys()
            .filter_map(|p| p.strip_prefix(dir).ok().map(Path::to_path_buf))
            .collect())
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().expect("memory fs lock");
        files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| CoreError::NotFound(format!("file {} not found", path.display())))
    }

    async fn stat(&self, path: &Path) -> Result<FileStat> {
        let files = self.files.lock().expect("memory fs lock");
        files
            .get(path)
            .map(|f| f.stat)
            .ok_or_else(|| CoreError::NotFound(format!("file {} not found", path.display())))
    }
}
