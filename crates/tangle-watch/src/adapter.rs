//! Local file-system implementation of the core [`FsAdapter`] contract.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::fs;

use tangle_core::{CoreError, FileStat, FsAdapter};

/// Tokio-backed adapter for a local graph directory.
#[derive(Debug, Default, Clone)]
pub struct TokioFsAdapter;

impl TokioFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsAdapter for TokioFsAdapter {
    async fn list_files(&self, dir: &Path) -> tangle_core::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let mut dirs = vec![dir.to_path_buf()];
        while let Some(current) = dirs.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    dirs.push(path);
                } else if let Ok(rel) = path.strip_prefix(dir) {
                    out.push(rel.to_path_buf());
                }
            }
        }
        out.sort();
        Ok(out)
    }

    async fn read_file(&self, path: &Path) -> tangle_core::Result<String> {
        Ok(fs::read_to_string(path).await?)
    }

    async fn stat(&self, path: &Path) -> tangle_core::Result<FileStat> {
        let meta = fs::metadata(path).await?;
        let mtime_ms = meta
            .modified()
            .map_err(CoreError::Io)?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(FileStat { mtime_ms, size: meta.len() })
    }
}
