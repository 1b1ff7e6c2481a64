//! Write-ahead log.
//!
//! One newline-delimited JSON entry per transaction, appended and fsynced
//! before any file mutation and removed only after every mutation landed. A
//! crash at any point leaves either the old or the new content of each file,
//! and recovery replays whatever entries are still in the log.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::paths::WAL_FILE;

/// One intended file write: full content for a path relative to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOp {
    pub path: String,
    pub content: String,
}

/// One transaction's batch of writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub ops: Vec<WriteOp>,
}

/// Append one entry, fsynced so it survives a crash immediately after.
pub async fn append(root: &Path, entry: &WalEntry) -> Result<()> {
    let file = root.join(WAL_FILE);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut handle = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file)
        .await?;
    handle.write_all(line.as_bytes()).await?;
    handle.sync_all().await?;
    debug!(ops = entry.ops.len(), "appended wal entry");
    Ok(())
}

/// Read all pending entries. A missing log means no pending work. A torn
/// trailing line (crash mid-append) is skipped: its transaction never
/// promised durability.
pub async fn read(root: &Path) -> Result<Vec<WalEntry>> {
    let file = root.join(WAL_FILE);
    let text = match fs::read_to_string(&file).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut entries = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<WalEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(error = %e, "skipping malformed wal line"),
        }
    }
    Ok(entries)
}

/// Drop the log. Idempotent.
pub async fn clear(root: &Path) -> Result<()> {
    let file = root.join(WAL_FILE);
    match fs::remove_file(&file).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, content: &str) -> WalEntry {
        WalEntry {
            ops: vec![WriteOp { path: path.into(), content: content.into() }],
        }
    }

    #[tokio::test]
    async fn appends_and_reads_back_entries_in_order() {
        let root = tempfile::tempdir().expect("tempdir");
        append(root.path(), &entry("a.md", "A")).await.expect("append");
        append(root.path(), &entry("b.md", "B")).await.expect("append");
        let entries = read(root.path()).await.expect("read");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ops[0].path, "a.md");
        assert_eq!(entries[1].ops[0].path, "b.md");
    }

    #[tokio::test]
    async fn missing_log_reads_as_empty() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(read(root.path()).await.expect("read").is_empty());
        clear(root.path()).await.expect("clear is idempotent");
    }

    #[tokio::test]
    async fn torn_trailing_line_is_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        append(root.path(), &entry("a.md", "A")).await.expect("append");
        let file = root.path().join(WAL_FILE);
        let mut raw = tokio::fs::read_to_string(&file).await.expect("raw log");
        raw.push_str("{\"ops\":[{\"path\":\"b.md\",\"cont");
        tokio::fs::write(&file, raw).await.expect("truncate mid-entry");

        let entries = read(root.path()).await.expect("read");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ops[0].path, "a.md");
    }

    #[tokio::test]
    async fn clear_removes_the_log() {
        let root = tempfile::tempdir().expect("tempdir");
        append(root.path(), &entry("a.md", "A")).await.expect("append");
        clear(root.path()).await.expect("clear");
        assert!(read(root.path()).await.expect("read").is_empty());
    }
}
