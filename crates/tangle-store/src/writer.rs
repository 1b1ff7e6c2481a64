//! Atomic multi-file writer with WAL-backed crash recovery.
//!
//! `write_files` is the only path by which in-memory state reaches disk:
//! log the whole batch, then for each file write a temp sibling and rename
//! it over the target, then drop the log entry. Rename is atomic on a local
//! file system, so any single file is either fully old or fully new. On a
//! partial failure the entry stays in the log and `recover` finishes the job
//! on next startup; replaying an already-applied write is a no-op.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::Result;
use crate::paths::normalize_page_path;
use crate::wal::{self, WalEntry, WriteOp};

/// Durably write a batch of files as one transaction.
pub async fn write_files(root: &Path, ops: &[WriteOp]) -> Result<()> {
    if ops.is_empty() {
        return Ok(());
    }
    // Validate every path before the log or the disk sees anything.
    for op in ops {
        normalize_page_path(&op.path)?;
    }
    let entry = WalEntry { ops: ops.to_vec() };
    wal::append(root, &entry).await?;
    apply_entry(root, &entry).await?;
    wal::clear(root).await
}

/// Replay any leftover WAL entries, then clear the log. Safe to call when
/// the log is empty, and safe to call twice.
pub async fn recover(root: &Path) -> Result<()> {
    let entries = wal::read(root).await?;
    if entries.is_empty() {
        return Ok(());
    }
    info!(entries = entries.len(), "replaying wal");
    for entry in &entries {
        apply_entry(root, entry).await?;
    }
    wal::clear(root).await
}

async fn apply_entry(root: &Path, entry: &WalEntry) -> Result<()> {
    for op in &entry.ops {
        let rel = normalize_page_path(&op.path)?;
        let abs = root.join(&rel);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = temp_sibling(&abs);
        fs::write(&tmp, &op.content).await?;
        fs::rename(&tmp, &abs).await?;
        debug!(path = %rel, bytes = op.content.len(), "wrote file");
    }
    Ok(())
}

fn temp_sibling(abs: &Path) -> PathBuf {
    let mut name = OsString::from(abs.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn writes_files_and_clears_wal() {
        let root = tempfile::tempdir().expect("tempdir");
        write_files(
            root.path(),
            &[WriteOp { path: "alpha.md".into(), content: "Alpha".into() }],
        )
        .await
        .expect("write");

        let data = fs::read_to_string(root.path().join("alpha.md")).await.expect("read back");
        assert_eq!(data, "Alpha");
        assert!(wal::read(root.path()).await.expect("wal").is_empty());
    }

    #[tokio::test]
    async fn writes_a_whole_batch_including_nested_paths() {
        let root = tempfile::tempdir().expect("tempdir");
        write_files(
            root.path(),
            &[
                WriteOp { path: "pages/alpha.md".into(), content: "A".into() },
                WriteOp { path: ".graph/crdt/pages__alpha.md.json".into(), content: "{}".into() },
            ],
        )
        .await
        .expect("write batch");

        assert!(root.path().join("pages/alpha.md").exists());
        assert!(root.path().join(".graph/crdt/pages__alpha.md.json").exists());
    }

    #[tokio::test]
    async fn rejects_escaping_paths_before_writing_anything() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = write_files(
            root.path(),
            &[
                WriteOp { path: "ok.md".into(), content: "fine".into() },
                WriteOp { path: "../escape.md".into(), content: "nope".into() },
            ],
        )
        .await
        .expect_err("must reject");
        assert!(matches!(err, StoreError::InvalidPath(_)));
        // Nothing was written and nothing was logged.
        assert!(!root.path().join("ok.md").exists());
        assert!(wal::read(root.path()).await.expect("wal").is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let root = tempfile::tempdir().expect("tempdir");
        write_files(root.path(), &[]).await.expect("empty write");
        assert!(wal::read(root.path()).await.expect("wal").is_empty());
    }

    #[tokio::test]
    async fn overwrite_replaces_content_atomically() {
        let root = tempfile::tempdir().expect("tempdir");
        let op = |content: &str| vec![WriteOp { path: "alpha.md".into(), content: content.into() }];
        write_files(root.path(), &op("old")).await.expect("first write");
        write_files(root.path(), &op("new")).await.expect("second write");
        let data = fs::read_to_string(root.path().join("alpha.md")).await.expect("read");
        assert_eq!(data, "new");
        assert!(!root.path().join("alpha.md.tmp").exists());
    }
}
