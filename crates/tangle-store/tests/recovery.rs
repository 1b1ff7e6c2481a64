//! Crash-recovery behavior of the WAL-backed writer.
//!
//! A crash is simulated by appending WAL entries without applying them (or
//! applying them only partially) and then running recovery, which must leave
//! the same file contents as a successful non-crashing write.

use tangle_store::{recover, wal, WalEntry, WriteOp};
use tokio::fs;

fn entry(ops: &[(&str, &str)]) -> WalEntry {
    WalEntry {
        ops: ops
            .iter()
            .map(|(path, content)| WriteOp { path: (*path).into(), content: (*content).into() })
            .collect(),
    }
}

#[tokio::test]
async fn replays_wal_entries_on_recovery() {
    let root = tempfile::tempdir().expect("tempdir");
    wal::append(root.path(), &entry(&[("alpha.md", "Alpha")]))
        .await
        .expect("append");

    recover(root.path()).await.expect("recover");

    let data = fs::read_to_string(root.path().join("alpha.md")).await.expect("read");
    assert_eq!(data, "Alpha");
    assert!(wal::read(root.path()).await.expect("wal").is_empty());
}

#[tokio::test]
async fn crash_after_partial_apply_still_converges() {
    let root = tempfile::tempdir().expect("tempdir");
    // The transaction wrote alpha.md but crashed before beta.md and before
    // clearing the log.
    wal::append(root.path(), &entry(&[("alpha.md", "Alpha"), ("pages/beta.md", "Beta")]))
        .await
        .expect("append");
    fs::write(root.path().join("alpha.md"), "Alpha").await.expect("partial apply");

    recover(root.path()).await.expect("recover");

    assert_eq!(
        fs::read_to_string(root.path().join("alpha.md")).await.expect("alpha"),
        "Alpha"
    );
    assert_eq!(
        fs::read_to_string(root.path().join("pages/beta.md")).await.expect("beta"),
        "Beta"
    );
    assert!(wal::read(root.path()).await.expect("wal").is_empty());
}

#[tokio::test]
async fn recovery_is_idempotent() {
    let root = tempfile::tempdir().expect("tempdir");
    wal::append(root.path(), &entry(&[("alpha.md", "Alpha")]))
        .await
        .expect("append");

    recover(root.path()).await.expect("first recover");
    let after_first = fs::read_to_string(root.path().join("alpha.md")).await.expect("read");

    recover(root.path()).await.expect("second recover");
    let after_second = fs::read_to_string(root.path().join("alpha.md")).await.expect("read");

    assert_eq!(after_first, after_second);
    assert!(wal::read(root.path()).await.expect("wal").is_empty());
}

#[tokio::test]
async fn later_entries_win_when_replaying_multiple_transactions() {
    let root = tempfile::tempdir().expect("tempdir");
    wal::append(root.path(), &entry(&[("alpha.md", "old")]))
        .await
        .expect("append old");
    wal::append(root.path(), &entry(&[("alpha.md", "new")]))
        .await
        .expect("append new");

    recover(root.path()).await.expect("recover");

    let data = fs::read_to_string(root.path().join("alpha.md")).await.expect("read");
    assert_eq!(data, "new");
}

#[tokio::test]
async fn recovery_with_no_log_is_a_no_op() {
    let root = tempfile::tempdir().expect("tempdir");
    recover(root.path()).await.expect("recover on clean root");
    assert!(wal::read(root.path()).await.expect("wal").is_empty());
}
