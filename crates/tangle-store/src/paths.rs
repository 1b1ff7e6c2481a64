//! Graph-root path handling.
//!
//! Every path that reaches the writer is normalized first: separators become
//! `/`, `.` and empty segments drop out, and `..` segments resolve. A path
//! that resolves outside the root is rejected with
//! [`StoreError::InvalidPath`] before anything touches disk.

use crate::error::{Result, StoreError};

/// Bookkeeping directory kept alongside the page files.
pub const GRAPH_DIR: &str = ".graph";
/// Newline-delimited JSON write-ahead log.
pub const WAL_FILE: &str = ".graph/wal.log";
/// Persisted fingerprint table.
pub const FINGERPRINTS_FILE: &str = ".graph/fingerprints.json";
/// Per-page CRDT snapshots.
pub const CRDT_DIR: &str = ".graph/crdt";
/// Sidecar search/backlink index database.
pub const INDEX_FILE: &str = ".graph/index.sqlite";

/// Normalize a page path relative to the graph root.
pub fn normalize_page_path(path: &str) -> Result<String> {
    let forward = path.replace('\\', "/");
    let trimmed = forward.strip_prefix("./").unwrap_or(&forward);
    let trimmed = trimmed.trim_start_matches('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in trimmed.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(StoreError::InvalidPath(path.to_string()));
                }
            }
            part => parts.push(part),
        }
    }
    Ok(parts.join("/"))
}

/// File name for a page's CRDT snapshot: separators become `__`, anything
/// outside `[A-Za-z0-9._-]` becomes `_`.
pub fn snapshot_filename(normalized: &str) -> String {
    let safe: String = normalized
        .replace('/', "__")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "index.json".to_string()
    } else {
        format!("{safe}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        assert_eq!(normalize_page_path("./pages/alpha.md").unwrap(), "pages/alpha.md");
        assert_eq!(normalize_page_path("pages\\sub\\beta.md").unwrap(), "pages/sub/beta.md");
        assert_eq!(normalize_page_path("/pages//./gamma.md").unwrap(), "pages/gamma.md");
        assert_eq!(normalize_page_path("a/b/../c.md").unwrap(), "a/c.md");
    }

    #[test]
    fn rejects_escapes_from_the_root() {
        assert!(matches!(
            normalize_page_path("../outside.md"),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            normalize_page_path("a/../../outside.md"),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn snapshot_filenames_are_flat_and_portable() {
        assert_eq!(snapshot_filename("pages/alpha.md"), "pages__alpha.md.json");
        assert_eq!(snapshot_filename("weird name?.md"), "weird_name_.md.json");
        assert_eq!(snapshot_filename(""), "index.json");
    }
}
