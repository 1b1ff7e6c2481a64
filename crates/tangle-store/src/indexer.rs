//! Incremental indexer.
//!
//! A reindex pass walks the `*.md` files under the root, fingerprints each,
//! and re-parses only those whose fingerprint changed since the last pass,
//! pushing the result into the sidecar index. Paths whose files vanished are
//! evicted. Returns the paths actually re-indexed so callers can verify that
//! untouched files were skipped. The fingerprint table persists after every
//! pass, changed or not.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tokio::fs;
use tracing::{debug, info};

use tangle_core::{parse_page, FileStat, Fingerprint};
use tangle_index::SidecarIndex;

use crate::error::Result;
use crate::fingerprint::FingerprintTable;
use crate::paths::INDEX_FILE;

/// Drives incremental re-indexing of one graph root into its sidecar index.
pub struct Indexer {
    root: PathBuf,
    sidecar: SidecarIndex,
    fingerprints: FingerprintTable,
}

impl Indexer {
    /// Open the sidecar index and load the persisted fingerprint table.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let sidecar = SidecarIndex::open(&root.join(INDEX_FILE))?;
        let fingerprints = FingerprintTable::load(&root).await?;
        Ok(Self { root, sidecar, fingerprints })
    }

    /// The sidecar index this indexer feeds.
    pub fn sidecar(&self) -> &SidecarIndex {
        &self.sidecar
    }

    /// Fingerprint currently stored for a path, if any.
    pub fn fingerprint(&self, path: &str) -> Option<&Fingerprint> {
        self.fingerprints.get(path)
    }

    /// Run one reindex pass. Returns the relative paths that were actually
    /// re-parsed and pushed into the sidecar index.
    pub async fn reindex(&mut self) -> Result<Vec<String>> {
        let files = list_markdown_files(&self.root).await?;
        let mut updated = Vec::new();
        let mut seen = BTreeSet::new();

        for rel in files {
            let abs = self.root.join(&rel);
            let content = fs::read_to_string(&abs).await?;
            let meta = fs::metadata(&abs).await?;
            let mtime_ms = meta
                .modified()?
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            let stat = FileStat { mtime_ms, size: meta.len() };
            let fingerprint = Fingerprint::of(&content, &stat);
            seen.insert(rel.clone());

            if self.fingerprints.get(&rel) == Some(&fingerprint) {
                continue;
            }
            let parsed = parse_page(&rel, &content);
            self.sidecar.upsert_page(&parsed.page, &parsed.blocks)?;
            self.fingerprints.insert(rel.clone(), fingerprint);
            updated.push(rel);
        }

        let stale: Vec<String> = self
            .fingerprints
            .paths()
            .filter(|p| !seen.contains(*p))
            .cloned()
            .collect();
        for path in stale {
            debug!(path = %path, "evicting deleted page");
            self.fingerprints.remove(&path);
            self.sidecar.remove_path(&path)?;
        }

        self.fingerprints.save(&self.root).await?;
        info!(updated = updated.len(), tracked = self.fingerprints.len(), "reindex pass complete");
        Ok(updated)
    }
}

/// All `.md` files under the root, as sorted root-relative paths. Dot
/// directories (including `.graph`) are not descended into.
async fn list_markdown_files(root: &Path) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                dirs.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
                if let Ok(rel) = path.strip_prefix(root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
    }
    out.sort();
    Ok(out)
}
