//! CRDT document persistence.
//!
//! Each page's document saves as two files in one transaction: the outline
//! Markdown (the source of truth other tools read) and a JSON snapshot of
//! the full replicated state under `.graph/crdt/`. Loading prefers the
//! snapshot; without one it bootstraps from the Markdown with every block at
//! the origin sentinel timestamp, so any real actor's first edit wins.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use tangle_core::{parse_page, CrdtDoc};

use crate::error::Result;
use crate::paths::{normalize_page_path, snapshot_filename, CRDT_DIR};
use crate::wal::WriteOp;
use crate::writer::write_files;

/// Loads and persists per-page CRDT documents under one graph root.
#[derive(Debug, Clone)]
pub struct CrdtStore {
    root: PathBuf,
}

impl CrdtStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot location for a page path, relative to the graph root.
    pub fn crdt_path(&self, page_path: &str) -> Result<String> {
        let normalized = normalize_page_path(page_path)?;
        Ok(format!("{CRDT_DIR}/{}", snapshot_filename(&normalized)))
    }

    /// Load a page's document: the JSON snapshot when present, otherwise a
    /// fresh bootstrap from the Markdown file.
    pub async fn load(&self, page_path: &str) -> Result<CrdtDoc> {
        let normalized = normalize_page_path(page_path)?;
        let snapshot_abs = self.root.join(self.crdt_path(&normalized)?);
        match fs::read_to_string(&snapshot_abs).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(page = %normalized, "no snapshot, bootstrapping from markdown");
                let content = fs::read_to_string(self.root.join(&normalized)).await?;
                let parsed = parse_page(&normalized, &content);
                Ok(CrdtDoc::from_parsed(&normalized, &parsed))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist a document: Markdown plus snapshot, one transaction.
    pub async fn persist(&self, doc: &CrdtDoc) -> Result<()> {
        let markdown = doc.to_markdown();
        let snapshot = serde_json::to_string_pretty(doc)?;
        write_files(
            &self.root,
            &[
                WriteOp { path: doc.path.clone(), content: markdown },
                WriteOp { path: self.crdt_path(&doc.path)?, content: snapshot },
            ],
        )
        .await
    }
}
