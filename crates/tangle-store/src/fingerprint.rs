//! Persisted fingerprint table.
//!
//! Maps each page path to the fingerprint it had when last indexed, so a
//! reindex pass can skip unchanged files without parsing them. Saved through
//! the atomic writer after every pass, even a pass that changed nothing, so
//! table growth is never lost.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::fs;

use tangle_core::Fingerprint;

use crate::error::Result;
use crate::paths::FINGERPRINTS_FILE;
use crate::wal::WriteOp;
use crate::writer::write_files;

/// Path -> fingerprint map, persisted as JSON under `.graph/`.
#[derive(Debug, Default, Clone)]
pub struct FingerprintTable {
    entries: BTreeMap<String, Fingerprint>,
}

impl FingerprintTable {
    /// Load the table, or start empty when none was saved yet.
    pub async fn load(root: &Path) -> Result<Self> {
        let file = root.join(FINGERPRINTS_FILE);
        let entries = match fs::read_to_string(&file).await {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { entries })
    }

    /// Persist the table through the atomic writer.
    pub async fn save(&self, root: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        write_files(
            root,
            &[WriteOp { path: FINGERPRINTS_FILE.to_string(), content }],
        )
        .await
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: String, fingerprint: Fingerprint) {
        self.entries.insert(path, fingerprint);
    }

    pub fn remove(&mut self, path: &str) {
        self.entries.remove(path);
    }

    /// All tracked paths, for stale-entry detection.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
