//! Conflict/merge pipeline for the watch path.
//!
//! Consumes raw file-change events and emits semantic graph events, one per
//! accepted change per path, in arrival order. Each change is fingerprinted
//! first so redelivered events (the backends are at-least-once) cost one
//! hash, not a re-parse. When a change diverges from the snapshot held for
//! that file, the conflict is surfaced before the default theirs-wins
//! update, so a caller can route the file through the CRDT path instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use tangle_core::{detect_conflicts, parse_page, resolve_theirs, Fingerprint, FsAdapter, ParsedPage};

use crate::error::{Result, WatchError};
use crate::events::{GraphEvent, WatchEvent, WatchEventKind};

/// Per-root pipeline state: held parses and last-seen fingerprints.
pub struct WatchPipeline {
    root: PathBuf,
    adapter: Arc<dyn FsAdapter>,
    output: mpsc::Sender<GraphEvent>,
    fingerprints: HashMap<String, Fingerprint>,
    parsed: HashMap<String, ParsedPage>,
}

impl WatchPipeline {
    pub fn new(
        root: impl Into<PathBuf>,
        adapter: Arc<dyn FsAdapter>,
        output: mpsc::Sender<GraphEvent>,
    ) -> Self {
        Self {
            root: root.into(),
            adapter,
            output,
            fingerprints: HashMap::new(),
            parsed: HashMap::new(),
        }
    }

    /// Seed held snapshots, typically from the read index built at startup.
    /// Seeded files carry no fingerprint, so their first event always
    /// re-parses.
    pub fn with_initial(mut self, pages: impl IntoIterator<Item = ParsedPage>) -> Self {
        for page in pages {
            self.parsed.insert(page.page.path.clone(), page);
        }
        self
    }

    /// Drain events until the input channel closes. Per-file failures are
    /// logged and skipped; a closed output channel stops the loop.
    pub async fn run(mut self, mut events: mpsc::Receiver<WatchEvent>) {
        while let Some(event) = events.recv().await {
            match self.handle(event).await {
                Ok(()) => {}
                Err(WatchError::Channel(_)) => break,
                Err(e) => warn!(error = %e, "watch event failed"),
            }
        }
    }

    /// Process one raw event, emitting zero or more graph events.
    pub async fn handle(&mut self, event: WatchEvent) -> Result<()> {
        let rel = self.rel_key(&event.path);
        if !rel.ends_with(".md") {
            return Ok(());
        }
        match event.kind {
            WatchEventKind::Removed => {
                self.parsed.remove(&rel);
                self.fingerprints.remove(&rel);
                self.send(GraphEvent::Removed { path: rel }).await
            }
            WatchEventKind::Added | WatchEventKind::Changed => self.change(&rel).await,
        }
    }

    async fn change(&mut self, rel: &str) -> Result<()> {
        let abs = self.root.join(rel);
        let content = self.adapter.read_file(&abs).await?;
        let stat = self.adapter.stat(&abs).await?;
        let fingerprint = Fingerprint::of(&content, &stat);
        if self.fingerprints.get(rel) == Some(&fingerprint) {
            debug!(path = rel, "fingerprint unchanged, skipping");
            return Ok(());
        }
        let next = parse_page(rel, &content);
        let accepted = match self.parsed.get(rel) {
            Some(prev) => match detect_conflicts(prev, &next) {
                Some(conflict) => {
                    warn!(path = rel, blocks = conflict.blocks.len(), "divergent edits detected");
                    self.send(GraphEvent::Conflict(conflict)).await?;
                    resolve_theirs(prev, next)
                }
                None => next,
            },
            None => next,
        };
        self.parsed.insert(rel.to_string(), accepted.clone());
        self.fingerprints.insert(rel.to_string(), fingerprint);
        self.send(GraphEvent::Updated { path: rel.to_string(), page: accepted }).await
    }

    fn rel_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    async fn send(&self, event: GraphEvent) -> Result<()> {
        self.output
            .send(event)
            .await
            .map_err(|_| WatchError::Channel("graph event receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::test_support::MemoryFsAdapter;

    fn pipeline(
        adapter: Arc<MemoryFsAdapter>,
    ) -> (WatchPipeline, mpsc::Receiver<GraphEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (WatchPipeline::new("graph", adapter, tx), rx)
    }

    fn changed(path: &str) -> WatchEvent {
        WatchEvent::new(WatchEventKind::Changed, path)
    }

    #[tokio::test]
    async fn emits_updated_for_a_fresh_change() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/alpha.md", "title:: Alpha\n- id:: a1 one");
        let (mut pipe, mut rx) = pipeline(adapter);

        pipe.handle(changed("graph/alpha.md")).await.expect("handle");
        match rx.recv().await.expect("event") {
            GraphEvent::Updated { path, page } => {
                assert_eq!(path, "alpha.md");
                assert_eq!(page.page.title, "Alpha");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn redelivered_events_are_dropped_by_fingerprint() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/alpha.md", "- id:: a1 one");
        let (mut pipe, mut rx) = pipeline(adapter);

        pipe.handle(changed("graph/alpha.md")).await.expect("first");
        pipe.handle(changed("graph/alpha.md")).await.expect("redelivery");

        assert!(matches!(rx.recv().await, Some(GraphEvent::Updated { .. })));
        assert!(rx.try_recv().is_err(), "duplicate event must not re-emit");
    }

    #[tokio::test]
    async fn divergent_edit_surfaces_conflict_then_theirs_wins_update() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/alpha.md", "- id:: a1 uno");
        let held = parse_page("alpha.md", "- id:: a1 one");
        let (pipe, mut rx) = pipeline(adapter);
        let mut pipe = pipe.with_initial(vec![held]);

        pipe.handle(changed("graph/alpha.md")).await.expect("handle");

        match rx.recv().await.expect("conflict event") {
            GraphEvent::Conflict(conflict) => {
                assert_eq!(conflict.file, "alpha.md");
                assert_eq!(conflict.blocks.len(), 1);
                assert_eq!(conflict.blocks[0].ours, "one");
                assert_eq!(conflict.blocks[0].theirs, "uno");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        match rx.recv().await.expect("update event") {
            GraphEvent::Updated { page, .. } => {
                assert_eq!(page.blocks[0].text, "uno");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn compatible_edit_updates_without_conflict() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/alpha.md", "- id:: a1 one\n- id:: a2 appended");
        let held = parse_page("alpha.md", "- id:: a1 one");
        let (pipe, mut rx) = pipeline(adapter);
        let mut pipe = pipe.with_initial(vec![held]);

        pipe.handle(changed("graph/alpha.md")).await.expect("handle");
        match rx.recv().await.expect("event") {
            GraphEvent::Updated { page, .. } => assert_eq!(page.blocks.len(), 2),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn removal_clears_state_and_emits_removed() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/alpha.md", "- id:: a1 one");
        let (mut pipe, mut rx) = pipeline(adapter.clone());

        pipe.handle(changed("graph/alpha.md")).await.expect("change");
        adapter.remove("graph/alpha.md");
        pipe.handle(WatchEvent::new(WatchEventKind::Removed, "graph/alpha.md"))
            .await
            .expect("remove");

        assert!(matches!(rx.recv().await, Some(GraphEvent::Updated { .. })));
        assert!(matches!(
            rx.recv().await,
            Some(GraphEvent::Removed { path }) if path == "alpha.md"
        ));
        assert!(pipe.parsed.is_empty());
    }

    #[tokio::test]
    async fn non_outline_files_are_ignored() {
        let adapter = Arc::new(MemoryFsAdapter::new());
        adapter.write("graph/notes.txt", "not an outline");
        let (mut pipe, mut rx) = pipeline(adapter);

        pipe.handle(changed("graph/notes.txt")).await.expect("handle");
        assert!(rx.try_recv().is_err());
    }
}
