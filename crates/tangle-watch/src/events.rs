//! Event types flowing through the watch pipeline.

use std::path::PathBuf;

use tangle_core::{Conflict, ParsedPage};

/// Kind of raw file-system event, delivered with at-least-once semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// File appeared.
    Added,
    /// File content changed.
    Changed,
    /// File disappeared.
    Removed,
}

impl WatchEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }
}

/// One raw file-system event from a watch backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self { kind, path: path.into() }
    }
}

/// Semantic output of the pipeline, one-in analogous-one-out per file path
/// (a conflicting change additionally surfaces the conflict first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// A page was added or changed; carries the freshly accepted parse.
    Updated { path: String, page: ParsedPage },
    /// Divergent concurrent edits were detected. Emitted before the
    /// theirs-wins update so callers can substitute their own policy.
    Conflict(Conflict),
    /// A page file was deleted.
    Removed { path: String },
}
