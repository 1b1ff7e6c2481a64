//! Watching and the non-CRDT merge path for Tangle graphs.
//!
//! A watch backend produces a stream of raw file events; the
//! [`WatchPipeline`] consumes them and emits either an updated-document
//! event or a conflict event per file, preserving arrival order per path.
//! This is the simpler alternative to the CRDT path for resolving
//! concurrent edits: conflicts default to theirs-wins but are surfaced
//! before being applied.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod events;
pub mod pipeline;

pub use adapter::TokioFsAdapter;
pub use backend::NotifyWatcher;
pub use error::{Result, WatchError};
pub use events::{GraphEvent, WatchEvent, WatchEventKind};
pub use pipeline::WatchPipeline;
