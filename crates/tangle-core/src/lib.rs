//! Core graph model for Tangle, a local-first outline knowledge base.
//!
//! Pure data structures and algorithms only; everything that touches disk
//! lives in `tangle-store`, and watch plumbing lives in `tangle-watch`. The
//! on-disk files are the single source of truth — the read index and CRDT
//! documents here are rebuildable caches over them.

pub mod conflict;
pub mod crdt;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod parser;
pub mod test_support;
pub mod traits;
pub mod types;

pub use conflict::{detect_conflicts, resolve_theirs, BlockConflict, Conflict};
pub use crdt::{
    BlockChange, BlockContent, BlockState, CrdtDelta, CrdtDoc, CrdtOperation, LamportTimestamp,
    ORIGIN_ACTOR,
};
pub use error::{CoreError, Result};
pub use fingerprint::{hash_content, Fingerprint};
pub use index::GraphIndex;
pub use parser::{extract_links, page_to_markdown, parse_page, ParsedPage};
pub use traits::{FileStat, FsAdapter};
pub use types::{block_key, parent_key, Backlink, Block, Link, Page, SearchResult};
