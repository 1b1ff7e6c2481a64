//! Durable persistence for Tangle graphs.
//!
//! Everything here funnels through one rule: the atomic writer is the sole
//! path by which in-memory state reaches disk. A transaction appends a WAL
//! entry, writes each file via temp-then-rename, and clears the entry; a
//! crash anywhere in between is finished by [`writer::recover`] on the next
//! startup. On top of that sit the CRDT document store, the fingerprint
//! table, and the incremental indexer feeding the sidecar index.

pub mod docstore;
pub mod error;
pub mod fingerprint;
pub mod indexer;
pub mod paths;
pub mod tx;
pub mod wal;
pub mod writer;

pub use docstore::CrdtStore;
pub use error::{Result, StoreError};
pub use fingerprint::FingerprintTable;
pub use indexer::Indexer;
pub use paths::{normalize_page_path, snapshot_filename, CRDT_DIR, FINGERPRINTS_FILE, GRAPH_DIR, INDEX_FILE, WAL_FILE};
pub use tx::{apply_transaction, deserialize_tx, serialize_tx, Transaction};
pub use wal::{WalEntry, WriteOp};
pub use writer::{recover, write_files};
