//! Caller-facing transaction surface.
//!
//! A transaction is an identified batch of file writes, applied all-or-
//! nothing through the WAL-backed writer. The serialized form is what UI
//! shells queue and hand across process boundaries.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::wal::WriteOp;
use crate::writer::write_files;

/// An identified all-or-nothing batch of file writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub operations: Vec<WriteOp>,
}

impl Transaction {
    pub fn new(id: impl Into<String>, operations: Vec<WriteOp>) -> Self {
        Self { id: id.into(), operations }
    }
}

/// Serialize a transaction for queueing or transport.
pub fn serialize_tx(tx: &Transaction) -> Result<String> {
    Ok(serde_json::to_string(tx)?)
}

/// Deserialize a transaction from its JSON form.
pub fn deserialize_tx(data: &str) -> Result<Transaction> {
    Ok(serde_json::from_str(data)?)
}

/// Durably apply a transaction's writes as one unit.
pub async fn apply_transaction(root: &Path, tx: &Transaction) -> Result<()> {
    info!(id = %tx.id, ops = tx.operations.len(), "applying transaction");
    write_files(root, &tx.operations).await
}
