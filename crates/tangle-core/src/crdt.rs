//! Per-page replicated document.
//!
//! Each page file has one [`CrdtDoc`]: a map of live blocks, explicit
//! children ordering per parent, a tombstone set for removed ids, and a
//! Lamport clock per actor. Mutations are expressed as deltas of upsert and
//! remove operations stamped with [`LamportTimestamp`]s; applying the same
//! set of deltas to any two replicas, in any order and any batching, yields
//! an identical document.
//!
//! Conflict rules:
//! - last writer wins per block, in `(time, actor)` order
//! - a tombstone at an equal-or-newer timestamp drops an incoming upsert,
//!   so deletes are never undone by stale edits
//! - an update newer than an incoming remove keeps the block alive
//! - removing a block removes its whole live subtree, every descendant
//!   tombstoned at the root removal's timestamp

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::ParsedPage;
use crate::types::{block_key, parent_key};

/// Actor id stamped on blocks bootstrapped from a plain file parse. Any real
/// actor's first edit supersedes it.
pub const ORIGIN_ACTOR: &str = "origin";

/// Logical timestamp ordering operations across actors without a shared
/// clock. Comparison is lexicographic on `(time, actor)`; the actor string
/// breaks ties so every replica picks the same winner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LamportTimestamp {
    pub time: u64,
    pub actor: String,
}

impl LamportTimestamp {
    pub fn new(time: u64, actor: impl Into<String>) -> Self {
        Self { time, actor: actor.into() }
    }

    /// The sentinel timestamp given to blocks loaded from a plain file.
    pub fn origin() -> Self {
        Self::new(0, ORIGIN_ACTOR)
    }
}

/// Live state of one block inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub id: String,
    pub text: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(rename = "lastUpdate")]
    pub last_update: LamportTimestamp,
}

/// Requested content of a block in an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    pub id: String,
    pub text: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    /// Requested position among the parent's children. `None` appends, `0`
    /// inserts at the front, anything past the end appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// A change requested by a local caller, before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockChange {
    Upsert { block: BlockContent },
    Remove { id: String },
}

/// A stamped operation, ready to apply on any replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CrdtOperation {
    Upsert {
        block: BlockContent,
        timestamp: LamportTimestamp,
    },
    Remove {
        id: String,
        timestamp: LamportTimestamp,
    },
}

impl CrdtOperation {
    fn timestamp(&self) -> &LamportTimestamp {
        match self {
            CrdtOperation::Upsert { timestamp, .. } => timestamp,
            CrdtOperation::Remove { timestamp, .. } => timestamp,
        }
    }
}

/// A batch of operations issued by one actor, plus the issuing document's
/// clock snapshot after stamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrdtDelta {
    pub actor: String,
    #[serde(rename = "docPath")]
    pub doc_path: String,
    pub operations: Vec<CrdtOperation>,
    pub clock: BTreeMap<String, u64>,
}

/// One page's replicated document. Serializes directly as the on-disk JSON
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrdtDoc {
    #[serde(rename = "pageId")]
    pub page_id: String,
    pub title: String,
    /// Backing file path, relative to the graph root. Doubles as the
    /// document identity.
    pub path: String,
    pub blocks: BTreeMap<String, BlockState>,
    /// Ordered child ids per parent key (`page:<id>` for the root,
    /// `block:<id>` otherwise). An id appears in at most one list.
    pub children: BTreeMap<String, Vec<String>>,
    /// Last issued counter per actor; non-decreasing.
    pub clock: BTreeMap<String, u64>,
    /// Removed block id -> timestamp of removal. Disjoint from `blocks`.
    pub tombstones: BTreeMap<String, LamportTimestamp>,
}

impl CrdtDoc {
    /// Create an empty document for a page.
    pub fn new(page_id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        let mut doc = Self {
            page_id: page_id.into(),
            title: title.into(),
            path: path.into(),
            blocks: BTreeMap::new(),
            children: BTreeMap::new(),
            clock: BTreeMap::new(),
            tombstones: BTreeMap::new(),
        };
        doc.children.insert(parent_key(&doc.page_id, None), Vec::new());
        doc
    }

    /// Bootstrap a document from a freshly parsed file. Every block gets the
    /// origin sentinel timestamp.
    pub fn from_parsed(path: &str, parsed: &ParsedPage) -> Self {
        let mut doc = Self::new(parsed.page.id.clone(), parsed.page.title.clone(), path);
        for block in &parsed.blocks {
            doc.blocks.insert(
                block.id.clone(),
                BlockState {
                    id: block.id.clone(),
                    text: block.text.clone(),
                    parent_id: block.parent_id.clone(),
                    last_update: LamportTimestamp::origin(),
                },
            );
            let key = parent_key(&doc.page_id, block.parent_id.as_deref());
            insert_child(doc.children.entry(key).or_default(), &block.id, None);
            doc.children.entry(block_key(&block.id)).or_default();
        }
        doc
    }

    /// Stamp and locally apply a batch of changes, returning the delta to
    /// hand to other replicas. The actor's clock entry advances once per
    /// change, so it is monotonic within an actor.
    pub fn create_delta(&mut self, actor: &str, changes: Vec<BlockChange>) -> CrdtDelta {
        if changes.is_empty() {
            return CrdtDelta {
                actor: actor.to_string(),
                doc_path: self.path.clone(),
                operations: Vec::new(),
                clock: self.clock.clone(),
            };
        }
        let mut operations = Vec::with_capacity(changes.len());
        let mut counter = self.clock.get(actor).copied().unwrap_or(0);
        for change in changes {
            counter += 1;
            let timestamp = LamportTimestamp::new(counter, actor);
            let operation = match change {
                BlockChange::Upsert { block } => CrdtOperation::Upsert { block, timestamp },
                BlockChange::Remove { id } => CrdtOperation::Remove { id, timestamp },
            };
            self.apply_operation(&operation);
            operations.push(operation);
        }
        self.clock.insert(actor.to_string(), counter);
        CrdtDelta {
            actor: actor.to_string(),
            doc_path: self.path.clone(),
            operations,
            clock: self.clock.clone(),
        }
    }

    /// Apply a delta from another replica. Operations are sorted by
    /// timestamp first so out-of-order delivery within a delta is harmless,
    /// then the clock is raised to the pairwise max.
    pub fn apply_delta(&mut self, delta: &CrdtDelta) {
        let mut sorted: Vec<&CrdtOperation> = delta.operations.iter().collect();
        sorted.sort_by(|a, b| a.timestamp().cmp(b.timestamp()));
        for op in sorted {
            self.apply_operation(op);
        }
        for (actor, time) in &delta.clock {
            let current = self.clock.get(actor).copied().unwrap_or(0);
            if *time > current {
                self.clock.insert(actor.clone(), *time);
            }
        }
    }

    fn apply_operation(&mut self, op: &CrdtOperation) {
        match op {
            CrdtOperation::Upsert { block, timestamp } => self.apply_upsert(block, timestamp),
            CrdtOperation::Remove { id, timestamp } => self.apply_remove(id, timestamp),
        }
    }

    fn apply_upsert(&mut self, block: &BlockContent, ts: &LamportTimestamp) {
        if let Some(tombstone) = self.tombstones.get(&block.id) {
            // Remove wins over a stale upsert.
            if ts <= tombstone {
                return;
            }
        }
        let target_key = parent_key(&self.page_id, block.parent_id.as_deref());
        let existing = match self.blocks.get(&block.id) {
            None => {
                self.blocks.insert(
                    block.id.clone(),
                    BlockState {
                        id: block.id.clone(),
                        text: block.text.clone(),
                        parent_id: block.parent_id.clone(),
                        last_update: ts.clone(),
                    },
                );
                insert_child(self.children.entry(target_key).or_default(), &block.id, block.index);
                self.children.entry(block_key(&block.id)).or_default();
                self.tombstones.remove(&block.id);
                return;
            }
            Some(existing) => existing.clone(),
        };
        if ts < &existing.last_update {
            return;
        }
        if existing.parent_id != block.parent_id {
            let prev_key = parent_key(&self.page_id, existing.parent_id.as_deref());
            if let Some(list) = self.children.get_mut(&prev_key) {
                remove_child(list, &block.id);
            }
        }
        if let Some(state) = self.blocks.get_mut(&block.id) {
            state.text = block.text.clone();
            state.parent_id = block.parent_id.clone();
            state.last_update = ts.clone();
        }
        insert_child(self.children.entry(target_key).or_default(), &block.id, block.index);
        self.tombstones.remove(&block.id);
    }

    fn apply_remove(&mut self, id: &str, ts: &LamportTimestamp) {
        if let Some(tombstone) = self.tombstones.get(id) {
            if ts <= tombstone {
                return;
            }
        }
        if let Some(existing) = self.blocks.get(id) {
            // An update always wins over a stale delete.
            if ts < &existing.last_update {
                return;
            }
        }
        let targets = if self.blocks.contains_key(id) {
            self.live_descendants(id)
        } else {
            vec![id.to_string()]
        };
        for target in targets {
            if let Some(block) = self.blocks.remove(&target) {
                let key = parent_key(&self.page_id, block.parent_id.as_deref());
                if let Some(list) = self.children.get_mut(&key) {
                    remove_child(list, &target);
                }
            }
            self.children.remove(&block_key(&target));
            self.tombstones.insert(target, ts.clone());
        }
    }

    /// A block id plus all of its live descendants, walking the children
    /// lists transitively.
    fn live_descendants(&self, id: &str) -> Vec<String> {
        let mut acc = vec![id.to_string()];
        let mut next = 0;
        while next < acc.len() {
            if let Some(kids) = self.children.get(&block_key(&acc[next])) {
                acc.extend(kids.iter().cloned());
            }
            next += 1;
        }
        acc
    }

    /// Whether an id is currently tombstoned.
    pub fn is_tombstoned(&self, id: &str) -> bool {
        self.tombstones.contains_key(id)
    }

    /// Look up a live block.
    pub fn get_block(&self, id: &str) -> Option<&BlockState> {
        self.blocks.get(id)
    }

    /// Render the document as outline Markdown: depth-first over the
    /// children lists from the page root, every block with an explicit id.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![format!("title:: {}", self.title)];
        self.emit(&parent_key(&self.page_id, None), 0, &mut lines);
        lines.join("\n")
    }

    fn emit(&self, parent: &str, depth: usize, lines: &mut Vec<String>) {
        let Some(children) = self.children.get(parent) else {
            return;
        };
        for id in children {
            let Some(block) = self.blocks.get(id) else {
                continue;
            };
            let prefix = "  ".repeat(depth);
            if block.text.is_empty() {
                lines.push(format!("{prefix}- id:: {id}"));
            } else {
                lines.push(format!("{prefix}- id:: {id} {}", block.text));
            }
            self.emit(&block_key(id), depth + 1, lines);
        }
    }
}

fn remove_child(list: &mut Vec<String>, id: &str) {
    if let Some(pos) = list.iter().position(|c| c == id) {
        list.remove(pos);
    }
}

/// Insert an id into a children list at the requested position, moving it if
/// already present. `None` appends; `0` goes to the front; past-the-end
/// appends.
fn insert_child(list: &mut Vec<String>, id: &str, index: Option<usize>) {
    remove_child(list, id);
    match index {
        None => list.push(id.to_string()),
        Some(i) if i >= list.len() => list.push(id.to_string()),
        Some(i) => list.insert(i, id.to_string()),
    }
}
