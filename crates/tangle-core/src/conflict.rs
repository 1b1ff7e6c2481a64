//! Divergence detection for the watch path.
//!
//! When a file changes on disk while a parsed snapshot is held in memory,
//! the two versions are compared block by block. Any id present in both with
//! differing text is a conflict. The default resolution keeps the freshly
//! parsed version ("theirs"), but the conflict is surfaced to the caller
//! first so a different policy (for example the CRDT path) can take over.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::parser::ParsedPage;

/// One block whose text diverged between the held and re-parsed snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConflict {
    pub id: String,
    pub ours: String,
    pub theirs: String,
}

/// All divergent blocks of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub file: String,
    pub blocks: Vec<BlockConflict>,
}

/// Compare two snapshots of the same page. Returns `None` when no block id
/// present in both has different text.
pub fn detect_conflicts(ours: &ParsedPage, theirs: &ParsedPage) -> Option<Conflict> {
    let held: HashMap<&str, &str> = ours
        .blocks
        .iter()
        .map(|b| (b.id.as_str(), b.text.as_str()))
        .collect();
    let blocks: Vec<BlockConflict> = theirs
        .blocks
        .iter()
        .filter_map(|b| match held.get(b.id.as_str()) {
            Some(prev) if *prev != b.text => Some(BlockConflict {
                id: b.id.clone(),
                ours: (*prev).to_string(),
                theirs: b.text.clone(),
            }),
            _ => None,
        })
        .collect();
    if blocks.is_empty() {
        None
    } else {
        Some(Conflict { file: theirs.page.path.clone(), blocks })
    }
}

/// Default resolution policy: the freshly parsed version wins wholesale.
pub fn resolve_theirs(_ours: &ParsedPage, theirs: ParsedPage) -> ParsedPage {
    theirs
}
