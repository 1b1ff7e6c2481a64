//! Shared data model for the outline graph.
//!
//! A graph is a directory of outline files. Each file backs exactly one
//! [`Page`], and each page is an ordered tree of [`Block`]s. Links between
//! pages and blocks are derived from block text, never stored separately, so
//! every index over them is rebuildable from the files alone.

use serde::{Deserialize, Serialize};

/// Key prefix for page-level targets and root child lists.
pub const PAGE_PREFIX: &str = "page:";
/// Key prefix for block-level targets and child lists.
pub const BLOCK_PREFIX: &str = "block:";

/// One graph node backed by exactly one file, identified by its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Identity of the page; equal to its title.
    pub id: String,
    /// Display title, from a `title::` property or the file name.
    pub title: String,
    /// Path of the backing file, relative to the graph root.
    pub path: String,
}

/// An inline reference extracted from block text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Link {
    /// `[[Some Page]]` reference to a page title.
    Page { page: String },
    /// `((block-id))` reference to a block id.
    Block {
        #[serde(rename = "blockId")]
        block_id: String,
    },
}

impl Link {
    /// Index key for the link target: `page:<title>` or `block:<id>`.
    pub fn target_key(&self) -> String {
        match self {
            Link::Page { page } => format!("{PAGE_PREFIX}{page}"),
            Link::Block { block_id } => format!("{BLOCK_PREFIX}{block_id}"),
        }
    }
}

/// One outline node within a page.
///
/// Sibling order is positional (the order blocks appear in parse output and
/// in children lists), not a field on the block itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable id, either declared with `id::` in source or synthesized as
    /// `<file-stem>-<n>` on first parse.
    pub id: String,
    /// Title of the owning page.
    #[serde(rename = "pageId")]
    pub page_id: String,
    /// Parent block id, or `None` for a top-level block. A non-null parent
    /// always belongs to the same page.
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    /// Trimmed body text.
    pub text: String,
    /// All links extracted from the text: every page link, then every
    /// block link.
    pub links: Vec<Link>,
}

/// Derived record: some block references the keyed page or block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlink {
    /// Page the referencing block lives on.
    #[serde(rename = "sourcePage")]
    pub source_page: String,
    /// The referencing block, when known.
    #[serde(rename = "sourceBlockId", default, skip_serializing_if = "Option::is_none")]
    pub source_block_id: Option<String>,
}

/// Result of a substring search over the read index or sidecar index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Pages whose title contains the query (case-insensitive).
    pub pages: Vec<Page>,
    /// Blocks whose text contains the query (case-insensitive).
    pub blocks: Vec<Block>,
}

/// Children-list / backlink key for a parent: the page root for top-level
/// blocks, otherwise the parent block.
pub fn parent_key(page_id: &str, parent_id: Option<&str>) -> String {
    match parent_id {
        Some(id) => format!("{BLOCK_PREFIX}{id}"),
        None => format!("{PAGE_PREFIX}{page_id}"),
    }
}

/// Children-list key for a block's own children.
pub fn block_key(id: &str) -> String {
    format!("{BLOCK_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_target_keys() {
        let page = Link::Page { page: "Alpha".into() };
        let block = Link::Block { block_id: "b-1".into() };
        assert_eq!(page.target_key(), "page:Alpha");
        assert_eq!(block.target_key(), "block:b-1");
    }

    #[test]
    fn parent_key_distinguishes_roots() {
        assert_eq!(parent_key("Alpha", None), "page:Alpha");
        assert_eq!(parent_key("Alpha", Some("b-1")), "block:b-1");
    }
}
