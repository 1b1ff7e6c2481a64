//! In-memory read index over the whole graph.
//!
//! Built by scanning every outline file under a root, parsing each, and
//! populating four mappings: page by title, block by id, children by parent
//! key, and backlinks by target key. The index is a rebuildable cache; a
//! rebuild is always a full re-scan, incremental updates belong to the
//! store's indexer.
//!
//! Insertion order is preserved so listings and search results come back in
//! index order, matching the order files were scanned.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::parser::{parse_page, ParsedPage};
use crate::traits::FsAdapter;
use crate::types::{block_key, parent_key, Backlink, Block, Page, SearchResult};

/// The four read-side mappings plus insertion-order bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct GraphIndex {
    pages_by_title: HashMap<String, Page>,
    page_order: Vec<String>,
    blocks_by_id: HashMap<String, Block>,
    block_order: Vec<String>,
    children_by_parent: HashMap<String, Vec<String>>,
    backlinks: HashMap<String, Vec<Backlink>>,
}

impl GraphIndex {
    /// Build an index from already-parsed pages.
    pub fn from_parsed(pages: impl IntoIterator<Item = ParsedPage>) -> Self {
        let mut idx = Self::default();
        for parsed in pages {
            idx.add_parsed(parsed);
        }
        idx
    }

    /// Scan all `.md` files under `root` through the adapter and build the
    /// index from scratch.
    pub async fn build(root: &Path, adapter: &dyn FsAdapter) -> Result<Self> {
        let mut idx = Self::default();
        let mut scanned = 0usize;
        for rel in adapter.list_files(root).await? {
            if rel.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let content = adapter.read_file(&root.join(&rel)).await?;
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            idx.add_parsed(parse_page(&rel_str, &content));
            scanned += 1;
        }
        debug!(pages = scanned, "built read index");
        Ok(idx)
    }

    fn add_parsed(&mut self, parsed: ParsedPage) {
        let title = parsed.page.title.clone();
        if !self.pages_by_title.contains_key(&title) {
            self.page_order.push(title.clone());
        }
        self.pages_by_title.insert(title.clone(), parsed.page);
        self.children_by_parent.entry(parent_key(&title, None)).or_default();
        for block in parsed.blocks {
            let key = parent_key(&block.page_id, block.parent_id.as_deref());
            self.children_by_parent.entry(key).or_default().push(block.id.clone());
            for link in &block.links {
                self.backlinks.entry(link.target_key()).or_default().push(Backlink {
                    source_page: block.page_id.clone(),
                    source_block_id: Some(block.id.clone()),
                });
            }
            if !self.blocks_by_id.contains_key(&block.id) {
                self.block_order.push(block.id.clone());
            }
            self.blocks_by_id.insert(block.id.clone(), block);
        }
    }

    /// Point lookup of a page by id (its title).
    pub fn get_page(&self, id: &str) -> Result<&Page> {
        self.pages_by_title
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("page {id} not found")))
    }

    /// Point lookup of a page by title. Titles are page ids, so this is an
    /// alias for [`GraphIndex::get_page`].
    pub fn get_page_by_title(&self, title: &str) -> Result<&Page> {
        self.get_page(title)
    }

    /// All pages, in scan order.
    pub fn list_pages(&self) -> Vec<&Page> {
        self.page_order
            .iter()
            .filter_map(|t| self.pages_by_title.get(t))
            .collect()
    }

    /// Point lookup of a block by id.
    pub fn get_block(&self, id: &str) -> Result<&Block> {
        self.blocks_by_id
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("block {id} not found")))
    }

    /// Top-level blocks of a page, in sibling order.
    pub fn list_page_blocks(&self, page_id: &str) -> Vec<&Block> {
        self.children_of(&parent_key(page_id, None))
    }

    /// Children of a block, in sibling order.
    pub fn list_children(&self, block_id: &str) -> Vec<&Block> {
        self.children_of(&block_key(block_id))
    }

    fn children_of(&self, key: &str) -> Vec<&Block> {
        self.children_by_parent
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.blocks_by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Backlinks pointing at a page title.
    pub fn backlinks_to_page(&self, title: &str) -> &[Backlink] {
        self.backlinks_of(&format!("page:{title}"))
    }

    /// Backlinks pointing at a block id.
    pub fn backlinks_to_block(&self, id: &str) -> &[Backlink] {
        self.backlinks_of(&format!("block:{id}"))
    }

    fn backlinks_of(&self, key: &str) -> &[Backlink] {
        self.backlinks.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Case-insensitive substring search over page titles and block text.
    /// No ranking; every match in index order.
    pub fn search(&self, query: &str) -> SearchResult {
        let needle = query.to_lowercase();
        let pages = self
            .page_order
            .iter()
            .filter_map(|t| self.pages_by_title.get(t))
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let blocks = self
            .block_order
            .iter()
            .filter_map(|id| self.blocks_by_id.get(id))
            .filter(|b| b.text.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        SearchResult { pages, blocks }
    }
}
