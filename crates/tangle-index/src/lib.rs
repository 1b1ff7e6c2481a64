//! Persisted search and backlink index kept alongside the graph files.
//!
//! The sidecar is a rebuildable cache: pages and blocks are pushed into it
//! by the incremental indexer, and it answers full-text substring search and
//! backlink queries without re-reading the source files. Storage is a single
//! SQLite database under `.graph/`.
//!
//! SQLite allows many readers but one writer, so the connection sits behind
//! a mutex rather than a pool.

pub mod error;
mod schema;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use tangle_core::{Backlink, Block, Link, Page, SearchResult};

pub use error::{IndexError, Result};

/// Handle to the sidecar index database.
#[derive(Clone)]
pub struct SidecarIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SidecarIndex {
    /// Open (or create) the index at the given file path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        schema::migrate(&conn)?;
        debug!(path = %path.display(), "opened sidecar index");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Open a throwaway in-memory index, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Replace a page and all of its blocks and outgoing backlinks.
    pub fn upsert_page(&self, page: &Page, blocks: &[Block]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM blocks WHERE page_id = ?1", params![page.title])?;
        tx.execute("DELETE FROM backlinks WHERE source_page = ?1", params![page.title])?;
        tx.execute(
            "INSERT INTO pages (title, path) VALUES (?1, ?2)
             ON CONFLICT(title) DO UPDATE SET path = excluded.path",
            params![page.title, page.path],
        )?;
        for block in blocks {
            let links = serde_json::to_string(&block.links)?;
            tx.execute(
                "INSERT INTO blocks (id, page_id, parent_id, text, links)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     page_id = excluded.page_id,
                     parent_id = excluded.parent_id,
                     text = excluded.text,
                     links = excluded.links",
                params![block.id, block.page_id, block.parent_id, block.text, links],
            )?;
            for link in &block.links {
                tx.execute(
                    "INSERT INTO backlinks (target_key, source_page, source_block_id)
                     VALUES (?1, ?2, ?3)",
                    params![link.target_key(), block.page_id, block.id],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove a page by title, with its blocks and outgoing backlinks.
    pub fn remove_page(&self, title: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM pages WHERE title = ?1", params![title])?;
        tx.execute("DELETE FROM blocks WHERE page_id = ?1", params![title])?;
        tx.execute("DELETE FROM backlinks WHERE source_page = ?1", params![title])?;
        tx.commit()?;
        Ok(())
    }

    /// Remove whatever page is stored for a file path. Returns the removed
    /// page's title, if one was indexed. Used when a file is deleted and
    /// re-indexed away.
    pub fn remove_path(&self, path: &str) -> Result<Option<String>> {
        let title: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT title FROM pages WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?
        };
        if let Some(ref title) = title {
            self.remove_page(title)?;
        }
        Ok(title)
    }

    /// Case-insensitive substring search over page titles and block text.
    /// All matches, insertion order, no ranking.
    pub fn search(&self, query: &str) -> Result<SearchResult> {
        let conn = self.conn.lock();
        let mut pages = Vec::new();
        let mut stmt = conn.prepare(
            "SELECT title, path FROM pages
             WHERE instr(lower(title), lower(?1)) > 0
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![query], |row| {
            let title: String = row.get(0)?;
            let path: String = row.get(1)?;
            Ok(Page { id: title.clone(), title, path })
        })?;
        for row in rows {
            pages.push(row?);
        }

        let mut blocks = Vec::new();
        let mut stmt = conn.prepare(
            "SELECT id, page_id, parent_id, text, links FROM blocks
             WHERE instr(lower(text), lower(?1)) > 0
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![query], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        for row in rows {
            let (id, page_id, parent_id, text, links) = row?;
            let links: Vec<Link> = serde_json::from_str(&links)?;
            blocks.push(Block { id, page_id, parent_id, text, links });
        }
        Ok(SearchResult { pages, blocks })
    }

    /// All backlinks recorded against a target key (`page:<title>` or
    /// `block:<id>`).
    pub fn backlinks(&self, target_key: &str) -> Result<Vec<Backlink>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT source_page, source_block_id FROM backlinks
             WHERE target_key = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![target_key], |row| {
            Ok(Backlink {
                source_page: row.get(0)?,
                source_block_id: row.get(1)?,
            })
        })?;
        let mut links = Vec::new();
        for row in rows {
            links.push(row?);
        }
        Ok(links)
    }
}
