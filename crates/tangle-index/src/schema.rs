//! Sidecar index schema.

use rusqlite::Connection;

use crate::error::Result;

/// Create all tables and indexes if they do not exist yet.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS pages (
            title TEXT PRIMARY KEY,
            path  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS blocks (
            id        TEXT PRIMARY KEY,
            page_id   TEXT NOT NULL,
            parent_id TEXT,
            text      TEXT NOT NULL,
            links     TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_blocks_page ON blocks(page_id);

        CREATE TABLE IF NOT EXISTS backlinks (
            target_key      TEXT NOT NULL,
            source_page     TEXT NOT NULL,
            source_block_id TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_backlinks_target ON backlinks(target_key);
        "#,
    )?;
    Ok(())
}
