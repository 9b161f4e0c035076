//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Burrow database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    visited_count INTEGER NOT NULL DEFAULT 0,
    persisted_count INTEGER NOT NULL DEFAULT 0
);

-- One row per successfully fetched address; url uniqueness is the
-- cross-run dedup guarantee
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    parent_url TEXT,
    html TEXT NOT NULL,
    html_length INTEGER NOT NULL,
    title TEXT,
    headings TEXT NOT NULL,
    paragraphs TEXT NOT NULL,
    meta_description TEXT,
    links TEXT NOT NULL,
    links_count INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    status_code INTEGER NOT NULL,
    scraped_at TEXT NOT NULL,
    content_type TEXT NOT NULL,
    worker TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_depth ON pages(depth);
CREATE INDEX IF NOT EXISTS idx_pages_worker ON pages(worker);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
