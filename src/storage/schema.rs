//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One live capture per (source, local-id)
CREATE TABLE IF NOT EXISTS raw_captures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    local_id TEXT NOT NULL,
    url TEXT NOT NULL,
    text TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    processed_at TEXT,
    UNIQUE(source, local_id)
);

CREATE INDEX IF NOT EXISTS idx_raw_captures_pending ON raw_captures(source, processed_at);

-- Catalog items keyed by normalized (source, local-id)
CREATE TABLE IF NOT EXISTS catalog_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    local_id TEXT NOT NULL,
    title TEXT,
    description TEXT,
    release_date TEXT,
    duration_minutes INTEGER,
    cover_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(source, local_id)
);

CREATE INDEX IF NOT EXISTS idx_catalog_items_source ON catalog_items(source);

-- Performers keyed by normalized display name, compared case-insensitively
CREATE TABLE IF NOT EXISTS performers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    reading TEXT,
    birth_date TEXT,
    height_cm INTEGER,
    blood_type TEXT,
    birthplace TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS performer_aliases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    performer_id INTEGER NOT NULL REFERENCES performers(id),
    alias TEXT NOT NULL,
    source TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    UNIQUE(performer_id, alias)
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS item_performers (
    item_id INTEGER NOT NULL REFERENCES catalog_items(id),
    performer_id INTEGER NOT NULL REFERENCES performers(id),
    PRIMARY KEY(item_id, performer_id)
);

CREATE INDEX IF NOT EXISTS idx_item_performers_performer ON item_performers(performer_id);

CREATE TABLE IF NOT EXISTS item_tags (
    item_id INTEGER NOT NULL REFERENCES catalog_items(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY(item_id, tag_id)
);

CREATE TABLE IF NOT EXISTS media_assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES catalog_items(id),
    url TEXT NOT NULL,
    kind TEXT NOT NULL,
    display_order INTEGER NOT NULL,
    origin TEXT NOT NULL,
    UNIQUE(item_id, url)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
