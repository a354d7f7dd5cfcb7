//! SQLite schema for the local item index

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Everything is guarded with IF NOT EXISTS so concurrent first opens from
/// multiple processes cannot corrupt the schema; only the first opener
/// actually applies it.
const SCHEMA_SQL: &str = r#"
-- Sync bookkeeping (singleton row)
CREATE TABLE IF NOT EXISTS syncinfo (
    id          INTEGER PRIMARY KEY CHECK (id = 0),
    last_sync   INTEGER NOT NULL DEFAULT 0,
    version     INTEGER NOT NULL DEFAULT 0
);

-- Item summaries mirrored from the remote library
CREATE TABLE IF NOT EXISTS items (
    key         TEXT PRIMARY KEY,
    creator     TEXT,
    title       TEXT NOT NULL,
    abstract    TEXT,
    date        TEXT,
    citekey     TEXT
);

-- Full-text search over the item table (external content)
CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
    key, creator, title, abstract, date, citekey,
    content='items', content_rowid='rowid',
    tokenize='porter unicode61'
);

-- Keep the FTS index transactionally in lockstep with the item table: every
-- row change deletes and regenerates its search entry.
CREATE TRIGGER IF NOT EXISTS items_ai AFTER INSERT ON items BEGIN
    INSERT INTO items_fts(rowid, key, creator, title, abstract, date, citekey)
        VALUES (new.rowid, new.key, new.creator, new.title, new.abstract, new.date, new.citekey);
END;
CREATE TRIGGER IF NOT EXISTS items_ad AFTER DELETE ON items BEGIN
    INSERT INTO items_fts(items_fts, rowid, key, creator, title, abstract, date, citekey)
        VALUES ('delete', old.rowid, old.key, old.creator, old.title, old.abstract, old.date, old.citekey);
END;
CREATE TRIGGER IF NOT EXISTS items_au AFTER UPDATE ON items BEGIN
    INSERT INTO items_fts(items_fts, rowid, key, creator, title, abstract, date, citekey)
        VALUES ('delete', old.rowid, old.key, old.creator, old.title, old.abstract, old.date, old.citekey);
    INSERT INTO items_fts(rowid, key, creator, title, abstract, date, citekey)
        VALUES (new.rowid, new.key, new.creator, new.title, new.abstract, new.date, new.citekey);
END;

-- Index metadata
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    // Older data stays readable by newer code; additions bump this row.
    conn.execute(
        "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('schema_version', ?1)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}
