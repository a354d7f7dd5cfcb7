//! Local search index backed by SQLite
//!
//! A durable cache of item summaries plus sync bookkeeping, with FTS5
//! full-text lookup. Writers from multiple processes serialize through
//! SQLite's own transaction mechanism; no application-level locking.

mod items;
mod schema;

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, ZotError};
use crate::records::SyncState;

pub use schema::CURRENT_SCHEMA_VERSION;

/// Local full-text search index for library items.
#[derive(Debug)]
pub struct SearchIndex {
    conn: Connection,
}

impl SearchIndex {
    /// Open or create the index at the given path.
    ///
    /// Idempotent: creates the schema when absent, otherwise attaches to the
    /// existing store.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            ZotError::Index(format!(
                "failed to open index at {}: {}",
                path.display(),
                e
            ))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| ZotError::Index(format!("failed to enable WAL mode: {}", e)))?;

        schema::create_schema(&conn)
            .map_err(|e| ZotError::Index(format!("failed to create index schema: {}", e)))?;

        Ok(SearchIndex { conn })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Epoch timestamp of the last successful index update, 0 if never synced.
    pub fn last_sync_epoch(&self) -> Result<i64> {
        let epoch = self
            .conn
            .query_row("SELECT last_sync FROM syncinfo WHERE id = 0", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| ZotError::index_operation("read last sync time", e))?;
        Ok(epoch.unwrap_or(0))
    }

    /// Highest remote library version fully reflected in the index, 0 if
    /// never synced.
    pub fn library_version(&self) -> Result<i64> {
        let version = self
            .conn
            .query_row("SELECT version FROM syncinfo WHERE id = 0", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| ZotError::index_operation("read library version", e))?;
        Ok(version.unwrap_or(0))
    }

    pub fn sync_state(&self) -> Result<SyncState> {
        Ok(SyncState {
            last_sync_epoch: self.last_sync_epoch()?,
            library_version: self.library_version()?,
        })
    }

    pub fn item_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .map_err(|e| ZotError::index_operation("count items", e))
    }
}
