//! Item upsert and full-text search

use chrono::Utc;
use rusqlite::{params, Row};

use crate::error::{Result, ZotError};
use crate::records::Item;

use super::SearchIndex;

const UPSERT_ITEM_SQL: &str = "\
    INSERT INTO items (key, creator, title, abstract, date, citekey)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(key) DO UPDATE SET
        creator = excluded.creator,
        title = excluded.title,
        abstract = excluded.abstract,
        date = excluded.date,
        citekey = excluded.citekey";

const ADVANCE_SYNC_SQL: &str = "\
    INSERT INTO syncinfo (id, last_sync, version) VALUES (0, ?1, ?2)
    ON CONFLICT(id) DO UPDATE SET
        last_sync = excluded.last_sync,
        version = excluded.version";

const SEARCH_SQL: &str = "\
    SELECT i.key, i.creator, i.title, i.abstract, i.date, i.citekey
    FROM items_fts
    JOIN items i ON i.rowid = items_fts.rowid
    WHERE items_fts MATCH ?1
    ORDER BY rank
    LIMIT ?2";

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        key: row.get(0)?,
        creator: row.get(1)?,
        title: row.get(2)?,
        abstract_text: row.get(3)?,
        date: row.get(4)?,
        citekey: row.get(5)?,
    })
}

impl SearchIndex {
    /// Apply an item batch and advance the sync watermark in one transaction.
    ///
    /// Items replace existing rows with the same `key` (last write wins);
    /// a citekey moving between items is cleared from its previous holder.
    /// A crash mid-way leaves the previous consistent state, so the next
    /// incremental fetch retries the same delta instead of skipping it.
    pub fn upsert_and_advance(&self, items: &[Item], new_version: i64) -> Result<()> {
        let now = Utc::now().timestamp();
        let tx = self
            .connection()
            .unchecked_transaction()
            .map_err(|e| ZotError::index_operation("start transaction", e))?;

        for item in items {
            if let Some(citekey) = &item.citekey {
                tx.execute(
                    "UPDATE items SET citekey = NULL WHERE citekey = ?1 AND key <> ?2",
                    params![citekey, item.key],
                )
                .map_err(|e| ZotError::index_operation("reassign citekey", e))?;
            }
            tx.execute(
                UPSERT_ITEM_SQL,
                params![
                    item.key,
                    item.creator,
                    item.title,
                    item.abstract_text,
                    item.date,
                    item.citekey,
                ],
            )
            .map_err(|e| {
                ZotError::Index(format!("failed to upsert item {}: {}", item.key, e))
            })?;
        }

        tx.execute(ADVANCE_SYNC_SQL, params![now, new_version])
            .map_err(|e| ZotError::index_operation("advance sync state", e))?;

        tx.commit()
            .map_err(|e| ZotError::index_operation("commit transaction", e))
    }

    /// Full-text search over creator, title, abstract, date, and citekey.
    ///
    /// `query` is an FTS5 match expression; results come back in the store's
    /// relevance order, capped at `limit` (unbounded when absent). An empty
    /// or whitespace-only query is a usage error, not a full scan.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Item>> {
        if query.trim().is_empty() {
            return Err(ZotError::EmptyQuery);
        }

        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self
            .connection()
            .prepare(SEARCH_SQL)
            .map_err(|e| ZotError::index_operation("prepare search", e))?;
        let rows = stmt
            .query_map(params![query, limit], item_from_row)
            .map_err(|e| ZotError::Index(format!("search for {:?} failed: {}", query, e)))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| ZotError::Index(format!("search for {:?} failed: {}", query, e)))
    }

    /// Exact lookup by item key.
    pub fn get(&self, key: &str) -> Result<Option<Item>> {
        use rusqlite::OptionalExtension;
        self.connection()
            .query_row(
                "SELECT key, creator, title, abstract, date, citekey FROM items WHERE key = ?1",
                params![key],
                item_from_row,
            )
            .optional()
            .map_err(|e| ZotError::Index(format!("failed to read item {}: {}", key, e)))
    }
}
