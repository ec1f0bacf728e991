//! Key-value persistence for the four replicated collections.
//!
//! Each collection is a table of `(id, payload)` rows holding serialized
//! JSON. The flush path diffs current ids against stored keys, deletes the
//! removed ones, and bulk-upserts everything else inside one transaction so
//! a crash mid-flush cannot leave the collections in a mixed state.

use std::collections::HashSet;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::errors::StoreError;
use crate::types::sync::StateSnapshot;

/// Key under which the timestamp of the last successful sync is recorded.
pub const LAST_LOCAL_UPDATE_KEY: &str = "last_local_update";

/// Collection persistence backed by a SQLite connection.
pub struct CollectionStore<'a> {
    conn: &'a Connection,
}

impl<'a> CollectionStore<'a> {
    /// Creates a new `CollectionStore` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Loads all four collections into a snapshot.
    pub fn load_snapshot(&self) -> Result<StateSnapshot, StoreError> {
        Ok(StateSnapshot {
            bookmarks: self.load_table("bookmarks")?,
            folders: self.load_table("folders")?,
            tags: self.load_table("tags")?,
            trash: self.load_table("trash")?,
        })
    }

    /// Writes the snapshot to disk: per collection, removed ids are
    /// deleted and all current items are upserted. Upserting unchanged
    /// items is idempotent, so no per-item change tracking is needed.
    ///
    /// The whole pass runs in a single multi-table transaction.
    pub fn flush(&self, snapshot: &StateSnapshot) -> Result<(), StoreError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        Self::flush_table(&tx, "bookmarks", &snapshot.bookmarks, |b| &b.id)?;
        Self::flush_table(&tx, "folders", &snapshot.folders, |f| &f.id)?;
        Self::flush_table(&tx, "tags", &snapshot.tags, |t| &t.id)?;
        Self::flush_table(&tx, "trash", &snapshot.trash, |t| &t.id)?;

        tx.commit()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    /// Reads an integer value from the sync metadata table.
    pub fn kv_get_i64(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM sync_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::DatabaseError(other.to_string())),
            })?;
        match value {
            Some(v) => v
                .parse::<i64>()
                .map(Some)
                .map_err(|e| StoreError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    /// Writes an integer value to the sync metadata table.
    pub fn kv_set_i64(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO sync_meta (key, value) VALUES (?1, ?2)",
                params![key, value.to_string()],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Number of rows currently stored for a collection table.
    pub fn count(&self, table: &str) -> Result<i64, StoreError> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn load_table<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT payload FROM {} ORDER BY rowid", table))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            let payload = row.map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            let item = serde_json::from_str(&payload)
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;
            items.push(item);
        }
        Ok(items)
    }

    fn flush_table<T, F>(
        conn: &Connection,
        table: &str,
        items: &[T],
        key_of: F,
    ) -> Result<(), StoreError>
    where
        T: Serialize,
        F: Fn(&T) -> &str,
    {
        let mut stmt = conn
            .prepare(&format!("SELECT id FROM {}", table))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        let stored: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let current: HashSet<&str> = items.iter().map(|i| key_of(i)).collect();

        for stale in stored.iter().filter(|id| !current.contains(id.as_str())) {
            conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![stale])
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }

        for item in items {
            let payload = serde_json::to_string(item)
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;
            conn.execute(
                &format!("INSERT OR REPLACE INTO {} (id, payload) VALUES (?1, ?2)", table),
                params![key_of(item), payload],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }
}
