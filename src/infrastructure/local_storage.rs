//! Local SQLite storage for the durable key-value slots.
//!
//! Holds the persisted quote list and the selected filter so they survive
//! restarts.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{AppError, Result};

use super::kv_store::KeyValueStore;

/// Durable key-value repository using SQLite.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Opens or creates the local storage database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::database)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(AppError::database)?;

        let storage = Self { conn };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Opens a throwaway in-memory database.
    ///
    /// # Errors
    /// Returns error if schema creation fails.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::database)?;
        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
            )
            .map_err(AppError::database)?;

        Ok(())
    }

    /// List stored keys in name order.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store ORDER BY key")
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(AppError::database)?;

        let mut keys = Vec::new();
        for row in rows {
            match row {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!("Failed to read row: {}", e),
            }
        }

        Ok(keys)
    }

    /// Get total storage size in bytes.
    ///
    /// # Errors
    /// Returns error if the database file metadata cannot be read.
    pub fn storage_size(&self) -> Result<u64> {
        let path = match self.conn.path() {
            Some(p) if !p.is_empty() => Path::new(p),
            _ => return Ok(0),
        };
        let metadata = std::fs::metadata(path)
            .map_err(|e| AppError::io("Failed to get storage size", e))?;
        Ok(metadata.len())
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::database)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r"
            INSERT INTO kv_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            ",
                params![key, value],
            )
            .map_err(AppError::database)?;

        tracing::trace!(key, bytes = value.len(), "Slot written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(AppError::database)?;
        Ok(())
    }
}
