//! Storage layer for schoolreg.
//!
//! This module provides a `SQLite`-backed key-value store. Each fixed key
//! (see [`schema`]) holds one JSON document.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Key-value storage engine.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw JSON text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Read and decode the value stored under `key`.
    ///
    /// Returns `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored JSON
    /// does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).map_err(|source| Error::CorruptEntry {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    /// Store several pre-encoded values in one transaction.
    ///
    /// Either every entry is written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        self.write(entries, &[])
    }

    /// Store `entries` and delete `removals` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is changed
    /// in that case.
    pub fn write(&self, entries: &[(&str, String)], removals: &[&str]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, raw) in entries {
            Self::upsert(&tx, key, raw)?;
        }
        for key in removals {
            tx.execute("DELETE FROM entries WHERE key = ?1", [key])?;
        }
        tx.commit()?;
        debug!(
            "Stored {} entries and removed {} in one transaction",
            entries.len(),
            removals.len()
        );
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let entries: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        let last_write: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM entries", [], |row| row.get(0))?;
        let last_write = last_write
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            entries,
            last_write,
            db_size_bytes,
        })
    }

    fn upsert(conn: &Connection, key: &str, raw: &str) -> Result<()> {
        conn.execute(
            r"
            INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, raw, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored keys.
    pub entries: i64,
    /// When any key was last written.
    pub last_write: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
