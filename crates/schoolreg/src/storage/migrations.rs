//! Schema versioning for the schoolreg database.
//!
//! The version lives in the metadata table. Each pending script from
//! [`MIGRATIONS`] runs in its own transaction together with the version bump.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, MIGRATIONS};

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// The schema version a fully migrated database reports.
#[must_use]
pub fn current_version() -> i32 {
    i32::try_from(MIGRATIONS.len()).unwrap_or(i32::MAX)
}

/// Bring the schema up to [`current_version`].
///
/// # Errors
///
/// Returns an error if the stored version is unreadable, newer than this
/// build understands, or a migration script fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let from = schema_version(conn)?;
    let target = current_version();
    if from > target {
        return Err(Error::DatabaseMigration {
            message: format!("database schema {from} is newer than supported {target}"),
        });
    }

    for version in (from + 1)..=target {
        apply(conn, version)?;
    }
    Ok(())
}

/// Read the stored schema version; 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

/// Run the script for `version` and record it.
fn apply(conn: &Connection, version: i32) -> Result<()> {
    let script = usize::try_from(version - 1)
        .ok()
        .and_then(|index| MIGRATIONS.get(index))
        .ok_or_else(|| Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        })?;

    debug!("Applying schema migration {}", version);
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(script)?;
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}
