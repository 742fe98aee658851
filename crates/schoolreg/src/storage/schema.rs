//! `SQLite` schema and key names for schoolreg.
//!
//! The database is a plain key-value table: each fixed key holds one JSON
//! document (a collection, the fee settings or the session).

/// Key holding the logged-in user.
pub const KEY_CURRENT_USER: &str = "currentUser";

/// Key holding the school collection.
pub const KEY_SCHOOLS: &str = "schools";

/// Key holding the registration collection.
pub const KEY_REGISTRATIONS: &str = "registrations";

/// Key holding the fee settings record.
pub const KEY_FEE_SETTINGS: &str = "feeSettings";

/// Key holding the audit log.
pub const KEY_AUDIT_LOGS: &str = "auditLogs";

/// Key holding the fee change history.
pub const KEY_FEE_HISTORY: &str = "feeHistory";

/// Every key written when the dataset is saved.
pub const DATASET_KEYS: &[&str] = &[
    KEY_SCHOOLS,
    KEY_REGISTRATIONS,
    KEY_FEE_SETTINGS,
    KEY_AUDIT_LOGS,
    KEY_FEE_HISTORY,
];

/// SQL statement to create the metadata table holding the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the key-value entries table.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Migration scripts; entry `n` brings the schema to version `n + 1`.
pub const MIGRATIONS: &[&str] = &[CREATE_ENTRIES_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_keys_distinct() {
        let mut keys = DATASET_KEYS.to_vec();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), DATASET_KEYS.len());
        assert!(!DATASET_KEYS.contains(&KEY_CURRENT_USER));
    }

    #[test]
    fn test_entries_table_structure() {
        assert!(CREATE_ENTRIES_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_ENTRIES_TABLE.contains("value TEXT NOT NULL"));
    }

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
        for stmt in MIGRATIONS {
            assert!(!stmt.trim().is_empty());
        }
    }
}
