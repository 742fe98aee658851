//! Filtered views over the audit log.

use chrono::{DateTime, Utc};

use crate::model::{AuditLogEntry, AuditType};

/// Criteria for viewing the audit log. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Only entries of this type.
    pub kind: Option<AuditType>,
    /// Case-insensitive substring of the acting user.
    pub user: Option<String>,
    /// Earliest timestamp included.
    pub from: Option<DateTime<Utc>>,
    /// Latest timestamp included.
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Whether `entry` passes every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.kind.map_or(true, |kind| entry.kind == kind)
            && self.user.as_deref().map_or(true, |user| {
                entry.user.to_lowercase().contains(&user.to_lowercase())
            })
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp <= to)
    }

    /// Matching entries, newest first. The log itself is left untouched.
    #[must_use]
    pub fn apply<'a>(&self, log: &'a [AuditLogEntry]) -> Vec<&'a AuditLogEntry> {
        let mut entries: Vec<&AuditLogEntry> = log.iter().filter(|e| self.matches(e)).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }
}
