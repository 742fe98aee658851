//! Audit log entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditType {
    /// A user logged in.
    Login,
    /// A user logged out.
    Logout,
    /// A school was created, edited or deleted.
    School,
    /// A registration was created, edited or deleted.
    Registration,
    /// A fee setting changed.
    FeeChange,
    /// A report was exported.
    Export,
    /// A bulk import or bulk status update ran.
    BulkUpload,
    /// Housekeeping performed by the system itself.
    System,
}

impl AuditType {
    /// All types in display order.
    pub const ALL: [Self; 8] = [
        Self::Login,
        Self::Logout,
        Self::School,
        Self::Registration,
        Self::FeeChange,
        Self::Export,
        Self::BulkUpload,
        Self::System,
    ];

    /// The stored name of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::School => "school",
            Self::Registration => "registration",
            Self::FeeChange => "fee_change",
            Self::Export => "export",
            Self::BulkUpload => "bulk_upload",
            Self::System => "system",
        }
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::invalid_value("audit type", s))
    }
}

/// One immutable entry in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// What kind of action was recorded.
    #[serde(rename = "type")]
    pub kind: AuditType,
    /// Human-readable description.
    pub description: String,
    /// Who performed the action.
    pub user: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Record an action happening now.
    #[must_use]
    pub fn new(kind: AuditType, description: impl Into<String>, user: impl Into<String>) -> Self {
        Self::at(kind, description, user, Utc::now())
    }

    /// Record an action at an explicit time.
    #[must_use]
    pub fn at(
        kind: AuditType,
        description: impl Into<String>,
        user: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            user: user.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(AuditType::FeeChange.to_string(), "fee_change");
        assert_eq!(AuditType::BulkUpload.to_string(), "bulk_upload");
    }

    #[test]
    fn test_type_parse_accepts_dashes() {
        assert_eq!("fee-change".parse::<AuditType>().unwrap(), AuditType::FeeChange);
        assert_eq!("LOGIN".parse::<AuditType>().unwrap(), AuditType::Login);
        assert!("shutdown".parse::<AuditType>().is_err());
    }

    #[test]
    fn test_entry_serializes_type_key() {
        let entry = AuditLogEntry::new(AuditType::Export, "Exported schools report", "admin");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "export");
        assert_eq!(json["user"], "admin");
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = AuditLogEntry::new(AuditType::System, "Sample data initialized", "system");
        let text = serde_json::to_string(&entry).unwrap();
        let back: AuditLogEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(entry, back);
    }
}
