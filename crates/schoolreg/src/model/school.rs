//! Schools taking part in the registration program.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_email, require_text};
use crate::error::{Error, Result};

/// Whether a school currently participates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolStatus {
    /// The school is participating.
    #[default]
    Active,
    /// The school is listed but not participating.
    Inactive,
}

impl SchoolStatus {
    /// The stored and displayed name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SchoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(Error::invalid_value("school status", s)),
        }
    }
}

/// A school record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Identifier, unique among schools.
    pub id: u64,
    /// Display name; bulk registration imports match on it.
    pub name: String,
    /// City and province.
    pub location: String,
    /// Name of the school's program coordinator.
    pub coordinator: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Participation status.
    pub status: SchoolStatus,
    /// When the record was created.
    pub created_date: DateTime<Utc>,
}

impl School {
    /// Whether the school is currently participating.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SchoolStatus::Active
    }
}

/// Field values for a school about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewSchool {
    /// Display name.
    pub name: String,
    /// City and province.
    pub location: String,
    /// Coordinator name.
    pub coordinator: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Initial status.
    pub status: SchoolStatus,
}

impl NewSchool {
    /// Check the values against the school form rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)?;
        require_text("coordinator", &self.coordinator)?;
        require_email("email", &self.email)?;
        require_text("phone", &self.phone)?;
        Ok(())
    }

    /// Build the stored record under the given identifier.
    #[must_use]
    pub fn into_school(self, id: u64, created_date: DateTime<Utc>) -> School {
        School {
            id,
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
            coordinator: self.coordinator.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            status: self.status,
            created_date,
        }
    }
}

/// A partial edit of a school. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchoolUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New coordinator.
    pub coordinator: Option<String>,
    /// New contact email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New status.
    pub status: Option<SchoolStatus>,
}

impl SchoolUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.coordinator.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
    }

    /// Check the supplied values against the school form rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        if let Some(coordinator) = &self.coordinator {
            require_text("coordinator", coordinator)?;
        }
        if let Some(email) = &self.email {
            require_email("email", email)?;
        }
        if let Some(phone) = &self.phone {
            require_text("phone", phone)?;
        }
        Ok(())
    }

    /// Merge the supplied fields into `school`.
    pub fn apply(&self, school: &mut School) {
        if let Some(name) = &self.name {
            school.name = name.trim().to_string();
        }
        if let Some(location) = &self.location {
            school.location = location.trim().to_string();
        }
        if let Some(coordinator) = &self.coordinator {
            school.coordinator = coordinator.trim().to_string();
        }
        if let Some(email) = &self.email {
            school.email = email.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            school.phone = phone.trim().to_string();
        }
        if let Some(status) = self.status {
            school.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_school() -> NewSchool {
        NewSchool {
            name: "Khalsa School".to_string(),
            location: "Surrey, BC".to_string(),
            coordinator: "Preet Kaur".to_string(),
            email: "preet@khalsaschool.com".to_string(),
            phone: "604-555-0200".to_string(),
            status: SchoolStatus::Active,
        }
    }

    #[test]
    fn test_status_round_trip_text() {
        assert_eq!("active".parse::<SchoolStatus>().unwrap(), SchoolStatus::Active);
        assert_eq!(" Inactive ".parse::<SchoolStatus>().unwrap(), SchoolStatus::Inactive);
        assert!("closed".parse::<SchoolStatus>().is_err());
        assert_eq!(SchoolStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_status_default_is_active() {
        assert_eq!(SchoolStatus::default(), SchoolStatus::Active);
    }

    #[test]
    fn test_new_school_validate() {
        assert!(new_school().validate().is_ok());

        let mut school = new_school();
        school.email = "nope".to_string();
        let err = school.validate().unwrap_err();
        assert!(err.to_string().contains("email"));

        let mut school = new_school();
        school.name = "  ".to_string();
        assert!(school.validate().is_err());
    }

    #[test]
    fn test_into_school_trims_fields() {
        let mut draft = new_school();
        draft.name = "  Khalsa School ".to_string();
        let school = draft.into_school(7, Utc::now());
        assert_eq!(school.id, 7);
        assert_eq!(school.name, "Khalsa School");
        assert!(school.is_active());
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut school = new_school().into_school(1, Utc::now());
        let update = SchoolUpdate {
            location: Some("Abbotsford, BC".to_string()),
            status: Some(SchoolStatus::Inactive),
            ..SchoolUpdate::default()
        };
        update.apply(&mut school);

        assert_eq!(school.name, "Khalsa School");
        assert_eq!(school.location, "Abbotsford, BC");
        assert_eq!(school.status, SchoolStatus::Inactive);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(SchoolUpdate::default().is_empty());
        let update = SchoolUpdate {
            phone: Some("1".to_string()),
            ..SchoolUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_validate_rejects_bad_email() {
        let update = SchoolUpdate {
            email: Some("bad".to_string()),
            ..SchoolUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_school_serializes_camel_case() {
        let school = new_school().into_school(1, Utc::now());
        let json = serde_json::to_string(&school).unwrap();
        assert!(json.contains("\"createdDate\""));
        assert!(json.contains("\"status\":\"active\""));
    }
}
