//! The in-memory dataset and its mapping onto storage keys.
//!
//! A [`Dataset`] is loaded whole from [`Storage`], mutated in memory, and
//! written back whole in a single transaction.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    AuditLogEntry, AuditType, DeliveryStatus, FeeHistoryEntry, FeeSettings, PaymentStatus,
    Registration, School, SchoolStatus,
};
use crate::storage::schema::{
    DATASET_KEYS, KEY_AUDIT_LOGS, KEY_FEE_HISTORY, KEY_FEE_SETTINGS, KEY_REGISTRATIONS,
    KEY_SCHOOLS,
};
use crate::storage::Storage;

/// Name rendered for a registration whose school no longer exists.
pub const MISSING_SCHOOL: &str = "N/A";

/// User recorded for entries the application writes on its own behalf.
pub const SYSTEM_USER: &str = "system";

/// Amount charged for every sample registration.
const SAMPLE_AMOUNT: f64 = 40.0;

/// All persisted collections.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    /// Participating schools.
    pub schools: Vec<School>,
    /// Student registrations.
    pub registrations: Vec<Registration>,
    /// Current fee settings.
    pub fee_settings: FeeSettings,
    /// Append-only audit log.
    pub audit_logs: Vec<AuditLogEntry>,
    /// Append-only fee change history.
    pub fee_history: Vec<FeeHistoryEntry>,
}

impl Dataset {
    /// Load every collection from storage.
    ///
    /// Missing keys load as empty collections; missing fee settings fall
    /// back to `default_fees`.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value cannot be read or decoded.
    pub fn load(storage: &Storage, default_fees: FeeSettings) -> Result<Self> {
        let dataset = Self {
            schools: storage.get(KEY_SCHOOLS)?.unwrap_or_default(),
            registrations: storage.get(KEY_REGISTRATIONS)?.unwrap_or_default(),
            fee_settings: storage.get(KEY_FEE_SETTINGS)?.unwrap_or(default_fees),
            audit_logs: storage.get(KEY_AUDIT_LOGS)?.unwrap_or_default(),
            fee_history: storage.get(KEY_FEE_HISTORY)?.unwrap_or_default(),
        };
        debug!(
            "Loaded {} schools, {} registrations, {} audit entries",
            dataset.schools.len(),
            dataset.registrations.len(),
            dataset.audit_logs.len()
        );
        Ok(dataset)
    }

    /// Write every collection back to storage in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the database write fails.
    pub fn save(&self, storage: &Storage) -> Result<()> {
        storage.set_many(&self.entries()?)
    }

    /// Every collection encoded under its storage key, in [`DATASET_KEYS`] order.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be encoded.
    pub fn entries(&self) -> Result<Vec<(&'static str, String)>> {
        DATASET_KEYS
            .iter()
            .map(|&key| Ok((key, self.encode(key)?)))
            .collect()
    }

    fn encode(&self, key: &str) -> Result<String> {
        let raw = match key {
            KEY_SCHOOLS => serde_json::to_string(&self.schools)?,
            KEY_REGISTRATIONS => serde_json::to_string(&self.registrations)?,
            KEY_FEE_SETTINGS => serde_json::to_string(&self.fee_settings)?,
            KEY_AUDIT_LOGS => serde_json::to_string(&self.audit_logs)?,
            KEY_FEE_HISTORY => serde_json::to_string(&self.fee_history)?,
            _ => return Err(Error::internal(format!("'{key}' is not a dataset key"))),
        };
        Ok(raw)
    }

    /// Next free school identifier: one past the largest, or 1 when empty.
    #[must_use]
    pub fn next_school_id(&self) -> u64 {
        self.schools.iter().map(|s| s.id).max().map_or(1, |id| id + 1)
    }

    /// Next free registration identifier: one past the largest, or 1 when empty.
    #[must_use]
    pub fn next_registration_id(&self) -> u64 {
        self.registrations
            .iter()
            .map(|r| r.id)
            .max()
            .map_or(1, |id| id + 1)
    }

    /// Look up a school by identifier.
    #[must_use]
    pub fn school(&self, id: u64) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }

    /// Look up a school by its exact (trimmed) name.
    #[must_use]
    pub fn school_by_name(&self, name: &str) -> Option<&School> {
        let name = name.trim();
        self.schools.iter().find(|s| s.name == name)
    }

    /// Resolve a school reference to a display name, or `N/A` if dangling.
    #[must_use]
    pub fn school_name(&self, id: u64) -> &str {
        self.school(id).map_or(MISSING_SCHOOL, |s| s.name.as_str())
    }

    /// Look up a registration by identifier.
    #[must_use]
    pub fn registration(&self, id: u64) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }

    /// Populate the sample schools and registrations and note it in the audit log.
    pub fn seed_sample_data(&mut self) {
        let now = Utc::now();

        let schools = [
            (
                "Guru Nanak Academy",
                "Vancouver, BC",
                "John Singh",
                "john@gurunanakacademy.com",
                "604-555-0100",
            ),
            (
                "Khalsa School",
                "Surrey, BC",
                "Preet Kaur",
                "preet@khalsaschool.com",
                "604-555-0200",
            ),
            (
                "Sikh Heritage School",
                "Brampton, ON",
                "Rajinder Singh",
                "rajinder@sikhheritage.com",
                "905-555-0300",
            ),
        ];
        for (name, location, coordinator, email, phone) in schools {
            let id = self.next_school_id();
            self.schools.push(School {
                id,
                name: name.to_string(),
                location: location.to_string(),
                coordinator: coordinator.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                status: SchoolStatus::Active,
                created_date: now,
            });
        }

        let registrations = [
            ("Amrit Singh", 1, "8", PaymentStatus::Paid, DeliveryStatus::Delivered, 5),
            ("Simran Kaur", 1, "9", PaymentStatus::Pending, DeliveryStatus::Pending, 3),
            ("Harpreet Singh", 2, "10", PaymentStatus::Paid, DeliveryStatus::Delivered, 2),
            ("Jasleen Kaur", 2, "7", PaymentStatus::Paid, DeliveryStatus::Pending, 1),
            ("Gurpreet Singh", 3, "11", PaymentStatus::Overdue, DeliveryStatus::Pending, 10),
        ];
        for (student, school_id, grade, payment_status, book_delivery, days_ago) in registrations {
            let id = self.next_registration_id();
            self.registrations.push(Registration {
                id,
                student_name: student.to_string(),
                school_id,
                grade: grade.to_string(),
                payment_status,
                book_delivery,
                amount: SAMPLE_AMOUNT,
                registration_date: now - Duration::days(days_ago),
            });
        }

        self.audit_logs.push(AuditLogEntry::new(
            AuditType::System,
            "Sample data initialized",
            SYSTEM_USER,
        ));
        debug!("Seeded sample data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Dataset {
        let mut data = Dataset::default();
        data.seed_sample_data();
        data
    }

    #[test]
    fn test_next_ids_on_empty() {
        let data = Dataset::default();
        assert_eq!(data.next_school_id(), 1);
        assert_eq!(data.next_registration_id(), 1);
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        let mut data = seeded();
        data.schools.retain(|s| s.id != 2);
        assert_eq!(data.next_school_id(), 4);

        data.registrations.retain(|r| r.id == 2);
        assert_eq!(data.next_registration_id(), 3);
    }

    #[test]
    fn test_seed_sample_data() {
        let data = seeded();
        assert_eq!(data.schools.len(), 3);
        assert_eq!(data.registrations.len(), 5);
        assert!(data.registrations.iter().all(|r| (r.amount - 40.0).abs() < f64::EPSILON));
        assert_eq!(data.audit_logs.len(), 1);
        assert_eq!(data.audit_logs[0].kind, AuditType::System);
        assert_eq!(data.audit_logs[0].user, SYSTEM_USER);
        assert_eq!(data.school_name(3), "Sikh Heritage School");
    }

    #[test]
    fn test_school_name_dangling() {
        let data = seeded();
        assert_eq!(data.school_name(99), MISSING_SCHOOL);
    }

    #[test]
    fn test_school_by_name_trims() {
        let data = seeded();
        assert_eq!(data.school_by_name(" Khalsa School ").map(|s| s.id), Some(2));
        assert!(data.school_by_name("khalsa school").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let storage = Storage::open_in_memory().unwrap();
        let data = seeded();
        data.save(&storage).unwrap();

        let loaded = Dataset::load(&storage, FeeSettings::default()).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_entries_cover_every_dataset_key() {
        let entries = seeded().entries().unwrap();
        let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, DATASET_KEYS);
        assert!(entries.iter().all(|(_, raw)| !raw.is_empty()));
    }

    #[test]
    fn test_load_empty_uses_default_fees() {
        let storage = Storage::open_in_memory().unwrap();
        let fees = FeeSettings {
            registration_fee: 30.0,
            ..FeeSettings::default()
        };
        let loaded = Dataset::load(&storage, fees).unwrap();
        assert!(loaded.schools.is_empty());
        assert_eq!(loaded.fee_settings, fees);
    }
}
