use chrono::Utc;
use tracing::info;

use super::{require_confirmation, Registry};
use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::model::{AuditType, NewSchool, School, SchoolUpdate};

impl Registry {
    /// Add a school with the next free identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, a field is invalid, or the
    /// dataset cannot be saved.
    pub fn create_school(&mut self, draft: NewSchool) -> Result<School> {
        let username = self.require_user()?;
        draft.validate()?;

        let before = self.data.clone();
        let school = draft.into_school(self.data.next_school_id(), Utc::now());
        self.data.schools.push(school.clone());
        self.record(
            AuditType::School,
            format!("School \"{}\" added", school.name),
            &username,
        );
        self.persist(before)?;

        info!("Added school {} ({})", school.id, school.name);
        Ok(school)
    }

    /// Merge `update` into the school with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the school does not exist,
    /// a field is invalid, or the dataset cannot be saved.
    pub fn update_school(&mut self, id: u64, update: &SchoolUpdate) -> Result<School> {
        let username = self.require_user()?;
        if update.is_empty() {
            return Err(Error::validation("update", "no fields to change"));
        }
        update.validate()?;

        let before = self.data.clone();
        let school = self
            .data
            .schools
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::not_found("school", id))?;
        update.apply(school);
        let school = school.clone();

        self.record(
            AuditType::School,
            format!("School \"{}\" updated", school.name),
            &username,
        );
        self.persist(before)?;

        info!("Updated school {}", id);
        Ok(school)
    }

    /// Remove the school with identifier `id` after confirmation.
    ///
    /// Registrations referencing the school are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the school does not exist,
    /// the user declines, or the dataset cannot be saved.
    pub fn delete_school(&mut self, id: u64, confirm: &mut dyn Confirm) -> Result<School> {
        let username = self.require_user()?;
        let index = self
            .data
            .schools
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::not_found("school", id))?;
        require_confirmation(
            confirm,
            "Are you sure you want to delete this school?",
            "school deletion",
        )?;

        let before = self.data.clone();
        let school = self.data.schools.remove(index);
        self.record(
            AuditType::School,
            format!("School \"{}\" deleted", school.name),
            &username,
        );
        self.persist(before)?;

        info!("Deleted school {} ({})", school.id, school.name);
        Ok(school)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::confirm::AssumeYes;
    use crate::dataset::Dataset;
    use crate::model::SchoolStatus;

    fn draft(name: &str) -> NewSchool {
        NewSchool {
            name: name.to_string(),
            location: "Delta, BC".to_string(),
            coordinator: "Ann Lee".to_string(),
            email: "ann@example.com".to_string(),
            phone: "604-555-0001".to_string(),
            status: SchoolStatus::Active,
        }
    }

    fn reload(registry: &Registry) -> Dataset {
        Dataset::load(registry.storage(), registry.data().fee_settings).unwrap()
    }

    #[test]
    fn test_create_assigns_max_plus_one() {
        let mut registry = admin_registry();
        let school = registry.create_school(draft("North School")).unwrap();
        assert_eq!(school.id, 4);

        registry.delete_school(2, &mut AssumeYes).unwrap();
        let next = registry.create_school(draft("South School")).unwrap();
        assert_eq!(next.id, 5);

        let last = registry.data().audit_logs.last().unwrap();
        assert_eq!(last.description, "School \"South School\" added");
        assert_eq!(last.user, "admin");
    }

    #[test]
    fn test_create_first_school_gets_id_one() {
        let mut registry = empty_registry();
        registry
            .login(
                &AcceptAll,
                &crate::auth::Credentials::new("admin", "pw", crate::model::Role::Admin),
            )
            .unwrap();
        let school = registry.create_school(draft("First")).unwrap();
        assert_eq!(school.id, 1);
    }

    #[test]
    fn test_create_persists() {
        let mut registry = admin_registry();
        registry.create_school(draft("North School")).unwrap();
        let stored = reload(&registry);
        assert_eq!(stored.schools.len(), 4);
        assert_eq!(stored.audit_logs, registry.data().audit_logs);
    }

    #[test]
    fn test_create_requires_login() {
        let mut registry = empty_registry();
        let err = registry.create_school(draft("North School")).unwrap_err();
        assert!(err.is_not_logged_in());
        assert!(registry.data().schools.is_empty());
    }

    #[test]
    fn test_create_invalid_has_no_side_effects() {
        let mut registry = admin_registry();
        let audits = registry.data().audit_logs.len();
        let mut bad = draft("North School");
        bad.email = "not-an-email".to_string();

        assert!(registry.create_school(bad).unwrap_err().is_validation());
        assert_eq!(registry.data().schools.len(), 3);
        assert_eq!(registry.data().audit_logs.len(), audits);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut registry = admin_registry();
        let update = SchoolUpdate {
            coordinator: Some("New Person".to_string()),
            status: Some(SchoolStatus::Inactive),
            ..SchoolUpdate::default()
        };
        let school = registry.update_school(2, &update).unwrap();
        assert_eq!(school.name, "Khalsa School");
        assert_eq!(school.coordinator, "New Person");
        assert!(!school.is_active());

        let last = registry.data().audit_logs.last().unwrap();
        assert_eq!(last.description, "School \"Khalsa School\" updated");
        assert_eq!(reload(&registry).schools[1].coordinator, "New Person");
    }

    #[test]
    fn test_update_unknown_school() {
        let mut registry = admin_registry();
        let update = SchoolUpdate {
            phone: Some("555-0100".to_string()),
            ..SchoolUpdate::default()
        };
        let err = registry.update_school(42, &update).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "school", id: 42 }));
    }

    #[test]
    fn test_update_without_fields_rejected() {
        let mut registry = admin_registry();
        let audit_count = registry.data().audit_logs.len();
        let err = registry
            .update_school(1, &SchoolUpdate::default())
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(registry.data().audit_logs.len(), audit_count);
    }

    #[test]
    fn test_delete_keeps_registrations() {
        let mut registry = admin_registry();
        let school = registry.delete_school(1, &mut AssumeYes).unwrap();
        assert_eq!(school.name, "Guru Nanak Academy");
        assert_eq!(registry.data().registrations.len(), 5);
        assert_eq!(registry.data().school_name(1), "N/A");

        let last = registry.data().audit_logs.last().unwrap();
        assert_eq!(last.description, "School \"Guru Nanak Academy\" deleted");
    }

    #[test]
    fn test_delete_declined() {
        let mut registry = admin_registry();
        let audits = registry.data().audit_logs.len();
        assert!(registry.delete_school(1, &mut Decline).unwrap_err().is_cancelled());
        assert_eq!(registry.data().schools.len(), 3);
        assert_eq!(registry.data().audit_logs.len(), audits);
    }

    #[test]
    fn test_delete_unknown_school() {
        let mut registry = admin_registry();
        let err = registry.delete_school(9, &mut AssumeYes).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
