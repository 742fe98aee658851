use chrono::Utc;
use tracing::info;

use super::{require_confirmation, Registry};
use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::model::{AuditType, NewRegistration, Registration, RegistrationUpdate};

impl Registry {
    /// Register a student, stamped with the current time.
    ///
    /// Without an explicit amount the registration is charged the
    /// registration fee plus the book fee.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, a field is invalid, the
    /// school does not exist, or the dataset cannot be saved.
    pub fn create_registration(&mut self, draft: NewRegistration) -> Result<Registration> {
        let username = self.require_user()?;
        draft.validate()?;
        self.require_school(draft.school_id)?;

        let amount = draft
            .amount
            .unwrap_or_else(|| self.data.fee_settings.default_registration_amount());
        let before = self.data.clone();
        let registration =
            draft.into_registration(self.data.next_registration_id(), amount, Utc::now());
        self.data.registrations.push(registration.clone());
        self.record(
            AuditType::Registration,
            format!("Registration for \"{}\" added", registration.student_name),
            &username,
        );
        self.persist(before)?;

        info!(
            "Added registration {} for {}",
            registration.id, registration.student_name
        );
        Ok(registration)
    }

    /// Merge `update` into the registration with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the registration or a newly
    /// referenced school does not exist, a field is invalid, or the dataset
    /// cannot be saved.
    pub fn update_registration(
        &mut self,
        id: u64,
        update: &RegistrationUpdate,
    ) -> Result<Registration> {
        let username = self.require_user()?;
        if update.is_empty() {
            return Err(Error::validation("update", "no fields to change"));
        }
        update.validate()?;
        if let Some(school_id) = update.school_id {
            self.require_school(school_id)?;
        }

        let before = self.data.clone();
        let registration = self
            .data
            .registrations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::not_found("registration", id))?;
        update.apply(registration);
        let registration = registration.clone();

        self.record(
            AuditType::Registration,
            format!("Registration for \"{}\" updated", registration.student_name),
            &username,
        );
        self.persist(before)?;

        info!("Updated registration {}", id);
        Ok(registration)
    }

    /// Remove the registration with identifier `id` after confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the registration does not
    /// exist, the user declines, or the dataset cannot be saved.
    pub fn delete_registration(
        &mut self,
        id: u64,
        confirm: &mut dyn Confirm,
    ) -> Result<Registration> {
        let username = self.require_user()?;
        let index = self
            .data
            .registrations
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::not_found("registration", id))?;
        require_confirmation(
            confirm,
            "Are you sure you want to delete this registration?",
            "registration deletion",
        )?;

        let before = self.data.clone();
        let registration = self.data.registrations.remove(index);
        self.record(
            AuditType::Registration,
            format!("Registration for \"{}\" deleted", registration.student_name),
            &username,
        );
        self.persist(before)?;

        info!("Deleted registration {}", id);
        Ok(registration)
    }

    fn require_school(&self, school_id: u64) -> Result<()> {
        if self.data.school(school_id).is_some() {
            Ok(())
        } else {
            Err(Error::validation(
                "school",
                format!("school {school_id} does not exist"),
            ))
        }
    }
}
