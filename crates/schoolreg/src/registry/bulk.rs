use chrono::Utc;
use tracing::{debug, info};

use super::{require_confirmation, Registry};
use crate::confirm::Confirm;
use crate::error::Result;
use crate::import;
use crate::model::{AuditType, DeliveryStatus, PaymentStatus, Registration, School, SchoolStatus};

impl Registry {
    /// Import registrations from CSV text after confirmation.
    ///
    /// Rows naming an unknown school or holding unusable values are skipped.
    /// Imported rows share one timestamp and start with books pending.
    /// Returns the number of registrations added.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the user declines, or the
    /// dataset cannot be saved.
    pub fn bulk_import_registrations(
        &mut self,
        text: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<usize> {
        let username = self.require_user()?;
        require_confirmation(
            confirm,
            "Are you sure you want to process this bulk upload? This will add multiple registrations.",
            "bulk registration upload",
        )?;

        let before = self.data.clone();
        let imported_at = Utc::now();
        let mut added = 0;
        for row in import::parse_registrations(text) {
            let Some(school_id) = self.data.school_by_name(&row.school_name).map(|s| s.id) else {
                debug!("Skipping {}: no school named {}", row.student_name, row.school_name);
                continue;
            };
            let id = self.data.next_registration_id();
            self.data.registrations.push(Registration {
                id,
                student_name: row.student_name,
                school_id,
                grade: row.grade,
                payment_status: row.payment_status,
                book_delivery: DeliveryStatus::Pending,
                amount: row.amount,
                registration_date: imported_at,
            });
            added += 1;
        }

        self.record(
            AuditType::BulkUpload,
            format!("Bulk registration upload: {added} records added"),
            &username,
        );
        self.persist(before)?;

        info!("Imported {} registrations", added);
        Ok(added)
    }

    /// Import schools from CSV text after confirmation.
    ///
    /// Imported schools are active. Returns the number of schools added.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the user declines, or the
    /// dataset cannot be saved.
    pub fn bulk_import_schools(&mut self, text: &str, confirm: &mut dyn Confirm) -> Result<usize> {
        let username = self.require_user()?;
        require_confirmation(
            confirm,
            "Are you sure you want to process this bulk upload? This will add multiple schools.",
            "bulk school upload",
        )?;

        let before = self.data.clone();
        let imported_at = Utc::now();
        let mut added = 0;
        for row in import::parse_schools(text) {
            let id = self.data.next_school_id();
            self.data.schools.push(School {
                id,
                name: row.name,
                location: row.location,
                coordinator: row.coordinator,
                email: row.email,
                phone: row.phone,
                status: SchoolStatus::Active,
                created_date: imported_at,
            });
            added += 1;
        }

        self.record(
            AuditType::BulkUpload,
            format!("Bulk school upload: {added} records added"),
            &username,
        );
        self.persist(before)?;

        info!("Imported {} schools", added);
        Ok(added)
    }

    /// Set the payment state of every registration, or only those of
    /// `school_id`, after confirmation. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the user declines, or the
    /// dataset cannot be saved.
    pub fn bulk_update_payments(
        &mut self,
        status: PaymentStatus,
        school_id: Option<u64>,
        confirm: &mut dyn Confirm,
    ) -> Result<usize> {
        let username = self.require_user()?;
        require_confirmation(
            confirm,
            &format!(
                "Are you sure you want to update payment status to \"{status}\" for {}?",
                scope(school_id)
            ),
            "bulk payment update",
        )?;

        let before = self.data.clone();
        let mut updated = 0;
        for registration in self.registrations_in_scope(school_id) {
            registration.payment_status = status;
            updated += 1;
        }

        self.record(
            AuditType::BulkUpload,
            format!("Bulk payment update: {updated} records updated to {status}"),
            &username,
        );
        self.persist(before)?;

        info!("Set payment status {} on {} registrations", status, updated);
        Ok(updated)
    }

    /// Set the book delivery state of every registration, or only those of
    /// `school_id`, after confirmation. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, the user declines, or the
    /// dataset cannot be saved.
    pub fn bulk_update_deliveries(
        &mut self,
        status: DeliveryStatus,
        school_id: Option<u64>,
        confirm: &mut dyn Confirm,
    ) -> Result<usize> {
        let username = self.require_user()?;
        require_confirmation(
            confirm,
            &format!(
                "Are you sure you want to update delivery status to \"{status}\" for {}?",
                scope(school_id)
            ),
            "bulk delivery update",
        )?;

        let before = self.data.clone();
        let mut updated = 0;
        for registration in self.registrations_in_scope(school_id) {
            registration.book_delivery = status;
            updated += 1;
        }

        self.record(
            AuditType::BulkUpload,
            format!("Bulk delivery update: {updated} records updated to {status}"),
            &username,
        );
        self.persist(before)?;

        info!("Set delivery status {} on {} registrations", status, updated);
        Ok(updated)
    }

    fn registrations_in_scope(
        &mut self,
        school_id: Option<u64>,
    ) -> impl Iterator<Item = &mut Registration> + '_ {
        self.data
            .registrations
            .iter_mut()
            .filter(move |r| school_id.map_or(true, |id| r.school_id == id))
    }
}

fn scope(school_id: Option<u64>) -> &'static str {
    if school_id.is_some() {
        "selected school"
    } else {
        "all schools"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::confirm::AssumeYes;

    const REGISTRATIONS_CSV: &str = "Student Name,School Name,Grade,Payment Status,Amount\n\
        John Smith,Guru Nanak Academy,8,paid,40.00\n\
        Jane Doe,Khalsa School,9,pending,40.00\n\
        Lost Student,Nowhere School,9,paid,40.00\n\
        Broken Row\n";

    #[test]
    fn test_bulk_import_registrations() {
        let mut registry = admin_registry();
        let added = registry
            .bulk_import_registrations(REGISTRATIONS_CSV, &mut AssumeYes)
            .unwrap();
        assert_eq!(added, 2);

        let regs = &registry.data().registrations;
        assert_eq!(regs.len(), 7);
        assert_eq!(regs[5].id, 6);
        assert_eq!(regs[6].id, 7);
        assert_eq!(regs[5].school_id, 1);
        assert_eq!(regs[6].school_id, 2);
        assert_eq!(regs[5].book_delivery, DeliveryStatus::Pending);
        assert_eq!(regs[5].registration_date, regs[6].registration_date);

        let last = registry.data().audit_logs.last().unwrap();
        assert_eq!(last.kind, AuditType::BulkUpload);
        assert_eq!(last.description, "Bulk registration upload: 2 records added");
    }

    #[test]
    fn test_bulk_import_declined() {
        let mut registry = admin_registry();
        let audits = registry.data().audit_logs.len();
        assert!(registry
            .bulk_import_registrations(REGISTRATIONS_CSV, &mut Decline)
            .unwrap_err()
            .is_cancelled());
        assert_eq!(registry.data().registrations.len(), 5);
        assert_eq!(registry.data().audit_logs.len(), audits);
    }

    #[test]
    fn test_bulk_import_schools() {
        let mut registry = admin_registry();
        let text = "School Name,Location,Coordinator,Email,Phone\n\
                    North School,Delta BC,Ann Lee,ann@north.ca,604-555-0001\n\
                    \n\
                    South School,Richmond BC,Bo Chan,bo@south.ca,604-555-0002\n";
        let added = registry.bulk_import_schools(text, &mut AssumeYes).unwrap();
        assert_eq!(added, 2);

        let schools = &registry.data().schools;
        assert_eq!(schools.len(), 5);
        assert_eq!(schools[3].id, 4);
        assert_eq!(schools[4].name, "South School");
        assert!(schools[4].is_active());
        assert_eq!(
            registry.data().audit_logs.last().unwrap().description,
            "Bulk school upload: 2 records added"
        );
    }

    #[test]
    fn test_empty_import_still_audited() {
        let mut registry = admin_registry();
        let added = registry
            .bulk_import_schools("School Name,Location\n", &mut AssumeYes)
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(
            registry.data().audit_logs.last().unwrap().description,
            "Bulk school upload: 0 records added"
        );
    }

    #[test]
    fn test_bulk_payment_update_all() {
        let mut registry = admin_registry();
        let updated = registry
            .bulk_update_payments(PaymentStatus::Paid, None, &mut AssumeYes)
            .unwrap();
        assert_eq!(updated, 5);
        assert!(registry.data().registrations.iter().all(Registration::is_paid));
        assert_eq!(
            registry.data().audit_logs.last().unwrap().description,
            "Bulk payment update: 5 records updated to paid"
        );
    }

    #[test]
    fn test_bulk_payment_update_one_school() {
        let mut registry = admin_registry();
        let updated = registry
            .bulk_update_payments(PaymentStatus::Overdue, Some(2), &mut AssumeYes)
            .unwrap();
        assert_eq!(updated, 2);
        let regs = &registry.data().registrations;
        assert!(regs
            .iter()
            .filter(|r| r.school_id == 2)
            .all(|r| r.payment_status == PaymentStatus::Overdue));
        assert_eq!(regs[0].payment_status, PaymentStatus::Paid);
        assert_eq!(regs[1].payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_bulk_delivery_update() {
        let mut registry = admin_registry();
        let updated = registry
            .bulk_update_deliveries(DeliveryStatus::Delivered, Some(1), &mut AssumeYes)
            .unwrap();
        assert_eq!(updated, 2);
        assert!(registry.data().registrations[1].is_delivered());
        assert!(!registry.data().registrations[4].is_delivered());
        assert_eq!(
            registry.data().audit_logs.last().unwrap().description,
            "Bulk delivery update: 2 records updated to delivered"
        );
    }

    #[test]
    fn test_bulk_update_prompt_names_scope() {
        struct Capture(Vec<String>);
        impl Confirm for Capture {
            fn confirm(&mut self, prompt: &str) -> bool {
                self.0.push(prompt.to_string());
                false
            }
        }

        let mut registry = admin_registry();
        let mut capture = Capture(Vec::new());
        let _ = registry.bulk_update_deliveries(DeliveryStatus::Pending, None, &mut capture);
        let _ = registry.bulk_update_payments(PaymentStatus::Paid, Some(1), &mut capture);
        assert_eq!(
            capture.0,
            vec![
                "Are you sure you want to update delivery status to \"pending\" for all schools?"
                    .to_string(),
                "Are you sure you want to update payment status to \"paid\" for selected school?"
                    .to_string(),
            ]
        );
    }
}
