use chrono::Utc;
use tracing::info;

use super::{require_confirmation, Registry};
use crate::confirm::Confirm;
use crate::error::Result;
use crate::model::{AuditType, FeeChange, FeeHistoryEntry, FeeSettings};

impl Registry {
    /// Replace the fee settings after confirmation.
    ///
    /// Each changed field is recorded in the fee history and the audit log.
    /// Returns the changes; unchanged values record nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if no one is logged in, a value is invalid, the user
    /// declines, or the dataset cannot be saved.
    pub fn update_fee_settings(
        &mut self,
        next: FeeSettings,
        confirm: &mut dyn Confirm,
    ) -> Result<Vec<FeeChange>> {
        let username = self.require_user()?;
        next.validate()?;
        require_confirmation(
            confirm,
            "Are you sure you want to update the fee settings?",
            "fee update",
        )?;

        let before = self.data.clone();
        let changes = self.data.fee_settings.diff(&next);
        let now = Utc::now();
        for change in &changes {
            self.data
                .fee_history
                .push(FeeHistoryEntry::from_change(change, &username, now));
            self.record(AuditType::FeeChange, change.describe(), &username);
        }
        self.data.fee_settings = next;
        self.persist(before)?;

        info!("Updated fee settings ({} changed)", changes.len());
        Ok(changes)
    }
}
