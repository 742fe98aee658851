//! Fee settings and their change history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::require_amount;
use crate::error::{Error, Result};

/// The singleton fee configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettings {
    /// Base registration fee.
    pub registration_fee: f64,
    /// Book fee.
    pub book_fee: f64,
    /// Late payment fee.
    pub late_fee: f64,
    /// Bulk discount, in percent.
    pub bulk_discount: u32,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            registration_fee: 25.0,
            book_fee: 15.0,
            late_fee: 10.0,
            bulk_discount: 10,
        }
    }
}

impl FeeSettings {
    /// Amount charged for a new registration when none is given.
    #[must_use]
    pub fn default_registration_amount(&self) -> f64 {
        self.registration_fee + self.book_fee
    }

    /// Current value of one field, widened to `f64`.
    #[must_use]
    pub fn get(&self, field: FeeField) -> f64 {
        match field {
            FeeField::RegistrationFee => self.registration_fee,
            FeeField::BookFee => self.book_fee,
            FeeField::LateFee => self.late_fee,
            FeeField::BulkDiscount => f64::from(self.bulk_discount),
        }
    }

    /// Fields whose values differ between `self` and `next`, in field order.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn diff(&self, next: &Self) -> Vec<FeeChange> {
        FeeField::ALL
            .into_iter()
            .filter_map(|field| {
                let old_value = self.get(field);
                let new_value = next.get(field);
                (old_value != new_value).then_some(FeeChange {
                    field,
                    old_value,
                    new_value,
                })
            })
            .collect()
    }

    /// Check the values against the fee form rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        require_amount("registration fee", self.registration_fee)?;
        require_amount("book fee", self.book_fee)?;
        require_amount("late fee", self.late_fee)?;
        if self.bulk_discount > 100 {
            return Err(Error::validation(
                "bulk discount",
                format!("{}% is above 100%", self.bulk_discount),
            ));
        }
        Ok(())
    }
}

/// One of the four fee settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeField {
    /// `registrationFee`
    RegistrationFee,
    /// `bookFee`
    BookFee,
    /// `lateFee`
    LateFee,
    /// `bulkDiscount`
    BulkDiscount,
}

impl FeeField {
    /// All fields in the order changes are recorded.
    pub const ALL: [Self; 4] = [
        Self::RegistrationFee,
        Self::BookFee,
        Self::LateFee,
        Self::BulkDiscount,
    ];

    /// The stored name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegistrationFee => "registrationFee",
            Self::BookFee => "bookFee",
            Self::LateFee => "lateFee",
            Self::BulkDiscount => "bulkDiscount",
        }
    }
}

impl fmt::Display for FeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_value("fee field", s))
    }
}

/// A single field difference between two fee settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeChange {
    /// The field that changed.
    pub field: FeeField,
    /// Value before the change.
    pub old_value: f64,
    /// Value after the change.
    pub new_value: f64,
}

impl FeeChange {
    /// Human-readable description used in the audit log.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Fee {} changed from ${} to ${}",
            self.field, self.old_value, self.new_value
        )
    }
}

/// An immutable record of one fee field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistoryEntry {
    /// When the change was made.
    pub date: DateTime<Utc>,
    /// Who made the change.
    pub user: String,
    /// The field that changed.
    pub field: FeeField,
    /// Value before the change.
    pub old_value: f64,
    /// Value after the change.
    pub new_value: f64,
}

impl FeeHistoryEntry {
    /// Record `change` as made by `user` at `date`.
    #[must_use]
    pub fn from_change(change: &FeeChange, user: &str, date: DateTime<Utc>) -> Self {
        Self {
            date,
            user: user.to_string(),
            field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}
