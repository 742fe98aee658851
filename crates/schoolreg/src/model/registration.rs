//! Student registrations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_amount, require_text};
use crate::error::{Error, Result};

/// Payment state of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Fees received.
    Paid,
    /// Fees not yet received.
    #[default]
    Pending,
    /// Fees past due.
    Overdue,
}

impl PaymentStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::Paid, Self::Pending, Self::Overdue];

    /// The stored and displayed name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
        }
    }

    /// Whether money is still owed.
    #[must_use]
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Overdue)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            "overdue" => Ok(Self::Overdue),
            _ => Err(Error::invalid_value("payment status", s)),
        }
    }
}

/// Book delivery state of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Books not yet handed over.
    #[default]
    Pending,
    /// Books handed over.
    Delivered,
}

impl DeliveryStatus {
    /// The stored and displayed name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            _ => Err(Error::invalid_value("delivery status", s)),
        }
    }
}

/// A student registration.
///
/// `school_id` is a plain identifier: deleting the school leaves it dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Identifier, unique among registrations.
    pub id: u64,
    /// Full name of the student.
    pub student_name: String,
    /// The school the student registered through.
    pub school_id: u64,
    /// Grade, free text ("8", "K", ...).
    pub grade: String,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Book delivery state.
    pub book_delivery: DeliveryStatus,
    /// Amount charged.
    pub amount: f64,
    /// When the student was registered.
    pub registration_date: DateTime<Utc>,
}

impl Registration {
    /// Whether the registration has been paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Whether the books have been delivered.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.book_delivery == DeliveryStatus::Delivered
    }
}

/// Field values for a registration about to be created.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewRegistration {
    /// Full name of the student.
    pub student_name: String,
    /// School identifier.
    pub school_id: u64,
    /// Grade.
    pub grade: String,
    /// Initial payment state.
    pub payment_status: PaymentStatus,
    /// Initial delivery state.
    pub book_delivery: DeliveryStatus,
    /// Amount charged; `None` uses registration fee plus book fee.
    pub amount: Option<f64>,
}

impl NewRegistration {
    /// Check the values against the registration form rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        require_text("student name", &self.student_name)?;
        require_text("grade", &self.grade)?;
        if let Some(amount) = self.amount {
            require_amount("amount", amount)?;
        }
        Ok(())
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_registration(
        self,
        id: u64,
        amount: f64,
        registration_date: DateTime<Utc>,
    ) -> Registration {
        Registration {
            id,
            student_name: self.student_name.trim().to_string(),
            school_id: self.school_id,
            grade: self.grade.trim().to_string(),
            payment_status: self.payment_status,
            book_delivery: self.book_delivery,
            amount,
            registration_date,
        }
    }
}

/// A partial edit of a registration. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrationUpdate {
    /// New student name.
    pub student_name: Option<String>,
    /// New school identifier.
    pub school_id: Option<u64>,
    /// New grade.
    pub grade: Option<String>,
    /// New payment state.
    pub payment_status: Option<PaymentStatus>,
    /// New delivery state.
    pub book_delivery: Option<DeliveryStatus>,
    /// New amount.
    pub amount: Option<f64>,
}

impl RegistrationUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.student_name.is_none()
            && self.school_id.is_none()
            && self.grade.is_none()
            && self.payment_status.is_none()
            && self.book_delivery.is_none()
            && self.amount.is_none()
    }

    /// Check the supplied values against the registration form rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.student_name {
            require_text("student name", name)?;
        }
        if let Some(grade) = &self.grade {
            require_text("grade", grade)?;
        }
        if let Some(amount) = self.amount {
            require_amount("amount", amount)?;
        }
        Ok(())
    }

    /// Merge the supplied fields into `registration`.
    pub fn apply(&self, registration: &mut Registration) {
        if let Some(name) = &self.student_name {
            registration.student_name = name.trim().to_string();
        }
        if let Some(school_id) = self.school_id {
            registration.school_id = school_id;
        }
        if let Some(grade) = &self.grade {
            registration.grade = grade.trim().to_string();
        }
        if let Some(status) = self.payment_status {
            registration.payment_status = status;
        }
        if let Some(delivery) = self.book_delivery {
            registration.book_delivery = delivery;
        }
        if let Some(amount) = self.amount {
            registration.amount = amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewRegistration {
        NewRegistration {
            student_name: "Amrit Singh".to_string(),
            school_id: 1,
            grade: "8".to_string(),
            payment_status: PaymentStatus::Paid,
            book_delivery: DeliveryStatus::Delivered,
            amount: Some(40.0),
        }
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!("overdue".parse::<PaymentStatus>().unwrap(), PaymentStatus::Overdue);
        let err = "refunded".parse::<PaymentStatus>().unwrap_err();
        assert!(err.to_string().contains("payment status"));
    }

    #[test]
    fn test_payment_status_outstanding() {
        assert!(!PaymentStatus::Paid.is_outstanding());
        assert!(PaymentStatus::Pending.is_outstanding());
        assert!(PaymentStatus::Overdue.is_outstanding());
    }

    #[test]
    fn test_delivery_status_parse() {
        assert_eq!(
            "Delivered".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::Delivered
        );
        assert!("lost".parse::<DeliveryStatus>().is_err());
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::Pending);
    }

    #[test]
    fn test_validate() {
        assert!(draft().validate().is_ok());

        let mut reg = draft();
        reg.amount = Some(-5.0);
        assert!(reg.validate().is_err());

        let mut reg = draft();
        reg.grade = String::new();
        assert!(reg.validate().is_err());

        let mut reg = draft();
        reg.amount = None;
        assert!(reg.validate().is_ok());
    }

    #[test]
    fn test_into_registration() {
        let reg = draft().into_registration(3, 40.0, Utc::now());
        assert_eq!(reg.id, 3);
        assert!(reg.is_paid());
        assert!(reg.is_delivered());
    }

    #[test]
    fn test_update_apply() {
        let mut reg = draft().into_registration(1, 40.0, Utc::now());
        let update = RegistrationUpdate {
            payment_status: Some(PaymentStatus::Overdue),
            amount: Some(50.0),
            ..RegistrationUpdate::default()
        };
        update.apply(&mut reg);

        assert_eq!(reg.payment_status, PaymentStatus::Overdue);
        assert!((reg.amount - 50.0).abs() < f64::EPSILON);
        assert_eq!(reg.student_name, "Amrit Singh");
    }

    #[test]
    fn test_registration_json_layout() {
        let reg = draft().into_registration(1, 40.0, Utc::now());
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["studentName"], "Amrit Singh");
        assert_eq!(json["schoolId"], 1);
        assert_eq!(json["paymentStatus"], "paid");
        assert_eq!(json["bookDelivery"], "delivered");
        assert!(json.get("registrationDate").is_some());
    }
}
