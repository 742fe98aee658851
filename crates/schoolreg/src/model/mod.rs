//! Record types for schools, registrations, fees, audit entries and users.
//!
//! All records serialize with the camelCase field names of the persisted
//! layout, so a stored collection can be read back unchanged.

mod audit;
mod fees;
mod registration;
mod school;
mod user;
mod validation;

pub use audit::{AuditLogEntry, AuditType};
pub use fees::{FeeChange, FeeField, FeeHistoryEntry, FeeSettings};
pub use registration::{
    DeliveryStatus, NewRegistration, PaymentStatus, Registration, RegistrationUpdate,
};
pub use school::{NewSchool, School, SchoolStatus, SchoolUpdate};
pub use user::{Role, User};
