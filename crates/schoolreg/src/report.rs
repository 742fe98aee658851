//! Dashboard statistics, per-school statistics and registration filters.
//!
//! Everything here is computed from a borrowed [`Dataset`] and never
//! mutates it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::model::{PaymentStatus, Registration};

/// `part` as a percentage of `total`, or 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Sum of amounts over paid registrations.
#[must_use]
pub fn paid_revenue<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> f64 {
    registrations
        .into_iter()
        .filter(|r| r.is_paid())
        .map(|r| r.amount)
        .sum()
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// All registrations.
    pub total_registrations: usize,
    /// Schools with status `active`.
    pub active_schools: usize,
    /// Sum of amounts over paid registrations.
    pub total_revenue: f64,
    /// Registrations that are pending or overdue.
    pub pending_payments: usize,
}

impl DashboardStats {
    /// Compute the headline numbers.
    #[must_use]
    pub fn compute(data: &Dataset) -> Self {
        Self {
            total_registrations: data.registrations.len(),
            active_schools: data.schools.iter().filter(|s| s.is_active()).count(),
            total_revenue: paid_revenue(&data.registrations),
            pending_payments: data
                .registrations
                .iter()
                .filter(|r| r.payment_status.is_outstanding())
                .count(),
        }
    }
}

/// Count and share of one payment state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    /// The payment state.
    pub status: PaymentStatus,
    /// Registrations in that state.
    pub count: usize,
    /// Percentage of all registrations.
    pub percent: f64,
}

/// Paid, pending and overdue shares, in that order.
#[must_use]
pub fn payment_breakdown(data: &Dataset) -> Vec<StatusShare> {
    let total = data.registrations.len();
    PaymentStatus::ALL
        .into_iter()
        .map(|status| {
            let count = data
                .registrations
                .iter()
                .filter(|r| r.payment_status == status)
                .count();
            StatusShare {
                status,
                count,
                percent: percentage(count, total),
            }
        })
        .collect()
}

/// A registration with its school name resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRegistration<'a> {
    /// The registration.
    pub registration: &'a Registration,
    /// School name, or `N/A` when the school is gone.
    pub school_name: &'a str,
}

/// The newest `limit` registrations, newest first.
#[must_use]
pub fn recent_registrations(data: &Dataset, limit: usize) -> Vec<RecentRegistration<'_>> {
    let mut sorted: Vec<&Registration> = data.registrations.iter().collect();
    sorted.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
    sorted
        .into_iter()
        .take(limit)
        .map(|registration| RecentRegistration {
            registration,
            school_name: data.school_name(registration.school_id),
        })
        .collect()
}

/// Per-school aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolStats {
    /// School identifier.
    pub school_id: u64,
    /// School name.
    pub name: String,
    /// Registrations referencing the school.
    pub registrations: usize,
    /// Sum of amounts over the school's paid registrations.
    pub revenue: f64,
    /// Paid registrations.
    pub paid: usize,
    /// Registrations not yet paid.
    pub unpaid: usize,
    /// Registrations with books delivered.
    pub delivered: usize,
}

impl SchoolStats {
    /// Aggregate every school, in school order.
    #[must_use]
    pub fn compute_all(data: &Dataset) -> Vec<Self> {
        data.schools
            .iter()
            .map(|school| {
                let regs: Vec<&Registration> = data
                    .registrations
                    .iter()
                    .filter(|r| r.school_id == school.id)
                    .collect();
                let paid = regs.iter().filter(|r| r.is_paid()).count();
                Self {
                    school_id: school.id,
                    name: school.name.clone(),
                    registrations: regs.len(),
                    revenue: paid_revenue(regs.iter().copied()),
                    paid,
                    unpaid: regs.len() - paid,
                    delivered: regs.iter().filter(|r| r.is_delivered()).count(),
                }
            })
            .collect()
    }

    /// Delivered over total, as shown in the statistics table.
    #[must_use]
    pub fn delivery_ratio(&self) -> String {
        format!("{}/{}", self.delivered, self.registrations)
    }
}

/// Program-wide participation figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationAnalytics {
    /// All registrations.
    pub total_participants: usize,
    /// Active schools.
    pub active_schools: usize,
    /// Registrations per active school, 0 without active schools.
    pub average_per_school: f64,
    /// Active schools as a percentage of all schools.
    pub participation_rate: f64,
}

impl ParticipationAnalytics {
    /// Compute participation figures.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(data: &Dataset) -> Self {
        let total_participants = data.registrations.len();
        let active_schools = data.schools.iter().filter(|s| s.is_active()).count();
        let average_per_school = if active_schools == 0 {
            0.0
        } else {
            total_participants as f64 / active_schools as f64
        };
        Self {
            total_participants,
            active_schools,
            average_per_school,
            participation_rate: percentage(active_schools, data.schools.len()),
        }
    }
}

/// Book delivery progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDeliveryStats {
    /// Registrations with books delivered.
    pub delivered: usize,
    /// Registrations still waiting for books.
    pub pending: usize,
    /// Delivered as a percentage of all registrations.
    pub delivered_percent: f64,
    /// Pending as a percentage of all registrations.
    pub pending_percent: f64,
}

impl BookDeliveryStats {
    /// Compute delivery progress.
    #[must_use]
    pub fn compute(data: &Dataset) -> Self {
        let total = data.registrations.len();
        let delivered = data.registrations.iter().filter(|r| r.is_delivered()).count();
        let pending = total - delivered;
        Self {
            delivered,
            pending,
            delivered_percent: percentage(delivered, total),
            pending_percent: percentage(pending, total),
        }
    }
}

/// Filter for the registration list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationFilter {
    /// Case-insensitive substring of the student name.
    pub search: Option<String>,
    /// Only this school.
    pub school_id: Option<u64>,
    /// Only this payment state.
    pub payment_status: Option<PaymentStatus>,
}

impl RegistrationFilter {
    /// Whether `registration` passes every set criterion.
    #[must_use]
    pub fn matches(&self, registration: &Registration) -> bool {
        let name_ok = self.search.as_deref().map_or(true, |term| {
            registration
                .student_name
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        name_ok
            && self.school_id.map_or(true, |id| registration.school_id == id)
            && self
                .payment_status
                .map_or(true, |status| registration.payment_status == status)
    }

    /// Matching registrations in stored order.
    #[must_use]
    pub fn apply<'a>(&self, data: &'a Dataset) -> Vec<&'a Registration> {
        data.registrations.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Filter for the statistics view: school and inclusive date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsFilter {
    /// Only this school.
    pub school_id: Option<u64>,
    /// Earliest registration date included.
    pub from: Option<DateTime<Utc>>,
    /// Latest registration date included.
    pub to: Option<DateTime<Utc>>,
}

impl StatsFilter {
    /// Whether `registration` passes every set criterion.
    #[must_use]
    pub fn matches(&self, registration: &Registration) -> bool {
        self.school_id.map_or(true, |id| registration.school_id == id)
            && self.from.map_or(true, |from| registration.registration_date >= from)
            && self.to.map_or(true, |to| registration.registration_date <= to)
    }

    /// Number of matching registrations.
    #[must_use]
    pub fn count(&self, data: &Dataset) -> usize {
        data.registrations.iter().filter(|r| self.matches(r)).count()
    }
}
