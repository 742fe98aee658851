//! Bulk CSV import parsing.
//!
//! The first line is a header and is skipped. Fields are comma-separated,
//! never quoted, and trimmed. Rows that are short or hold unusable values
//! are skipped; the parser reports only the rows it could read.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::model::PaymentStatus;

/// A registration row: student, school name, grade, payment status, amount.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRow {
    /// Student name.
    pub student_name: String,
    /// Name of the school, matched exactly against existing schools.
    pub school_name: String,
    /// Grade.
    pub grade: String,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Amount charged.
    pub amount: f64,
}

/// A school row: name, location, coordinator, email, phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolRow {
    /// School name.
    pub name: String,
    /// Location.
    pub location: String,
    /// Coordinator name.
    pub coordinator: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
}

/// Read a CSV file into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn read_csv_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Parse registration rows, skipping any that cannot be used.
#[must_use]
pub fn parse_registrations(text: &str) -> Vec<RegistrationRow> {
    records(text)
        .filter_map(|(line, fields)| {
            let [student_name, school_name, grade, status, amount] = take::<5>(&fields)?;
            let row = registration_row(student_name, school_name, grade, status, amount);
            if row.is_none() {
                debug!("Skipping registration row {}: unusable values", line);
            }
            row
        })
        .collect()
}

/// Parse school rows, skipping any that are short or blank.
#[must_use]
pub fn parse_schools(text: &str) -> Vec<SchoolRow> {
    records(text)
        .filter_map(|(line, fields)| {
            let [name, location, coordinator, email, phone] = take::<5>(&fields)?;
            if name.is_empty() {
                debug!("Skipping school row {}: blank name", line);
                return None;
            }
            Some(SchoolRow {
                name: name.to_string(),
                location: location.to_string(),
                coordinator: coordinator.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
            })
        })
        .collect()
}

fn registration_row(
    student_name: &str,
    school_name: &str,
    grade: &str,
    status: &str,
    amount: &str,
) -> Option<RegistrationRow> {
    if student_name.is_empty() {
        return None;
    }
    let payment_status = status.parse().ok()?;
    let amount: f64 = amount.parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Some(RegistrationRow {
        student_name: student_name.to_string(),
        school_name: school_name.to_string(),
        grade: grade.to_string(),
        payment_status,
        amount,
    })
}

/// Data records with their 1-based line numbers. Unreadable records are skipped.
fn records(text: &str) -> impl Iterator<Item = (u64, csv::StringRecord)> + '_ {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
        .into_records()
        .filter_map(|record| match record {
            Ok(record) => {
                let line = record.position().map_or(0, csv::Position::line);
                Some((line, record))
            }
            Err(e) => {
                debug!("Skipping unreadable CSV record: {}", e);
                None
            }
        })
        .filter(|(_, record)| !record.iter().all(str::is_empty))
}

/// The first `N` fields of `record`, or `None` if it is shorter.
fn take<const N: usize>(record: &csv::StringRecord) -> Option<[&str; N]> {
    if record.len() < N {
        debug!("Skipping short CSV row: {} of {} fields", record.len(), N);
        return None;
    }
    let mut fields = [""; N];
    for (slot, value) in fields.iter_mut().zip(record.iter()) {
        *slot = value;
    }
    Some(fields)
}
