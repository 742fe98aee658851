//! CSV report tables.
//!
//! Each [`ReportKind`] projects the dataset onto a fixed set of columns. Rows
//! are written comma-joined without quoting, so a field containing a comma
//! spills into the next column exactly as the import side reads it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::Registration;

/// Headers of the registrations report.
pub const REGISTRATION_HEADERS: [&str; 7] = [
    "Student Name",
    "School",
    "Grade",
    "Payment Status",
    "Book Delivery",
    "Amount",
    "Registration Date",
];

/// Headers of the payments report.
pub const PAYMENT_HEADERS: [&str; 5] = ["Student Name", "School", "Amount", "Payment Status", "Date"];

/// Headers of the schools report.
pub const SCHOOL_HEADERS: [&str; 7] = [
    "School Name",
    "Location",
    "Coordinator",
    "Email",
    "Phone",
    "Status",
    "Registrations",
];

/// Which report to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Every registration with delivery state.
    Registrations,
    /// Every registration's payment line.
    Payments,
    /// Every school with its registration count.
    Schools,
}

impl ReportKind {
    /// All report kinds.
    pub const ALL: [Self; 3] = [Self::Registrations, Self::Payments, Self::Schools];

    /// The report's name as used in audit entries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registrations => "registrations",
            Self::Payments => "payments",
            Self::Schools => "schools",
        }
    }

    /// File name the report is saved under.
    #[must_use]
    pub fn filename(self) -> String {
        format!("{}_report.csv", self.as_str())
    }

    /// Column headers in output order.
    #[must_use]
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Registrations => &REGISTRATION_HEADERS,
            Self::Payments => &PAYMENT_HEADERS,
            Self::Schools => &SCHOOL_HEADERS,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::invalid_value("report type", s))
    }
}

/// An inclusive registration-date window for custom reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// First instant included.
    pub start: DateTime<Utc>,
    /// Last instant included.
    pub end: DateTime<Utc>,
}

impl Period {
    /// Whether `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A header row plus data rows, ready to be written as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// One entry per record.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with the given headers and rows.
    #[must_use]
    pub fn new(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows,
        }
    }

    /// Build the `kind` report over `data`.
    ///
    /// With a `period`, registration-based reports only include
    /// registrations dated inside it; the schools report ignores it.
    #[must_use]
    pub fn report(
        kind: ReportKind,
        data: &Dataset,
        period: Option<Period>,
        date_format: &str,
    ) -> Self {
        let in_period =
            |r: &&Registration| period.map_or(true, |p| p.contains(r.registration_date));

        let rows = match kind {
            ReportKind::Registrations => data
                .registrations
                .iter()
                .filter(in_period)
                .map(|r| {
                    vec![
                        r.student_name.clone(),
                        data.school_name(r.school_id).to_string(),
                        r.grade.clone(),
                        r.payment_status.to_string(),
                        r.book_delivery.to_string(),
                        format_amount(r.amount),
                        r.registration_date.format(date_format).to_string(),
                    ]
                })
                .collect(),
            ReportKind::Payments => data
                .registrations
                .iter()
                .filter(in_period)
                .map(|r| {
                    vec![
                        r.student_name.clone(),
                        data.school_name(r.school_id).to_string(),
                        format_amount(r.amount),
                        r.payment_status.to_string(),
                        r.registration_date.format(date_format).to_string(),
                    ]
                })
                .collect(),
            ReportKind::Schools => data
                .schools
                .iter()
                .map(|s| {
                    let count = data
                        .registrations
                        .iter()
                        .filter(|r| r.school_id == s.id)
                        .count();
                    vec![
                        s.name.clone(),
                        s.location.clone(),
                        s.coordinator.clone(),
                        s.email.clone(),
                        s.phone.clone(),
                        s.status.to_string(),
                        count.to_string(),
                    ]
                })
                .collect(),
        };

        Self::new(kind.headers(), rows)
    }

    /// Render the table as unquoted CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::internal(format!("failed to flush CSV: {}", e.error())))?;
        String::from_utf8(bytes).map_err(|e| Error::internal(format!("CSV is not UTF-8: {e}")))
    }
}

/// Which import template to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Bulk registration import.
    Registrations,
    /// Bulk school import.
    Schools,
}

impl TemplateKind {
    /// File name the template is saved under.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::Registrations => "sample_registrations.csv",
            Self::Schools => "sample_schools.csv",
        }
    }

    /// The template: import headers plus example rows.
    #[must_use]
    pub fn table(self) -> Table {
        let owned = |row: &[&str]| row.iter().map(ToString::to_string).collect::<Vec<_>>();
        match self {
            Self::Registrations => Table::new(
                &["Student Name", "School Name", "Grade", "Payment Status", "Amount"],
                vec![
                    owned(&["John Smith", "Guru Nanak Academy", "8", "paid", "40.00"]),
                    owned(&["Jane Doe", "Khalsa School", "9", "pending", "40.00"]),
                ],
            ),
            // The location has no comma so the row imports cleanly.
            Self::Schools => Table::new(
                &["School Name", "Location", "Coordinator", "Email", "Phone"],
                vec![owned(&[
                    "Sample School",
                    "City Province",
                    "Coordinator Name",
                    "email@example.com",
                    "123-456-7890",
                ])],
            ),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registrations" => Ok(Self::Registrations),
            "schools" => Ok(Self::Schools),
            _ => Err(Error::invalid_value("template", s)),
        }
    }
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
