//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Subcommand};

use crate::audit::AuditFilter;
use crate::export::{Period, ReportKind, TemplateKind};
use crate::model::{
    AuditType, DeliveryStatus, NewRegistration, NewSchool, PaymentStatus, RegistrationUpdate,
    Role, SchoolStatus, SchoolUpdate,
};
use crate::report::{RegistrationFilter, StatsFilter};

/// Login arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Role to log in as
    #[arg(short, long, default_value = "admin")]
    pub role: Role,

    /// Password (read from stdin when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments shared by commands that only print.
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Arguments for destructive commands.
#[derive(Debug, Args)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Statistics arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Count only registrations of this school
    #[arg(long, value_name = "ID")]
    pub school: Option<u64>,

    /// Count registrations on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Count registrations on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl StatsCommand {
    /// The filter described by the arguments, if any criterion was given.
    #[must_use]
    pub fn filter(&self) -> Option<StatsFilter> {
        if self.school.is_none() && self.from.is_none() && self.to.is_none() {
            return None;
        }
        Some(StatsFilter {
            school_id: self.school,
            from: self.from.map(start_of_day),
            to: self.to.map(end_of_day),
        })
    }
}

/// School commands.
#[derive(Debug, Subcommand)]
pub enum SchoolCommand {
    /// List schools
    List(ViewCommand),

    /// Add a school
    Add(SchoolFields),

    /// Edit a school; only the given fields change
    Edit {
        /// School identifier
        id: u64,

        #[command(flatten)]
        fields: SchoolEditFields,
    },

    /// Delete a school (its registrations are kept)
    Delete {
        /// School identifier
        id: u64,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },

    /// Import schools from a CSV file
    Import {
        /// CSV file: School Name, Location, Coordinator, Email, Phone
        file: PathBuf,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

/// Fields of a new school.
#[derive(Debug, Args)]
pub struct SchoolFields {
    /// School name
    #[arg(long)]
    pub name: String,

    /// City and province
    #[arg(long)]
    pub location: String,

    /// Coordinator name
    #[arg(long)]
    pub coordinator: String,

    /// Contact email
    #[arg(long)]
    pub email: String,

    /// Contact phone
    #[arg(long)]
    pub phone: String,

    /// Participation status
    #[arg(long, default_value = "active")]
    pub status: SchoolStatus,
}

impl From<SchoolFields> for NewSchool {
    fn from(fields: SchoolFields) -> Self {
        Self {
            name: fields.name,
            location: fields.location,
            coordinator: fields.coordinator,
            email: fields.email,
            phone: fields.phone,
            status: fields.status,
        }
    }
}

/// Optional school fields for editing.
#[derive(Debug, Args)]
pub struct SchoolEditFields {
    /// School name
    #[arg(long)]
    pub name: Option<String>,

    /// City and province
    #[arg(long)]
    pub location: Option<String>,

    /// Coordinator name
    #[arg(long)]
    pub coordinator: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,

    /// Participation status
    #[arg(long)]
    pub status: Option<SchoolStatus>,
}

impl From<SchoolEditFields> for SchoolUpdate {
    fn from(fields: SchoolEditFields) -> Self {
        Self {
            name: fields.name,
            location: fields.location,
            coordinator: fields.coordinator,
            email: fields.email,
            phone: fields.phone,
            status: fields.status,
        }
    }
}

/// Registration commands.
#[derive(Debug, Subcommand)]
pub enum RegistrationCommand {
    /// List registrations, optionally filtered
    List(RegistrationListArgs),

    /// Register a student
    Add(RegistrationFields),

    /// Edit a registration; only the given fields change
    Edit {
        /// Registration identifier
        id: u64,

        #[command(flatten)]
        fields: RegistrationEditFields,
    },

    /// Delete a registration
    Delete {
        /// Registration identifier
        id: u64,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },

    /// Import registrations from a CSV file
    Import {
        /// CSV file: Student Name, School Name, Grade, Payment Status, Amount
        file: PathBuf,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

/// Registration list filters.
#[derive(Debug, Args)]
pub struct RegistrationListArgs {
    /// Case-insensitive part of the student name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this school
    #[arg(long, value_name = "ID")]
    pub school: Option<u64>,

    /// Only this payment status
    #[arg(long)]
    pub status: Option<PaymentStatus>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl RegistrationListArgs {
    /// The filter described by the arguments.
    #[must_use]
    pub fn filter(&self) -> RegistrationFilter {
        RegistrationFilter {
            search: self.search.clone(),
            school_id: self.school,
            payment_status: self.status,
        }
    }
}

/// Fields of a new registration.
#[derive(Debug, Args)]
pub struct RegistrationFields {
    /// Student name
    #[arg(long)]
    pub student: String,

    /// School identifier
    #[arg(long, value_name = "ID")]
    pub school: u64,

    /// Grade
    #[arg(long)]
    pub grade: String,

    /// Payment status
    #[arg(long, default_value = "pending")]
    pub payment: PaymentStatus,

    /// Book delivery status
    #[arg(long, default_value = "pending")]
    pub delivery: DeliveryStatus,

    /// Amount charged (defaults to registration fee plus book fee)
    #[arg(long)]
    pub amount: Option<f64>,
}

impl From<RegistrationFields> for NewRegistration {
    fn from(fields: RegistrationFields) -> Self {
        Self {
            student_name: fields.student,
            school_id: fields.school,
            grade: fields.grade,
            payment_status: fields.payment,
            book_delivery: fields.delivery,
            amount: fields.amount,
        }
    }
}

/// Optional registration fields for editing.
#[derive(Debug, Args)]
pub struct RegistrationEditFields {
    /// Student name
    #[arg(long)]
    pub student: Option<String>,

    /// School identifier
    #[arg(long, value_name = "ID")]
    pub school: Option<u64>,

    /// Grade
    #[arg(long)]
    pub grade: Option<String>,

    /// Payment status
    #[arg(long)]
    pub payment: Option<PaymentStatus>,

    /// Book delivery status
    #[arg(long)]
    pub delivery: Option<DeliveryStatus>,

    /// Amount charged
    #[arg(long)]
    pub amount: Option<f64>,
}

impl From<RegistrationEditFields> for RegistrationUpdate {
    fn from(fields: RegistrationEditFields) -> Self {
        Self {
            student_name: fields.student,
            school_id: fields.school,
            grade: fields.grade,
            payment_status: fields.payment,
            book_delivery: fields.delivery,
            amount: fields.amount,
        }
    }
}

/// Fee commands.
#[derive(Debug, Subcommand)]
pub enum FeesCommand {
    /// Show the fee settings and change history
    Show(ViewCommand),

    /// Change fee settings; only the given values change
    Set {
        /// Registration fee
        #[arg(long)]
        registration_fee: Option<f64>,

        /// Book fee
        #[arg(long)]
        book_fee: Option<f64>,

        /// Late fee
        #[arg(long)]
        late_fee: Option<f64>,

        /// Bulk discount in percent
        #[arg(long)]
        bulk_discount: Option<u32>,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

/// Bulk status update commands.
#[derive(Debug, Subcommand)]
pub enum BulkCommand {
    /// Set the payment status of many registrations
    Payments {
        /// New payment status
        status: PaymentStatus,

        /// Only registrations of this school
        #[arg(long, value_name = "ID")]
        school: Option<u64>,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },

    /// Set the book delivery status of many registrations
    Deliveries {
        /// New delivery status
        status: DeliveryStatus,

        /// Only registrations of this school
        #[arg(long, value_name = "ID")]
        school: Option<u64>,

        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

/// Where to write generated CSV.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Directory to write the file into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Print to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

/// Export arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Report to export: registrations, payments or schools
    pub kind: ReportKind,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Report commands.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Generate a report, optionally limited to a registration period
    Custom {
        /// Report type: registrations, payments or schools
        kind: ReportKind,

        /// Period start (YYYY-MM-DD)
        #[arg(long, value_name = "DATE", requires = "to")]
        from: Option<NaiveDate>,

        /// Period end (YYYY-MM-DD)
        #[arg(long, value_name = "DATE", requires = "from")]
        to: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

impl ReportCommand {
    /// The period covered, when both ends were given.
    #[must_use]
    pub fn period(&self) -> Option<Period> {
        let Self::Custom { from, to, .. } = self;
        match (from, to) {
            (Some(from), Some(to)) => Some(Period {
                start: start_of_day(*from),
                end: end_of_day(*to),
            }),
            _ => None,
        }
    }
}

/// Sample template arguments.
#[derive(Debug, Args)]
pub struct SampleCommand {
    /// Template: registrations or schools
    pub kind: TemplateKind,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Audit log arguments.
#[derive(Debug, Args)]
pub struct AuditCommand {
    /// Only entries of this type (e.g. login, fee_change, bulk_upload)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub kind: Option<AuditType>,

    /// Case-insensitive part of the user name
    #[arg(short, long)]
    pub user: Option<String>,

    /// Entries on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Entries on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Maximum number of entries
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl AuditCommand {
    /// The filter described by the arguments.
    #[must_use]
    pub fn filter(&self) -> AuditFilter {
        AuditFilter {
            kind: self.kind,
            user: self.user.clone(),
            from: self.from.map(start_of_day),
            to: self.to.map(end_of_day),
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },

    /// Print the hash to store as an account's `password_blake3`
    HashPassword {
        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// First instant of `date`, UTC.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last instant of `date`, UTC.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last).and_utc()
}
