//! Command-line interface for schoolreg.
//!
//! This module provides the CLI structure for the `schoolreg` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    end_of_day, start_of_day, AuditCommand, BulkCommand, ConfigCommand, ConfirmArgs,
    ExportCommand, FeesCommand, LoginCommand, OutputArgs, RegistrationCommand,
    RegistrationEditFields, RegistrationFields, RegistrationListArgs, ReportCommand,
    SampleCommand, SchoolCommand, SchoolEditFields, SchoolFields, StatsCommand, ViewCommand,
};

use crate::auth::Section;
use crate::logging::Verbosity;

/// schoolreg - School registration, fee and audit administration
///
/// Manage participating schools, student registrations, fee settings and
/// the audit trail from the command line.
#[derive(Debug, Parser)]
#[command(name = "schoolreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a configured account
    Login(LoginCommand),

    /// Log out
    Logout(ConfirmArgs),

    /// Show the logged-in user and the sections they see
    Whoami(ViewCommand),

    /// Show headline numbers and recent registrations
    Dashboard(ViewCommand),

    /// Show per-school statistics and participation
    Stats(StatsCommand),

    /// Manage schools
    #[command(subcommand)]
    School(SchoolCommand),

    /// Manage registrations
    #[command(subcommand)]
    #[command(alias = "reg")]
    Registration(RegistrationCommand),

    /// Show or change fee settings
    #[command(subcommand)]
    Fees(FeesCommand),

    /// Update many registrations at once
    #[command(subcommand)]
    Bulk(BulkCommand),

    /// Export a CSV report
    Export(ExportCommand),

    /// Generate custom reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Write a sample CSV template for bulk import
    Sample(SampleCommand),

    /// Show the audit log
    Audit(AuditCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// The dashboard section this command belongs to, if any.
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        match self {
            Self::Dashboard(_) => Some(Section::Dashboard),
            Self::Stats(_) => Some(Section::Statistics),
            Self::School(_) => Some(Section::Schools),
            Self::Registration(_) => Some(Section::Registrations),
            Self::Fees(_) => Some(Section::Fees),
            Self::Bulk(_) | Self::Sample(_) => Some(Section::Bulk),
            Self::Audit(_) => Some(Section::Audit),
            Self::Export(_) | Self::Report(_) => Some(Section::Reports),
            Self::Login(_) | Self::Logout(_) | Self::Whoami(_) | Self::Config(_) => None,
        }
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PaymentStatus, Role};
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "schoolreg");
    }

    #[test]
    fn test_parse_login() {
        let cli = parse(&["schoolreg", "login", "-u", "principal", "--role", "coordinator"]);
        let Command::Login(login) = cli.command else {
            panic!("expected login");
        };
        assert_eq!(login.username, "principal");
        assert_eq!(login.role, Role::Coordinator);
        assert!(login.password.is_none());
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = parse(&["schoolreg", "-c", "/custom/config.toml", "-vv", "dashboard"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbosity(), Verbosity::Trace);

        let cli = parse(&["schoolreg", "dashboard", "-q"]);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_registration_list_filters() {
        let cli = parse(&[
            "schoolreg", "reg", "list", "--search", "kaur", "--school", "2", "--status", "paid",
        ]);
        let Command::Registration(RegistrationCommand::List(args)) = cli.command else {
            panic!("expected registration list");
        };
        let filter = args.filter();
        assert_eq!(filter.school_id, Some(2));
        assert_eq!(filter.payment_status, Some(PaymentStatus::Paid));
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["schoolreg", "bulk", "payments", "refunded"]).is_err());
    }

    #[test]
    fn test_parse_bulk_with_school() {
        let cli = parse(&["schoolreg", "bulk", "deliveries", "delivered", "--school", "3", "-y"]);
        assert!(matches!(
            cli.command,
            Command::Bulk(BulkCommand::Deliveries {
                school: Some(3),
                confirm: ConfirmArgs { yes: true },
                ..
            })
        ));
    }

    #[test]
    fn test_parse_report_requires_both_dates() {
        assert!(Cli::try_parse_from([
            "schoolreg", "report", "custom", "payments", "--from", "2024-01-01"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "schoolreg",
            "report",
            "custom",
            "payments",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31"
        ])
        .is_ok());
    }

    #[test]
    fn test_parse_audit_type() {
        let cli = parse(&["schoolreg", "audit", "--type", "fee-change", "--from", "2024-05-01"]);
        let Command::Audit(audit) = cli.command else {
            panic!("expected audit");
        };
        let filter = audit.filter();
        assert_eq!(filter.kind, Some(crate::model::AuditType::FeeChange));
        assert_eq!(filter.from, Some(start_of_day("2024-05-01".parse().unwrap())));
    }

    #[test]
    fn test_parse_export_stdout() {
        let cli = parse(&["schoolreg", "export", "schools", "--stdout"]);
        let Command::Export(export) = cli.command else {
            panic!("expected export");
        };
        assert!(export.output.stdout);
    }

    #[test]
    fn test_command_sections() {
        let cli = parse(&["schoolreg", "fees", "show"]);
        assert_eq!(cli.command.section(), Some(Section::Fees));
        assert!(cli.command.section().is_some_and(Section::is_admin_only));

        let cli = parse(&["schoolreg", "whoami"]);
        assert!(cli.command.section().is_none());
    }

    #[test]
    fn test_parse_config_hash_password() {
        let cli = parse(&["schoolreg", "config", "hash-password", "-p", "x"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::HashPassword { password: Some(_) })
        ));
    }
}
