//! `schoolreg` - CLI for school registration administration
//!
//! This binary provides the command-line interface over the registry:
//! sessions, schools, registrations, fees, bulk updates, reports and the
//! audit log.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use schoolreg::auth::{hash_password, Credentials};
use schoolreg::cli::{
    AuditCommand, BulkCommand, Cli, Command, ConfigCommand, ConfirmArgs, FeesCommand,
    LoginCommand, OutputArgs, RegistrationCommand, ReportCommand, SchoolCommand, StatsCommand,
};
use schoolreg::confirm::{AssumeYes, Confirm, Prompt};
use schoolreg::export::Table;
use schoolreg::model::FeeSettings;
use schoolreg::report::{
    payment_breakdown, recent_registrations, BookDeliveryStats, DashboardStats,
    ParticipationAnalytics, SchoolStats,
};
use schoolreg::{init_logging, Config, Error, Registry, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Configuration commands never touch the database
    let result = match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        command => run(&config, command).await,
    };

    match result {
        Err(e) if e.downcast_ref::<Error>().is_some_and(Error::is_cancelled) => {
            eprintln!("{e}");
            Ok(())
        }
        other => other,
    }
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let storage = Storage::open(config.database_path())?;
    let mut registry = Registry::open(storage, &config.registry_options())?;
    warn_if_restricted(&registry, &command);

    match command {
        Command::Login(login_cmd) => handle_login(&mut registry, config, login_cmd),
        Command::Logout(args) => {
            let user = registry.logout(&mut *confirmer(&args))?;
            println!("Logged out {}.", user.username);
            Ok(())
        }
        Command::Whoami(view) => handle_whoami(&registry, view.json),
        Command::Dashboard(view) => handle_dashboard(&registry, config, view.json),
        Command::Stats(stats_cmd) => handle_stats(&registry, &stats_cmd),
        Command::School(school_cmd) => handle_school(&mut registry, config, school_cmd).await,
        Command::Registration(reg_cmd) => {
            handle_registration(&mut registry, config, reg_cmd).await
        }
        Command::Fees(fees_cmd) => handle_fees(&mut registry, config, fees_cmd),
        Command::Bulk(bulk_cmd) => handle_bulk(&mut registry, bulk_cmd),
        Command::Export(export_cmd) => {
            let table = registry.export_report(export_cmd.kind, &config.display.date_format)?;
            write_table(&table, &export_cmd.output, &export_cmd.kind.filename()).await
        }
        Command::Report(report_cmd) => {
            let period = report_cmd.period();
            let ReportCommand::Custom { kind, output, .. } = report_cmd;
            let table =
                registry.generate_custom_report(kind, period, &config.display.date_format)?;
            write_table(&table, &output, &kind.filename()).await
        }
        Command::Sample(sample_cmd) => {
            let kind = sample_cmd.kind;
            write_table(&kind.table(), &sample_cmd.output, kind.filename()).await
        }
        Command::Audit(audit_cmd) => handle_audit(&registry, config, &audit_cmd),
        Command::Config(config_cmd) => handle_config(config, config_cmd),
    }
}

/// Warn when a coordinator runs a command from an administrator section.
fn warn_if_restricted(registry: &Registry, command: &Command) {
    let (Some(section), Some(user)) = (command.section(), registry.current_user()) else {
        return;
    };
    if !user.role.can_view(section) {
        warn!(
            "The {} section is reserved for administrators; {} is a {}",
            section, user.username, user.role
        );
    }
}

fn confirmer(args: &ConfirmArgs) -> Box<dyn Confirm> {
    if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Prompt::stdio())
    }
}

/// Read a secret from stdin after prompting on stderr.
fn read_secret(prompt: &str) -> anyhow::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}: ")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn handle_login(
    registry: &mut Registry,
    config: &Config,
    cmd: LoginCommand,
) -> anyhow::Result<()> {
    let authenticator = config.authenticator();
    if authenticator.is_empty() {
        warn!(
            "No accounts configured; add [[auth.accounts]] to {}",
            Config::default_config_path().display()
        );
    }

    let password = match cmd.password {
        Some(password) => password,
        None => read_secret("Password")?,
    };
    let credentials = Credentials::new(cmd.username, password, cmd.role);
    let user = registry.login(&authenticator, &credentials)?;

    println!("Logged in as {} ({}).", user.username, user.role);
    Ok(())
}

fn handle_whoami(registry: &Registry, json: bool) -> anyhow::Result<()> {
    let user = registry.current_user();
    let sections: Vec<String> = user
        .map(|u| u.role.visible_sections())
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect();
    let stats = registry.storage().stats()?;

    if json {
        let status = serde_json::json!({
            "user": user,
            "sections": sections,
            "database_path": registry.storage().path(),
            "entries": stats.entries,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match user {
        Some(user) => {
            println!("User:      {}", user.username);
            println!("Role:      {}", user.role);
            println!("Sections:  {}", sections.join(", "));
        }
        None => println!("Not logged in."),
    }
    println!(
        "Database:  {} ({} entries, {} bytes)",
        registry.storage().path().display(),
        stats.entries,
        stats.db_size_bytes
    );
    if let Some(last_write) = stats.last_write {
        println!("Modified:  {}", last_write.to_rfc3339());
    }
    Ok(())
}

fn handle_dashboard(registry: &Registry, config: &Config, json: bool) -> anyhow::Result<()> {
    let data = registry.data();
    let stats = DashboardStats::compute(data);
    let breakdown = payment_breakdown(data);
    let recent = recent_registrations(data, config.display.recent_limit);

    if json {
        let dashboard = serde_json::json!({
            "stats": stats,
            "paymentStatus": breakdown,
            "recentRegistrations": recent,
        });
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!("Dashboard");
    println!("=========");
    println!("Total registrations:  {}", stats.total_registrations);
    println!("Active schools:       {}", stats.active_schools);
    println!("Total revenue:        ${:.2}", stats.total_revenue);
    println!("Pending payments:     {}", stats.pending_payments);
    println!();
    println!("Payment status:");
    for share in &breakdown {
        println!(
            "  {:<8} {:>4} ({:.1}%)",
            share.status, share.count, share.percent
        );
    }
    println!();
    println!("Recent registrations:");
    for entry in &recent {
        let reg = entry.registration;
        println!(
            "  {}  {:<24} {:<28} {}",
            reg.registration_date.format(&config.display.date_format),
            reg.student_name,
            entry.school_name,
            reg.payment_status
        );
    }
    Ok(())
}

fn handle_stats(registry: &Registry, cmd: &StatsCommand) -> anyhow::Result<()> {
    let data = registry.data();
    let schools = SchoolStats::compute_all(data);
    let participation = ParticipationAnalytics::compute(data);
    let delivery = BookDeliveryStats::compute(data);
    let filtered = cmd.filter().map(|filter| filter.count(data));

    if cmd.json {
        let stats = serde_json::json!({
            "schools": schools,
            "participation": participation,
            "bookDelivery": delivery,
            "filteredCount": filtered,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{:<4} {:<32} {:>6} {:>10} {:>5} {:>7} {:>9}",
        "ID", "School", "Regs", "Revenue", "Paid", "Unpaid", "Delivered"
    );
    for s in &schools {
        println!(
            "{:<4} {:<32} {:>6} {:>10.2} {:>5} {:>7} {:>9}",
            s.school_id,
            s.name,
            s.registrations,
            s.revenue,
            s.paid,
            s.unpaid,
            s.delivery_ratio()
        );
    }
    println!();
    println!("Participation");
    println!("  Total participants:  {}", participation.total_participants);
    println!("  Active schools:      {}", participation.active_schools);
    println!("  Average per school:  {:.1}", participation.average_per_school);
    println!("  Participation rate:  {:.1}%", participation.participation_rate);
    println!();
    println!("Book delivery");
    println!(
        "  Delivered:  {} ({:.1}%)",
        delivery.delivered, delivery.delivered_percent
    );
    println!(
        "  Pending:    {} ({:.1}%)",
        delivery.pending, delivery.pending_percent
    );
    if let Some(count) = filtered {
        println!();
        println!("Matching registrations: {count}");
    }
    Ok(())
}

async fn handle_school(
    registry: &mut Registry,
    config: &Config,
    cmd: SchoolCommand,
) -> anyhow::Result<()> {
    match cmd {
        SchoolCommand::List(view) => {
            let schools = &registry.data().schools;
            if view.json {
                println!("{}", serde_json::to_string_pretty(schools)?);
            } else {
                for school in schools {
                    println!(
                        "{:<4} {:<32} {:<20} {:<20} {:<28} {:<14} {:<8} {}",
                        school.id,
                        school.name,
                        school.location,
                        school.coordinator,
                        school.email,
                        school.phone,
                        school.status,
                        school.created_date.format(&config.display.date_format)
                    );
                }
            }
        }
        SchoolCommand::Add(fields) => {
            let school = registry.create_school(fields.into())?;
            println!("Added school {} ({}).", school.id, school.name);
        }
        SchoolCommand::Edit { id, fields } => {
            let school = registry.update_school(id, &fields.into())?;
            println!("Updated school {} ({}).", school.id, school.name);
        }
        SchoolCommand::Delete { id, confirm } => {
            let school = registry.delete_school(id, &mut *confirmer(&confirm))?;
            println!("Deleted school {} ({}).", school.id, school.name);
        }
        SchoolCommand::Import { file, confirm } => {
            let text = schoolreg::import::read_csv_file(&file).await?;
            let added = registry.bulk_import_schools(&text, &mut *confirmer(&confirm))?;
            println!("Successfully imported {added} schools.");
        }
    }
    Ok(())
}

async fn handle_registration(
    registry: &mut Registry,
    config: &Config,
    cmd: RegistrationCommand,
) -> anyhow::Result<()> {
    match cmd {
        RegistrationCommand::List(args) => {
            let data = registry.data();
            let registrations = args.filter().apply(data);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&registrations)?);
            } else {
                for reg in registrations {
                    println!(
                        "{:<4} {:<24} {:<28} {:<5} {:<8} {:<9} {:>8.2} {}",
                        reg.id,
                        reg.student_name,
                        data.school_name(reg.school_id),
                        reg.grade,
                        reg.payment_status,
                        reg.book_delivery,
                        reg.amount,
                        reg.registration_date.format(&config.display.date_format)
                    );
                }
            }
        }
        RegistrationCommand::Add(fields) => {
            let reg = registry.create_registration(fields.into())?;
            println!(
                "Registered {} (id {}, ${:.2}).",
                reg.student_name, reg.id, reg.amount
            );
        }
        RegistrationCommand::Edit { id, fields } => {
            let reg = registry.update_registration(id, &fields.into())?;
            println!("Updated registration {} ({}).", reg.id, reg.student_name);
        }
        RegistrationCommand::Delete { id, confirm } => {
            let reg = registry.delete_registration(id, &mut *confirmer(&confirm))?;
            println!("Deleted registration {} ({}).", reg.id, reg.student_name);
        }
        RegistrationCommand::Import { file, confirm } => {
            let text = schoolreg::import::read_csv_file(&file).await?;
            let added = registry.bulk_import_registrations(&text, &mut *confirmer(&confirm))?;
            println!("Successfully imported {added} registrations.");
        }
    }
    Ok(())
}

fn handle_fees(registry: &mut Registry, config: &Config, cmd: FeesCommand) -> anyhow::Result<()> {
    match cmd {
        FeesCommand::Show(view) => {
            let data = registry.data();
            if view.json {
                let fees = serde_json::json!({
                    "feeSettings": data.fee_settings,
                    "feeHistory": data.fee_history,
                });
                println!("{}", serde_json::to_string_pretty(&fees)?);
                return Ok(());
            }

            let fees = &data.fee_settings;
            println!("Fee Settings");
            println!("============");
            println!("  Registration fee:  ${:.2}", fees.registration_fee);
            println!("  Book fee:          ${:.2}", fees.book_fee);
            println!("  Late fee:          ${:.2}", fees.late_fee);
            println!("  Bulk discount:     {}%", fees.bulk_discount);
            if !data.fee_history.is_empty() {
                println!();
                println!("History");
                for entry in data.fee_history.iter().rev() {
                    println!(
                        "  {}  {:<16} {} -> {}  ({})",
                        entry.date.format(&config.display.date_format),
                        entry.field,
                        entry.old_value,
                        entry.new_value,
                        entry.user
                    );
                }
            }
        }
        FeesCommand::Set {
            registration_fee,
            book_fee,
            late_fee,
            bulk_discount,
            confirm,
        } => {
            let current = registry.data().fee_settings;
            let next = FeeSettings {
                registration_fee: registration_fee.unwrap_or(current.registration_fee),
                book_fee: book_fee.unwrap_or(current.book_fee),
                late_fee: late_fee.unwrap_or(current.late_fee),
                bulk_discount: bulk_discount.unwrap_or(current.bulk_discount),
            };
            let changes = registry.update_fee_settings(next, &mut *confirmer(&confirm))?;
            if changes.is_empty() {
                println!("Fee settings unchanged.");
            }
            for change in &changes {
                println!("{}", change.describe());
            }
        }
    }
    Ok(())
}

fn handle_bulk(registry: &mut Registry, cmd: BulkCommand) -> anyhow::Result<()> {
    match cmd {
        BulkCommand::Payments {
            status,
            school,
            confirm,
        } => {
            let updated = registry.bulk_update_payments(status, school, &mut *confirmer(&confirm))?;
            println!("Updated {updated} payment statuses to {status}.");
        }
        BulkCommand::Deliveries {
            status,
            school,
            confirm,
        } => {
            let updated =
                registry.bulk_update_deliveries(status, school, &mut *confirmer(&confirm))?;
            println!("Updated {updated} delivery statuses to {status}.");
        }
    }
    Ok(())
}

fn handle_audit(registry: &Registry, config: &Config, cmd: &AuditCommand) -> anyhow::Result<()> {
    let mut entries = cmd.filter().apply(&registry.data().audit_logs);
    if let Some(limit) = cmd.limit {
        entries.truncate(limit);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let format = format!("{} %H:%M:%S", config.display.date_format);
    for entry in entries {
        println!(
            "{}  {:<12} {:<12} {}",
            entry.timestamp.format(&format),
            entry.kind,
            entry.user,
            entry.description
        );
    }
    Ok(())
}

/// Write `table` as CSV into the output directory, or to stdout.
async fn write_table(table: &Table, output: &OutputArgs, filename: &str) -> anyhow::Result<()> {
    let csv = table.to_csv()?;
    if output.stdout {
        print!("{csv}");
        return Ok(());
    }

    let path = output.output.join(filename);
    write_file(&path, &csv).await?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    println!("{}", path.display());
    Ok(())
}

async fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed sample data:   {}", config.storage.seed_sample_data);
                println!();
                println!("[Fees]");
                println!("  Registration fee:   {}", config.fees.registration_fee);
                println!("  Book fee:           {}", config.fees.book_fee);
                println!("  Late fee:           {}", config.fees.late_fee);
                println!("  Bulk discount:      {}%", config.fees.bulk_discount);
                println!();
                println!("[Auth]");
                println!("  Accounts:           {}", config.auth.accounts.len());
                for account in &config.auth.accounts {
                    println!("    {} ({})", account.username, account.role);
                }
                println!();
                println!("[Display]");
                println!("  Recent limit:       {}", config.display.recent_limit);
                println!("  Date format:        {}", config.display.date_format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
        ConfigCommand::HashPassword { password } => {
            let password = match password {
                Some(password) => password,
                None => read_secret("Password")?,
            };
            println!("{}", hash_password(&password));
        }
    }
    Ok(())
}
