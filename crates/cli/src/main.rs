use anyhow::Context;
use api_shared::{QuickReportRes, RecordRes, ReportRes};
use cartella_core::config::core_config_from_env;
use cartella_core::{FieldKind, PatientId, RecordService, ReportId, ReportService, Section};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cartella")]
#[command(about = "Cartella patient record CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the record sections and their fields
    Sections,
    /// Show a patient's record for one section
    ShowRecord {
        /// Patient identifier
        patient_id: String,
        /// Section name, e.g. vital_signs
        section: String,
    },
    /// List all section records of a patient
    ListRecords {
        /// Patient identifier
        patient_id: String,
    },
    /// Create a report from the patient's current records
    CreateReport {
        /// Patient identifier
        patient_id: String,
        /// Operator identifier (optional)
        #[arg(long)]
        operator: Option<u64>,
    },
    /// List a patient's reports, newest first
    ListReports {
        /// Patient identifier
        patient_id: String,
    },
    /// Show one report with its records
    ShowReport {
        /// Patient identifier
        patient_id: String,
        /// Report identifier
        report_id: String,
    },
    /// Delete a report
    DeleteReport {
        /// Patient identifier
        patient_id: String,
        /// Report identifier
        report_id: String,
    },
}

/// Services over the configured patient data directory.
fn services() -> anyhow::Result<(RecordService, ReportService)> {
    let cfg = Arc::new(core_config_from_env()?);
    Ok((RecordService::new(cfg.clone()), ReportService::new(cfg)))
}

fn print_sections() {
    for section in Section::ALL {
        println!("{} ({})", section, section.title());
        for field in section.fields() {
            let marker = if field.required { "*" } else { " " };
            println!("  {marker} {}: {}", field.name, describe_kind(&field.kind));
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text { max_len } => format!("text (max {max_len})"),
        FieldKind::TextList {
            max_item_len,
            min_items,
        } => format!("list of text (items max {max_item_len}, at least {min_items})"),
        FieldKind::Integer { min, max } => format!("integer {min}..={max}"),
        FieldKind::Decimal { min, max } => format!("decimal {min}..={max}"),
        FieldKind::Boolean => "boolean".into(),
        FieldKind::Date => "date (YYYY-MM-DD)".into(),
        FieldKind::DateTime => "datetime (RFC 3339)".into(),
        FieldKind::Choice(choices) => format!("one of {}", choices.join(", ")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'cartella --help' for commands");
        return Ok(());
    };

    match command {
        Commands::Sections => print_sections(),
        Commands::ShowRecord {
            patient_id,
            section,
        } => {
            let patient_id = PatientId::parse(&patient_id)?;
            let section = Section::parse(&section)?;
            let (records, _) = services()?;
            let record = records.require(patient_id, section)?;
            print_json(&RecordRes::from(record))?;
        }
        Commands::ListRecords { patient_id } => {
            let patient_id = PatientId::parse(&patient_id)?;
            let (records, _) = services()?;
            let list = records.list(patient_id)?;
            if list.is_empty() {
                println!("No records found.");
            } else {
                let list: Vec<RecordRes> = list.into_iter().map(RecordRes::from).collect();
                print_json(&list)?;
            }
        }
        Commands::CreateReport {
            patient_id,
            operator,
        } => {
            let patient_id = PatientId::parse(&patient_id)?;
            if operator == Some(0) {
                anyhow::bail!("operator must be positive");
            }
            let (_, reports) = services()?;
            let report = reports
                .create(patient_id, operator)
                .with_context(|| format!("Error creating report for patient {patient_id}"))?;
            println!(
                "Created report {} for patient {}",
                report.report_id, report.patient_id
            );
        }
        Commands::ListReports { patient_id } => {
            let patient_id = PatientId::parse(&patient_id)?;
            let (_, reports) = services()?;
            let list = reports.list(patient_id)?;
            if list.is_empty() {
                println!("No reports found.");
            } else {
                for quick in list.into_iter().map(QuickReportRes::from) {
                    println!(
                        "Report: {}, Created: {}, Operator: {}, Sections: {}",
                        quick.report_id,
                        quick.created_at,
                        quick
                            .operator_id
                            .map_or_else(|| "-".to_string(), |id| id.to_string()),
                        quick.sections.join(", ")
                    );
                }
            }
        }
        Commands::ShowReport {
            patient_id,
            report_id,
        } => {
            let patient_id = PatientId::parse(&patient_id)?;
            let report_id = ReportId::parse(&report_id)?;
            let (_, reports) = services()?;
            let report = reports.require(patient_id, report_id)?;
            print_json(&ReportRes::from(reports.resolve(report)?))?;
        }
        Commands::DeleteReport {
            patient_id,
            report_id,
        } => {
            let patient_id = PatientId::parse(&patient_id)?;
            let report_id = ReportId::parse(&report_id)?;
            let (_, reports) = services()?;
            reports.delete(patient_id, report_id)?;
            println!("Deleted report {report_id} for patient {patient_id}");
        }
    }

    Ok(())
}
