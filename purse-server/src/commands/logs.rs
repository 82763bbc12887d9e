//! Logs command - inspect and prune the event log

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;

use purse_core::services::logging::now_ms;
use purse_core::services::{EntryPoint, LogEntry, LogFilter, LoggingService};

use super::get_data_dir;
use crate::output::{self, format_timestamp};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent entries, newest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Only this event, e.g. signin_failed
        #[arg(short, long)]
        event: Option<String>,
        /// Only entries that carry an error
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete entries older than a number of days
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count entries per event
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl LogsCommands {
    pub fn json(&self) -> bool {
        match self {
            LogsCommands::List { json, .. }
            | LogsCommands::Clear { json, .. }
            | LogsCommands::Stats { json } => *json,
        }
    }
}

pub fn run(command: LogsCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let service = LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))?;

    match command {
        LogsCommands::List {
            limit,
            event,
            errors,
            json,
        } => {
            let entries = service.entries(&LogFilter {
                limit,
                event,
                errors_only: errors,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No log entries found.");
            } else {
                print_entries(&entries);
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let prompt = format!("Delete log entries older than {} days?", older_than_days);
            if !force && !json && !Confirm::new().with_prompt(prompt).default(false).interact()? {
                println!("Cancelled.");
                return Ok(());
            }

            let cutoff = now_ms().saturating_sub((older_than_days as i64).saturating_mul(DAY_MS));
            let deleted = service.delete_before(cutoff)?;
            if json {
                println!("{}", json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let counts = service.event_counts()?;
            let total: u64 = counts.iter().map(|c| c.count).sum();
            let size_bytes = std::fs::metadata(service.db_path())
                .map(|m| m.len())
                .unwrap_or(0);

            if json {
                println!(
                    "{}",
                    json!({
                        "total_entries": total,
                        "events": counts,
                        "database_path": service.db_path().to_string_lossy(),
                        "database_size_bytes": size_bytes,
                    })
                );
                return Ok(());
            }

            println!("{}", "Event Log".bold());
            println!("  Entries: {}", total);
            println!("  Database: {}", service.db_path().display());
            println!("  Size: {}", output::format_size(size_bytes));
            if !counts.is_empty() {
                let mut table = output::create_table();
                table.set_header(vec!["Event", "Count", "Last seen"]);
                for c in counts {
                    table.add_row(vec![
                        c.event,
                        c.count.to_string(),
                        format_timestamp(c.last_seen),
                    ]);
                }
                println!("{}", table);
            }
        }
    }

    Ok(())
}

fn print_entries(entries: &[LogEntry]) {
    let mut table = output::create_table();
    table.set_header(vec!["Time", "Source", "Event", "Route / Command", "Error"]);

    for entry in entries {
        let origin = entry
            .route
            .as_deref()
            .or(entry.command.as_deref())
            .unwrap_or("");
        let error = entry
            .error_message
            .as_deref()
            .map(|msg| msg.red().to_string())
            .unwrap_or_default();

        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.entry_point.clone(),
            entry.event.clone(),
            origin.to_string(),
            error,
        ]);
    }

    println!("{}", table);
}
