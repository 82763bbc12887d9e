//! Migrate command - apply pending schema migrations

use anyhow::{Context, Result};
use serde_json::json;

use purse_core::adapters::duckdb::DuckDbRepository;
use purse_core::DB_FILENAME;

use super::get_data_dir;
use crate::output;

pub fn run(dry_run: bool, json: bool) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    let repo = DuckDbRepository::new(&data_dir.join(DB_FILENAME))?;

    if dry_run {
        let pending = repo.pending_migrations()?;
        if json {
            println!("{}", json!({ "pending": pending }));
        } else if pending.is_empty() {
            output::success("Database is up to date");
        } else {
            output::info("Pending migrations:");
            for name in &pending {
                println!("  {}", name);
            }
        }
        return Ok(());
    }

    let result = repo.run_migrations()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.applied.is_empty() {
        output::success(&format!(
            "Database is up to date ({} migrations applied)",
            result.already_applied
        ));
    } else {
        for name in &result.applied {
            println!("  applied {}", name);
        }
        output::success(&format!("Applied {} migration(s)", result.applied.len()));
    }
    Ok(())
}
