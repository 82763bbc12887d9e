//! Status command - show store summary

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_data_dir};
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Purse Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Users", &status.total_users.to_string()]);
    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    table.add_row(vec![
        "Database",
        status.database_path.as_deref().unwrap_or("(in memory)"),
    ]);
    table.add_row(vec!["Size", &output::format_size(status.database_size)]);
    table.add_row(vec!["Data directory", &get_data_dir()?.display().to_string()]);
    println!("{}", table);

    if !status.pending_migrations.is_empty() {
        println!();
        output::warning(&format!(
            "{} pending migration(s), run `purse migrate`",
            status.pending_migrations.len()
        ));
    }

    Ok(())
}
