//! CLI command implementations

pub mod logs;
pub mod migrate;
pub mod serve;
pub mod status;
pub mod users;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use purse_core::services::{EntryPoint, LogEvent, LoggingService};
use purse_core::PurseContext;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(entry_point: EntryPoint) -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, entry_point, env!("CARGO_PKG_VERSION")).ok()
}

/// Record a failed command, ignoring any logging error
pub fn log_failure(command: &str, error: &anyhow::Error) {
    if let Some(logger) = get_logger(EntryPoint::Cli) {
        let _ = logger.log(
            LogEvent::new("command_failed")
                .with_command(command)
                .with_error(error.to_string()),
        );
    }
}

/// Data directory from PURSE_DIR, else ~/.purse
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PURSE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".purse"))
        .ok_or_else(|| anyhow!("Could not find home directory; set PURSE_DIR"))
}

/// Open the context for the data directory
pub fn get_context() -> Result<PurseContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    PurseContext::new(&data_dir).context("Failed to initialize purse context")
}
