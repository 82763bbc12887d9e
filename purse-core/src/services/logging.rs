//! Event log - account and server events in their own DuckDB file
//!
//! Events go to logs.duckdb, separate from user data. An entry holds an
//! event name plus the route or command it came from and, for failures, the
//! error text. Usernames, names, passwords and tokens are never written.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::migration::MigrationService;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp shifted left 16 bits, low bits from a wrapping sequence
fn next_id() -> u64 {
    ((now_ms() as u64) << 16) | (SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFFF)
}

/// Current unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Which surface recorded the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Server,
    Cli,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Server => "server",
            EntryPoint::Cli => "cli",
        }
    }
}

/// An event waiting to be recorded
#[derive(Debug, Clone, Default)]
pub struct LogEvent {
    pub event: String,
    pub route: Option<String>,
    pub command: Option<String>,
    pub error_message: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }

    /// HTTP route, e.g. `POST /signup`
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// A stored entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub route: Option<String>,
    pub command: Option<String>,
    pub error_message: Option<String>,
}

/// Which entries `LoggingService::entries` returns, newest first
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub limit: usize,
    /// Exact event name, e.g. `signin_failed`
    pub event: Option<String>,
    pub errors_only: bool,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            limit: 50,
            event: None,
            errors_only: false,
        }
    }
}

/// How often an event has been recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCount {
    pub event: String,
    pub count: u64,
    /// Timestamp of the newest entry, unix ms
    pub last_seen: i64,
}

/// Writes and queries logs.duckdb
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open or create logs.duckdb in the data directory and migrate it
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = data_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        MigrationService::with_migrations(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Record an event, stamped with entry point, version and OS
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_logs (id, timestamp, entry_point, app_version, platform,
                                   event, route, command, error_message)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                next_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                &event.event,
                &event.route,
                &event.command,
                &event.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn entries(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let mut sql = String::from(
            "SELECT id, timestamp, entry_point, app_version, platform, event, route, \
             command, error_message FROM sys_logs WHERE 1 = 1",
        );
        let mut args: Vec<&str> = Vec::new();
        if let Some(event) = &filter.event {
            sql.push_str(" AND event = ?");
            args.push(event.as_str());
        }
        if filter.errors_only {
            sql.push_str(" AND error_message IS NOT NULL");
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", filter.limit));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    entry_point: row.get(2)?,
                    app_version: row.get(3)?,
                    platform: row.get(4)?,
                    event: row.get(5)?,
                    route: row.get(6)?,
                    command: row.get(7)?,
                    error_message: row.get(8)?,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Per-event totals, most frequent first
    pub fn event_counts(&self) -> Result<Vec<EventCount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT event, COUNT(*) AS n, MAX(timestamp) FROM sys_logs
             GROUP BY event ORDER BY n DESC, event",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok(EventCount {
                    event: row.get(0)?,
                    count: count as u64,
                    last_seen: row.get(2)?,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(counts)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete entries older than `timestamp_ms` (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
