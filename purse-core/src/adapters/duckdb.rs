//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, User};
use crate::ports::Repository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const USER_COLUMNS: &str =
    "user_id, username, password_hash, first_name, last_name, created_at, updated_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Check if an error message is a unique or primary key violation
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key")
        || lower.contains("unique constraint")
        || lower.contains("primary key constraint")
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Database(err.to_string())
    }
}

/// DuckDB repository implementation
///
/// A single connection behind a mutex. The guard is never held across an
/// `.await`, so trait futures stay `Send`.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    ///
    /// Retries with exponential backoff on file locking errors, which happen
    /// when another process (e.g. `purse status` while the server starts)
    /// holds the file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error
            .map(Error::from)
            .unwrap_or_else(|| {
                Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
            }))
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading is off: nothing here needs extensions, and
        // cached ones in ~/.duckdb can fail code signing on macOS
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn)
            .run_pending()
            .map_err(|e| Error::database(format!("Migration failed: {}", e)))
    }

    /// Names of migrations not yet applied
    pub fn pending_migrations(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        MigrationService::new(&conn)
            .get_pending()
            .map_err(|e| Error::database(e.to_string()))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn get_db_size(&self) -> Result<u64> {
        match &self.db_path {
            Some(path) => Ok(std::fs::metadata(path)?.len()),
            None => Ok(0),
        }
    }

    fn row_to_user(row: &duckdb::Row<'_>) -> duckdb::Result<User> {
        let id_str: String = row.get(0)?;
        let created_str: String = row.get(5)?;
        let updated_str: String = row.get(6)?;

        Ok(User {
            id: parse_uuid(0, &id_str)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            created_at: parse_timestamp(5, &created_str)?,
            updated_at: parse_timestamp(6, &updated_str)?,
        })
    }

    fn row_to_account(row: &duckdb::Row<'_>) -> duckdb::Result<Account> {
        // Column order: account_id, user_id, balance (as VARCHAR), created_at
        let id_str: String = row.get(0)?;
        let user_id_str: String = row.get(1)?;
        let balance_str: String = row.get(2)?;
        let created_str: String = row.get(3)?;

        let balance = Decimal::from_str(&balance_str)
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(Account {
            id: parse_uuid(0, &id_str)?,
            user_id: parse_uuid(1, &user_id_str)?,
            balance,
            created_at: parse_timestamp(3, &created_str)?,
        })
    }
}

#[async_trait]
impl Repository for DuckDbRepository {
    // === User operations ===

    async fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO users (user_id, username, password_hash, first_name, last_name,
                                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e.to_string()) => {
                Err(Error::conflict("User already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock()?;
        optional(conn.query_row(
            &format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS),
            params![id.to_string()],
            Self::row_to_user,
        ))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        optional(conn.query_row(
            &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
            params![username],
            Self::row_to_user,
        ))
    }

    async fn update_user(&self, user: &User) -> Result<bool> {
        let conn = self.lock()?;
        // Only non-indexed columns are touched; username and id never change
        let changed = conn.execute(
            "UPDATE users
             SET password_hash = ?, first_name = ?, last_name = ?, updated_at = ?
             WHERE user_id = ?",
            params![
                user.password_hash,
                user.first_name,
                user.last_name,
                user.updated_at.to_rfc3339(),
                user.id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    async fn search_users(&self, filter: &str) -> Result<Vec<User>> {
        let conn = self.lock()?;
        // contains() takes the filter literally, so % and _ need no escaping
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users
             WHERE contains(lower(username), lower(?))
             ORDER BY username",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map(params![filter], Self::row_to_user)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Account operations ===

    async fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;

        let owner_exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE user_id = ?",
            params![account.user_id.to_string()],
            |row| row.get(0),
        )?;
        if owner_exists == 0 {
            return Err(Error::not_found("User not found"));
        }

        let result = conn.execute(
            "INSERT INTO accounts (account_id, user_id, balance, created_at)
             VALUES (?, ?, CAST(? AS DECIMAL(18, 2)), ?)",
            params![
                account.id.to_string(),
                account.user_id.to_string(),
                account.balance.to_string(),
                account.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e.to_string()) => {
                Err(Error::conflict("Account already exists for user"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_account_by_user_id(&self, user_id: Uuid) -> Result<Option<Account>> {
        let conn = self.lock()?;
        optional(conn.query_row(
            "SELECT account_id, user_id, CAST(balance AS VARCHAR), created_at
             FROM accounts WHERE user_id = ?",
            params![user_id.to_string()],
            Self::row_to_account,
        ))
    }

    async fn count_accounts(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Maintenance ===

    async fn checkpoint(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("CHECKPOINT")?;
        Ok(())
    }
}

// Helper functions

fn optional<T>(result: duckdb::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_uuid(idx: usize, s: &str) -> duckdb::Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(idx: usize, s: &str) -> duckdb::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
