//! Status service - store summary for `purse status`

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Result;
use crate::ports::Repository;

pub struct StatusService {
    repository: Arc<DuckDbRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_status(&self) -> Result<StatusSummary> {
        let total_users = self.repository.count_users().await?;
        let total_accounts = self.repository.count_accounts().await?;

        Ok(StatusSummary {
            total_users,
            total_accounts,
            database_path: self
                .repository
                .db_path()
                .map(|p| p.display().to_string()),
            database_size: self.repository.get_db_size()?,
            pending_migrations: self.repository.pending_migrations()?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total_users: i64,
    pub total_accounts: i64,
    pub database_path: Option<String>,
    /// Bytes on disk, 0 for in-memory stores
    pub database_size: u64,
    pub pending_migrations: Vec<String>,
}
