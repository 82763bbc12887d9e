//! Purse Core - business logic for user accounts and authentication
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (User, Account) and request validation
//! - **ports**: Trait definitions for external dependencies (Repository)
//! - **services**: Business logic orchestration (users, auth, status, event log)
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use domain::result::Result;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Account, Argon2Params, SigninRequest, SignupRequest, UpdateUserRequest, User, UserProfile,
};

/// Store file inside the data directory
pub const DB_FILENAME: &str = "purse.duckdb";

/// Main context for Purse operations
///
/// Built once at startup and shared by `Arc`. Holds the store, the
/// configuration and all services.
pub struct PurseContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub token_service: Arc<TokenService>,
    pub user_service: UserService,
    pub status_service: StatusService,
}

impl PurseContext {
    /// Open the context for a data directory using its settings.json
    ///
    /// A missing JWT secret is generated and saved.
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        let mut config = Config::load(data_dir)?;
        if config.ensure_jwt_secret(data_dir)? {
            tracing::info!("Generated a new JWT signing secret");
        }
        Ok(Self::with_config(data_dir, config)?)
    }

    /// Open the context with an explicit configuration
    pub fn with_config(data_dir: &Path, config: Config) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DB_FILENAME))?);
        repository.ensure_schema()?;

        Self::from_parts(config, repository)
    }

    /// Context over an in-memory store
    pub fn in_memory(config: Config) -> Result<Self> {
        let repository = Arc::new(DuckDbRepository::in_memory()?);
        repository.ensure_schema()?;
        Self::from_parts(config, repository)
    }

    fn from_parts(config: Config, repository: Arc<DuckDbRepository>) -> Result<Self> {
        let secret = config.jwt_secret.clone().unwrap_or_default();
        let token_service = Arc::new(TokenService::new(secret, config.token_ttl_secs)?);

        let user_service = UserService::new(
            repository.clone(),
            PasswordHasher::new(config.password_params),
            Arc::clone(&token_service),
        );
        let status_service = StatusService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            token_service,
            user_service,
            status_service,
        })
    }

    /// Record account events to an event log
    pub fn with_event_log(mut self, events: Arc<LoggingService>) -> Self {
        self.user_service = self.user_service.with_event_log(events);
        self
    }
}
