//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod auth;
pub mod logging;
pub mod migration;
mod status;
mod users;

pub use auth::{Claims, PasswordHasher, TokenService};
pub use logging::{EntryPoint, EventCount, LogEntry, LogEvent, LogFilter, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{StatusService, StatusSummary};
pub use users::{AuthOutcome, UserService};
