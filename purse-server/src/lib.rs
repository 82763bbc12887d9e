//! Purse Server - HTTP API over purse-core
//!
//! - **routes**: `/api/v1/user` handlers
//! - **middleware**: bearer token authentication
//! - **error**: core errors to HTTP responses
//! - **server**: listener lifecycle and graceful shutdown

pub mod error;
pub mod extract;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
