//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod password;
pub mod requests;
pub mod result;
mod user;

pub use account::Account;
pub use password::Argon2Params;
pub use requests::{SigninRequest, SignupRequest, UpdateUserRequest};
pub use user::{User, UserProfile};
