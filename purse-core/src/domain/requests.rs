//! Request payloads and their validators
//!
//! Each payload is checked with `validator` before any store access. Length
//! rules count characters on the raw input; the model re-checks after
//! normalisation (see [`crate::domain::User::validate`]).

use serde::Deserialize;
use validator::Validate;

use super::result::{Error, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 50, message = "firstName must be at most 50 characters"))]
    pub first_name: String,
    #[validate(length(max = 50, message = "lastName must be at most 50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Profile update. The password is always required and always replaced.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(length(max = 50, message = "firstName must be at most 50 characters"))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "lastName must be at most 50 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Run a payload's validators, mapping failures to [`Error::Validation`]
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|errors| Error::validation(format!("Incorrect inputs: {}", errors)))
}
