//! User domain model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::result::{Error, Result};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const NAME_MAX_LEN: usize = 50;

/// A registered user
///
/// `password_hash` is an Argon2id PHC string. The submitted password is never
/// stored, which is also why this type is not `Serialize`: use [`UserProfile`]
/// for anything that leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Trimmed and lowercased, unique across the store
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user, normalising username and names
    pub fn new(
        username: &str,
        password_hash: impl Into<String>,
        first_name: &str,
        last_name: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: Self::normalize_username(username),
            password_hash: password_hash.into(),
            first_name: Self::normalize_name(first_name),
            last_name: Self::normalize_name(last_name),
            created_at: now,
            updated_at: now,
        }
    }

    /// Usernames are stored trimmed and lowercased
    pub fn normalize_username(username: &str) -> String {
        username.trim().to_lowercase()
    }

    pub fn normalize_name(name: &str) -> String {
        name.trim().to_string()
    }

    /// Check the stored-model constraints
    ///
    /// Request validators run on the raw input; this runs after normalisation,
    /// so "  ab  " passes the request length check but fails here.
    pub fn validate(&self) -> Result<()> {
        let username_len = self.username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username_len) {
            return Err(Error::validation(format!(
                "username must be {}-{} characters",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            )));
        }
        Self::validate_name("firstName", &self.first_name)?;
        Self::validate_name("lastName", &self.last_name)?;
        if self.password_hash.is_empty() {
            return Err(Error::validation("password is required"));
        }
        Ok(())
    }

    fn validate_name(field: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::validation(format!("{} is required", field)));
        }
        if value.chars().count() > NAME_MAX_LEN {
            return Err(Error::validation(format!(
                "{} must be at most {} characters",
                field, NAME_MAX_LEN
            )));
        }
        Ok(())
    }

    /// Apply a profile update. Names left as `None` are unchanged.
    pub fn apply_update(
        &mut self,
        password_hash: impl Into<String>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) {
        self.password_hash = password_hash.into();
        if let Some(first) = first_name {
            self.first_name = Self::normalize_name(first);
        }
        if let Some(last) = last_name {
            self.last_name = Self::normalize_name(last);
        }
        self.updated_at = Utc::now();
    }

    /// Public projection of this user
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// The non-sensitive fields of a user, as returned by search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}
