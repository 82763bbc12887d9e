//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "server": { "host": "127.0.0.1", "port": 3000 },
//!   "auth": {
//!     "jwtSecret": "...",
//!     "tokenTtlSecs": 86400,
//!     "passwordHashing": { "timeCost": 2, "memoryCost": 19456, "parallelism": 1 }
//!   }
//! }
//! ```
//! Environment variables `PURSE_HOST`, `PURSE_PORT`, `PURSE_JWT_SECRET` and
//! `PURSE_TOKEN_TTL_SECS` override the file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::Argon2Params;
use crate::services::auth::MAX_TOKEN_TTL_SECS;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    server: ServerSettings,
    #[serde(default)]
    auth: AuthSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hashing: Option<Argon2Params>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Purse configuration (resolved view of settings and environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
    /// Token lifetime. `None` issues tokens without an expiry.
    pub token_ttl_secs: Option<u64>,
    pub password_params: Argon2Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: None,
            token_ttl_secs: None,
            password_params: Argon2Params::default(),
        }
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid settings file: {}", settings_path.display()))
}

impl Config {
    /// Load config from the data directory, applying environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    fn load_with_env(data_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(data_dir)?;

        let port = match env("PURSE_PORT") {
            Some(v) => v.parse().with_context(|| format!("Invalid PURSE_PORT: {}", v))?,
            None => raw.server.port.unwrap_or(DEFAULT_PORT),
        };
        let token_ttl_secs = match env("PURSE_TOKEN_TTL_SECS") {
            Some(v) => Some(
                v.parse()
                    .with_context(|| format!("Invalid PURSE_TOKEN_TTL_SECS: {}", v))?,
            ),
            None => raw.auth.token_ttl_secs,
        };
        if let Some(ttl) = token_ttl_secs.filter(|ttl| *ttl > MAX_TOKEN_TTL_SECS) {
            anyhow::bail!(
                "Token TTL {} exceeds the maximum of {} seconds",
                ttl,
                MAX_TOKEN_TTL_SECS
            );
        }

        Ok(Self {
            host: env("PURSE_HOST")
                .or_else(|| raw.server.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret: env("PURSE_JWT_SECRET").or_else(|| raw.auth.jwt_secret.clone()),
            token_ttl_secs,
            password_params: raw.auth.password_hashing.unwrap_or_default(),
        })
    }

    /// Make sure a signing secret exists, generating and saving one if not
    ///
    /// Returns true when a new secret was generated. Only `auth.jwtSecret`
    /// is written; environment overrides stay out of the file.
    pub fn ensure_jwt_secret(&mut self, data_dir: &Path) -> Result<bool> {
        if self.jwt_secret.is_some() {
            return Ok(false);
        }
        let secret = generate_secret();

        std::fs::create_dir_all(data_dir)?;
        let mut settings = read_settings(data_dir)?;
        settings.auth.jwt_secret = Some(secret.clone());
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;

        self.jwt_secret = Some(secret);
        Ok(true)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 32 random bytes, base64
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
