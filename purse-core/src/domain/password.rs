//! Password hashing parameters

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters (OWASP baseline)
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id cost parameters for password hashing
///
/// Only new hashes use these; verification reads the parameters embedded in
/// the stored PHC string, so changing them never locks existing users out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    pub time_cost: u32,
    /// In KiB
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Params {
    /// Cheapest parameters argon2 accepts. For tests only.
    pub fn minimal() -> Self {
        Self {
            time_cost: 1,
            memory_cost: 8,
            parallelism: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = Argon2Params::default();
        assert_eq!(params.memory_cost, 19456);
        assert_eq!(params.time_cost, 2);
        assert_eq!(params.parallelism, 1);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let params: Argon2Params =
            serde_json::from_str(r#"{"timeCost":3,"memoryCost":65536,"parallelism":4}"#).unwrap();
        assert_eq!(params.memory_cost, 65536);
    }
}
