//! Auth service - password hashing and token issuance
//!
//! Passwords are hashed with Argon2id into PHC strings. Tokens are compact
//! JWTs signed with HMAC-SHA256 (`HS256`), carrying the user ID as `userId`.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::Argon2Params;

type HmacSha256 = Hmac<Sha256>;

/// Hashes and verifies user passwords
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    params: Argon2Params,
}

impl PasswordHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            None,
        )
        .map_err(|e| Error::credential(format!("Invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::credential(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC hash
    ///
    /// The comparison is constant-time. A malformed stored hash is an error,
    /// a wrong password is `Ok(false)`.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| Error::credential(format!("Stored hash is invalid: {}", e)))?;
        // Cost parameters come from the PHC string, not from self.params
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::credential(format!("Failed to verify password: {}", e))),
        }
    }
}

/// Claims carried by an issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds. Absent means the token never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

const ALGORITHM: &str = "HS256";

/// Longest token lifetime accepted, one hundred years
pub const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Issues and verifies signed tokens
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: Option<i64>,
}

impl TokenService {
    /// Create a token service. An empty secret is rejected.
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: Option<u64>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::Config("JWT secret must not be empty".to_string()));
        }
        let ttl_secs = ttl_secs
            .map(|ttl| {
                i64::try_from(ttl)
                    .ok()
                    .filter(|_| ttl <= MAX_TOKEN_TTL_SECS)
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "Token TTL {} exceeds the maximum of {} seconds",
                            ttl, MAX_TOKEN_TTL_SECS
                        ))
                    })
            })
            .transpose()?;
        Ok(Self {
            secret: secret.to_vec(),
            ttl_secs,
        })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::credential(format!("Invalid signing key: {}", e)))
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now().timestamp();
        let exp = match self.ttl_secs {
            Some(ttl) => Some(
                now.checked_add(ttl)
                    .ok_or_else(|| Error::Config("Token expiry out of range".to_string()))?,
            ),
            None => None,
        };
        let claims = Claims {
            user_id,
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Verify a token's signature and expiry, returning its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(Error::unauthorized("Malformed token")),
            };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(Error::unauthorized("Unsupported token algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Error::unauthorized("Malformed token"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::unauthorized("Invalid token signature"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if let Some(exp) = claims.exp {
            if Utc::now().timestamp() >= exp {
                return Err(Error::unauthorized("Token expired"));
            }
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::unauthorized("Malformed token"))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::unauthorized("Malformed token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Argon2Params::minimal())
    }

    #[test]
    fn test_password_hashing() {
        let hasher = hasher();
        let hash = hasher.hash("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret123"));
        assert!(hasher.verify("secret123", &hash).unwrap());
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        assert_ne!(hasher.hash("secret123").unwrap(), hasher.hash("secret123").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(hasher().verify("secret123", "plaintext").is_err());
    }

    #[test]
    fn test_token_roundtrip() {
        let tokens = TokenService::new("test-secret", None).unwrap();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = TokenService::new("secret-a", None).unwrap();
        let verifier = TokenService::new("secret-b", None).unwrap();

        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(verifier.verify(&token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let tokens = TokenService::new("test-secret", None).unwrap();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                user_id: Uuid::new_v4(),
                iat: 0,
                exp: None,
            })
            .unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert!(tokens.verify(&forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("test-secret", None).unwrap();
        let expired = tokens
            .sign(&Claims {
                user_id: Uuid::new_v4(),
                iat: 1_000,
                exp: Some(2_000),
            })
            .unwrap();
        assert!(matches!(tokens.verify(&expired), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_ttl_sets_expiry() {
        let tokens = TokenService::new("test-secret", Some(3600)).unwrap();
        let claims = tokens.verify(&tokens.issue(Uuid::new_v4()).unwrap()).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + 3600));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let tokens = TokenService::new("test-secret", None).unwrap();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(matches!(tokens.verify(token), Err(Error::Unauthorized(_))));
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenService::new("", None), Err(Error::Config(_))));
    }

    #[test]
    fn test_unrepresentable_ttl_rejected() {
        for ttl in [u64::MAX, i64::MAX as u64, MAX_TOKEN_TTL_SECS + 1] {
            assert!(matches!(
                TokenService::new("test-secret", Some(ttl)),
                Err(Error::Config(_))
            ));
        }

        let tokens = TokenService::new("test-secret", Some(MAX_TOKEN_TTL_SECS)).unwrap();
        let claims = tokens.verify(&tokens.issue(Uuid::new_v4()).unwrap()).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + MAX_TOKEN_TTL_SECS as i64));
    }
}
