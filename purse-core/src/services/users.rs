//! User service - signup, signin, profile update and search
//!
//! Every operation is validate -> one store operation -> one result. The
//! caller turns that result into exactly one response.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::requests::validate_request;
use crate::domain::result::{Error, Result};
use crate::domain::{SigninRequest, SignupRequest, UpdateUserRequest, User, UserProfile};
use crate::ports::Repository;

use super::auth::{PasswordHasher, TokenService};
use super::logging::{LogEvent, LoggingService};

/// Outcome of a successful signup or signin
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub user_id: Uuid,
    pub token: String,
}

/// User account orchestration
pub struct UserService {
    repository: Arc<dyn Repository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    events: Option<Arc<LoggingService>>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn Repository>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            events: None,
        }
    }

    /// Record account events to the event log
    pub fn with_event_log(mut self, events: Arc<LoggingService>) -> Self {
        self.events = Some(events);
        self
    }

    /// Event logging never fails the operation it describes
    fn record(&self, event: LogEvent) {
        if let Some(events) = &self.events {
            if let Err(e) = events.log(event) {
                tracing::warn!("Failed to write event log: {}", e);
            }
        }
    }

    /// Argon2 is memory-hard; keep it off the async workers
    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Other(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .map_err(|e| Error::Other(format!("Password verification task failed: {}", e)))?
    }

    /// Register a new user and issue a token for it
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthOutcome> {
        validate_request(request)?;

        let username = User::normalize_username(&request.username);
        if self.repository.get_user_by_username(&username).await?.is_some() {
            self.record(LogEvent::new("signup_conflict").with_route("POST /signup"));
            return Err(Error::conflict("User already exists"));
        }

        let password_hash = self.hash_password(&request.password).await?;
        let user = User::new(
            &request.username,
            password_hash,
            &request.first_name,
            &request.last_name,
        );
        user.validate()?;

        // A concurrent signup can still win the race; the unique index reports it
        self.repository.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, "User created");
        self.record(LogEvent::new("user_signed_up").with_route("POST /signup"));

        Ok(AuthOutcome {
            user_id: user.id,
            token: self.tokens.issue(user.id)?,
        })
    }

    /// Check credentials and issue a token
    ///
    /// Unknown usernames and wrong passwords both come back as `NotFound`.
    pub async fn signin(&self, request: &SigninRequest) -> Result<AuthOutcome> {
        validate_request(request)?;

        let username = User::normalize_username(&request.username);
        let user = self.repository.get_user_by_username(&username).await?;
        let verified = match &user {
            Some(user) => {
                self.verify_password(&request.password, &user.password_hash)
                    .await?
            }
            None => false,
        };
        let user = match user {
            Some(user) if verified => user,
            _ => {
                self.record(LogEvent::new("signin_failed").with_route("POST /signin"));
                return Err(Error::not_found("User not found"));
            }
        };

        tracing::debug!(user_id = %user.id, "User signed in");
        self.record(LogEvent::new("signin_succeeded").with_route("POST /signin"));

        Ok(AuthOutcome {
            user_id: user.id,
            token: self.tokens.issue(user.id)?,
        })
    }

    /// Update the caller's own password and, optionally, names
    pub async fn update(&self, user_id: Uuid, request: &UpdateUserRequest) -> Result<UserProfile> {
        validate_request(request)?;

        let mut user = self
            .repository
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let password_hash = self.hash_password(&request.password).await?;
        user.apply_update(
            password_hash,
            request.first_name.as_deref(),
            request.last_name.as_deref(),
        );
        user.validate()?;

        if !self.repository.update_user(&user).await? {
            return Err(Error::not_found("User not found"));
        }
        tracing::info!(user_id = %user.id, "User updated");
        self.record(LogEvent::new("user_updated").with_route("PUT /"));

        Ok(user.profile())
    }

    /// Users whose username contains `filter`, case-insensitively
    pub async fn search(&self, filter: Option<&str>) -> Result<Vec<UserProfile>> {
        let filter = filter.map(str::trim).unwrap_or_default();
        let users = self.repository.search_users(filter).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Token verification for callers that only hold the user service
    pub fn authenticate(&self, token: &str) -> Result<Uuid> {
        Ok(self.tokens.verify(token)?.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::Argon2Params;

    fn service() -> (UserService, Arc<DuckDbRepository>) {
        let repo = Arc::new(DuckDbRepository::in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let tokens = Arc::new(TokenService::new("test-secret", None).unwrap());
        let service = UserService::new(
            repo.clone(),
            PasswordHasher::new(Argon2Params::minimal()),
            tokens,
        );
        (service, repo)
    }

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "secret123".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_token() {
        let (service, repo) = service();
        let outcome = service.signup(&signup_request("Alice")).await.unwrap();

        assert_eq!(service.authenticate(&outcome.token).unwrap(), outcome.user_id);

        let stored = repo.get_user_by_id(outcome.user_id).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.first_name, "Alice");
        assert_ne!(stored.password_hash, "secret123");
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_conflict() {
        let (service, repo) = service();
        service.signup(&signup_request("alice")).await.unwrap();

        let err = service.signup(&signup_request(" ALICE")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signup_invalid_creates_nothing() {
        let (service, repo) = service();
        let mut request = signup_request("al");
        assert!(matches!(service.signup(&request).await, Err(Error::Validation(_))));

        // Passes the raw length check but normalises to two characters
        request.username = "  ab  ".to_string();
        assert!(matches!(service.signup(&request).await, Err(Error::Validation(_))));

        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signin() {
        let (service, _repo) = service();
        let created = service.signup(&signup_request("alice")).await.unwrap();

        let ok = service
            .signin(&SigninRequest {
                username: "ALICE".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user_id, created.user_id);

        let wrong = service
            .signin(&SigninRequest {
                username: "alice".into(),
                password: "not-the-password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, Error::NotFound(_)));

        let unknown = service
            .signin(&SigninRequest {
                username: "nobody".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_password_only_keeps_names() {
        let (service, _repo) = service();
        let created = service.signup(&signup_request("alice")).await.unwrap();

        let profile = service
            .update(
                created.user_id,
                &UpdateUserRequest {
                    first_name: None,
                    last_name: None,
                    password: "new-secret".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.first_name, "Alice");
        assert_eq!(profile.last_name, "Smith");

        // Old password no longer works, new one does
        let old = service
            .signin(&SigninRequest {
                username: "alice".into(),
                password: "secret123".into(),
            })
            .await;
        assert!(old.is_err());
        let new = service
            .signin(&SigninRequest {
                username: "alice".into(),
                password: "new-secret".into(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_update_rejects_short_password_and_unknown_user() {
        let (service, _repo) = service();
        let created = service.signup(&signup_request("alice")).await.unwrap();

        let short = UpdateUserRequest {
            first_name: Some("Bob".into()),
            last_name: None,
            password: "123".into(),
        };
        assert!(matches!(
            service.update(created.user_id, &short).await,
            Err(Error::Validation(_))
        ));

        let valid = UpdateUserRequest {
            first_name: Some("Bob".into()),
            last_name: None,
            password: "secret123".into(),
        };
        assert!(matches!(
            service.update(Uuid::new_v4(), &valid).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_hashing_yields_to_other_tasks() {
        let (service, _repo) = service();
        service.signup(&signup_request("alice")).await.unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        // On a single-threaded runtime the ticker only runs if signin yields
        service
            .signin(&SigninRequest {
                username: "alice".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert!(ticks.load(Ordering::SeqCst) > 0);
        ticker.abort();
    }

    #[tokio::test]
    async fn test_search_projects_matches() {
        let (service, _repo) = service();
        for name in ["alice", "Malcolm", "bob"] {
            service.signup(&signup_request(name)).await.unwrap();
        }

        let found = service.search(Some("AL")).await.unwrap();
        let names: Vec<&str> = found.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "malcolm"]);

        assert_eq!(service.search(None).await.unwrap().len(), 3);
    }
}
