//! Repository port - store abstraction

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, User};

/// Store abstraction for users and accounts
///
/// Services depend on this trait only. Each call is a single store operation;
/// atomicity beyond one statement is not promised.
#[async_trait]
pub trait Repository: Send + Sync {
    // === Users ===

    /// Insert a new user. Fails with `Error::Conflict` if the username is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Get user by ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Get user by exact (already normalised) username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Persist password and profile fields of an existing user.
    /// Returns false when no user has that ID.
    async fn update_user(&self, user: &User) -> Result<bool>;

    /// Users whose username contains `filter` case-insensitively, ordered by username.
    /// An empty filter matches everyone.
    async fn search_users(&self, filter: &str) -> Result<Vec<User>>;

    async fn count_users(&self) -> Result<i64>;

    // === Accounts ===

    /// Insert an account. Fails with `Error::NotFound` if the user does not exist
    /// and `Error::Conflict` if the user already has one.
    async fn insert_account(&self, account: &Account) -> Result<()>;

    async fn get_account_by_user_id(&self, user_id: Uuid) -> Result<Option<Account>>;

    async fn count_accounts(&self) -> Result<i64>;

    // === Maintenance ===

    /// Flush pending writes to the database file
    async fn checkpoint(&self) -> Result<()>;
}
