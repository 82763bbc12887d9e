//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A balance-holding account owned by exactly one user
///
/// The store allows at most one account per user. There is no credit, debit
/// or transfer operation yet, so `balance` only ever holds its initial value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an empty account for a user
    pub fn new(user_id: Uuid) -> Self {
        Self::with_balance(user_id, Decimal::ZERO)
    }

    pub fn with_balance(user_id: Uuid, balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_defaults_to_zero() {
        let user_id = Uuid::new_v4();
        let account = Account::new(user_id);
        assert_eq!(account.user_id, user_id);
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn test_serializes_camel_case() {
        let account = Account::with_balance(Uuid::new_v4(), Decimal::new(1250, 2));
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
