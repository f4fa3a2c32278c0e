//! Data models for accounts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Account: a named holder of a single-currency balance
///
/// Created with balance 0; mutated only through the transfer protocol or the
/// settlement engine. Never physically deleted while a movement references it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub owner: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Check whether the balance covers a debit of `amount`
    pub fn covers(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Reference to an account by id or by owner handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    Id(Uuid),
    Owner(String),
}

impl AccountRef {
    /// Parse a reference: a UUID string resolves by id, anything else by owner
    pub fn parse(s: &str) -> Self {
        match Uuid::parse_str(s) {
            Ok(id) => AccountRef::Id(id),
            Err(_) => AccountRef::Owner(s.to_string()),
        }
    }
}

impl From<Uuid> for AccountRef {
    fn from(id: Uuid) -> Self {
        AccountRef::Id(id)
    }
}

impl From<&str> for AccountRef {
    fn from(owner: &str) -> Self {
        AccountRef::parse(owner)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => write!(f, "{}", id),
            AccountRef::Owner(owner) => write!(f, "{}", owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_ref_parse() {
        let id = Uuid::new_v4();
        assert_eq!(AccountRef::parse(&id.to_string()), AccountRef::Id(id));
        assert_eq!(
            AccountRef::parse("alice"),
            AccountRef::Owner("alice".to_string())
        );
    }

    #[test]
    fn test_account_covers() {
        let account = Account {
            id: Uuid::new_v4(),
            owner: "alice".to_string(),
            balance: Decimal::new(10050, 2), // 100.50
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(account.covers(Decimal::new(10050, 2)));
        assert!(account.covers(Decimal::new(1, 2)));
        assert!(!account.covers(Decimal::new(10051, 2)));
    }
}
