//! Account management module
//!
//! PostgreSQL-backed storage for accounts and their balances. All balance
//! writes go through the transfer protocol so that every change is paired
//! with a ledger movement in the same transaction.

pub mod models;
pub mod repository;
pub mod validation;

// Re-export commonly used types
pub use models::{Account, AccountRef};
pub use repository::AccountStore;
pub use validation::OwnerName;

// Re-export Database from top-level db module
pub use crate::db::Database;
