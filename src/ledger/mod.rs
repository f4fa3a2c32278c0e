//! Append-only movement log
//!
//! Every balance change is recorded as exactly one movement row. Rows are
//! never updated or deleted; replaying an account's movements (credits minus
//! debits) must always reproduce its stored balance.

pub mod models;
pub mod repository;

pub use models::{Movement, MovementKind, NewMovement};
pub use repository::{LedgerQuery, LedgerStore};
