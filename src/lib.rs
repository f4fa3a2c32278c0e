//! ledgerd - Ledger & Settlement Engine
//!
//! A single-currency balance store with an append-only movement log and a
//! monthly interest settlement job that runs exactly once per period.
//!
//! # Modules
//!
//! - [`account`] - Account records and balance mutation (AccountStore)
//! - [`ledger`] - Append-only movement log (LedgerStore)
//! - [`transfer`] - Atomic debit/credit/movement protocol
//! - [`settlement`] - Period job log, settlement engine and scheduler
//! - [`config`] - YAML application configuration
//! - [`logging`] - Rolling-file tracing setup
//! - [`db`] - PostgreSQL connection pool
//! - [`error`] - Error taxonomy

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod settlement;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountRef, AccountStore, OwnerName};
pub use config::AppConfig;
pub use db::Database;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{LedgerQuery, LedgerStore, Movement, MovementKind, NewMovement};
pub use settlement::{
    PeriodKey, PeriodStatus, SettlementEngine, SettlementJobLog, SettlementPeriod,
    SettlementScheduler, SettlementSummary,
};
pub use transfer::{TransferOutcome, TransferProtocol};
