//! Periodic interest settlement
//!
//! One run per calendar month, exactly once: the period job log is the
//! source of truth for idempotency, the engine applies interest to every
//! account in a single transaction, and the scheduler owns the two timers
//! (period trigger + backlog sweep).

pub mod engine;
pub mod log;
pub mod models;
pub mod scheduler;

pub use engine::{SettlementEngine, SettlementSummary};
pub use log::SettlementJobLog;
pub use models::{PeriodKey, PeriodStatus, SettlementPeriod};
pub use scheduler::{SchedulerConfig, SettlementScheduler};
