//! Atomic transfer protocol
//!
//! Orchestrates every value movement as one transaction: lock balances,
//! check funds, mutate balances, append the movement, commit or roll back
//! as a unit. This is the sole write path to account balances.

pub mod protocol;

pub use protocol::{TransferOutcome, TransferProtocol};
