//! Error taxonomy for the ledger core
//!
//! Recoverable errors (validation, not-found, conflict, self-transfer,
//! insufficient funds) are reported directly to the caller. Settlement
//! failures are recorded in the period job log and healed by the sweep.

use rust_decimal::Decimal;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Source and destination accounts are the same")]
    SelfTransfer,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Settlement run failed for period {period}: {detail}")]
    SettlementFailure { period: String, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// True for errors the caller can act on (bad input, unknown account).
    /// Database and settlement failures are operational.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LedgerError::Database(_) | LedgerError::SettlementFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(LedgerError::Validation("bad amount".into()).is_recoverable());
        assert!(LedgerError::NotFound("alice".into()).is_recoverable());
        assert!(LedgerError::Conflict("alice".into()).is_recoverable());
        assert!(LedgerError::SelfTransfer.is_recoverable());
        assert!(
            LedgerError::InsufficientFunds {
                required: Decimal::new(100, 2),
                available: Decimal::ZERO,
            }
            .is_recoverable()
        );

        assert!(
            !LedgerError::SettlementFailure {
                period: "2026-08".into(),
                detail: "boom".into(),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display_messages() {
        let err = LedgerError::InsufficientFunds {
            required: Decimal::new(20000, 2),
            available: Decimal::new(1050, 2),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 200.00, available 10.50"
        );

        assert_eq!(
            LedgerError::SelfTransfer.to_string(),
            "Source and destination accounts are the same"
        );
    }
}
