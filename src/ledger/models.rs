//! Data models for ledger movements

use crate::account::validation;
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Movement kind - a fixed enumerated set; adding a kind is a schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_kind", rename_all = "snake_case")]
pub enum MovementKind {
    /// Account-to-account transfer (both sides populated)
    Transfer,
    /// Funding credit from an external source
    SystemCredit,
    /// Settlement interest credited to an account
    InterestCredit,
    /// Settlement interest debited from an account (negative rate)
    InterestDebit,
    /// Debit paid out to an external sink
    ExternalPayment,
    /// Credit received from an external source
    ExternalReceipt,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Transfer => "transfer",
            MovementKind::SystemCredit => "system_credit",
            MovementKind::InterestCredit => "interest_credit",
            MovementKind::InterestDebit => "interest_debit",
            MovementKind::ExternalPayment => "external_payment",
            MovementKind::ExternalReceipt => "external_receipt",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable record of value moving into and/or out of an account
///
/// Direction is encoded by which account field is populated, never by the
/// sign of `amount` (always positive). A null side means an external
/// source/sink.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Movement about to be appended (id and timestamp assigned on insert)
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
}

impl NewMovement {
    /// Check the movement invariants before insertion:
    /// positive 2-dp amount, at least one side, distinct sides.
    pub fn validate(&self) -> LedgerResult<()> {
        validation::ensure_amount(self.amount)?;

        if self.from_account_id.is_none() && self.to_account_id.is_none() {
            return Err(LedgerError::Validation(
                "movement must reference at least one account".to_string(),
            ));
        }

        if let (Some(from), Some(to)) = (self.from_account_id, self.to_account_id)
            && from == to
        {
            return Err(LedgerError::SelfTransfer);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn movement(from: Option<Uuid>, to: Option<Uuid>, amount: &str) -> NewMovement {
        NewMovement {
            from_account_id: from,
            to_account_id: to,
            amount: Decimal::from_str(amount).unwrap(),
            kind: MovementKind::Transfer,
            note: None,
        }
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(MovementKind::Transfer.as_str(), "transfer");
        assert_eq!(MovementKind::SystemCredit.as_str(), "system_credit");
        assert_eq!(MovementKind::InterestCredit.as_str(), "interest_credit");
        assert_eq!(MovementKind::InterestDebit.as_str(), "interest_debit");
        assert_eq!(MovementKind::ExternalPayment.as_str(), "external_payment");
        assert_eq!(MovementKind::ExternalReceipt.as_str(), "external_receipt");
    }

    #[test]
    fn test_validate_accepts_transfer() {
        let m = movement(Some(Uuid::new_v4()), Some(Uuid::new_v4()), "10.50");
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_one_sided() {
        assert!(movement(None, Some(Uuid::new_v4()), "1.00").validate().is_ok());
        assert!(movement(Some(Uuid::new_v4()), None, "1.00").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_no_accounts() {
        let err = movement(None, None, "1.00").validate().unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_same_account() {
        let id = Uuid::new_v4();
        let err = movement(Some(id), Some(id), "1.00").validate().unwrap_err();
        assert!(matches!(err, LedgerError::SelfTransfer));
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        let to = Some(Uuid::new_v4());
        assert!(movement(None, to, "0").validate().is_err());
        assert!(movement(None, to, "-1").validate().is_err());
        assert!(movement(None, to, "0.001").validate().is_err());
    }
}
