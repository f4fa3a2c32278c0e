//! Input validation for owner handles and monetary amounts
//!
//! Owner handles are validated through the `OwnerName` newtype; the field is
//! private to force validation through the public API. Amounts are checked
//! for positivity and the 2-fractional-digit limit before any balance math.

use crate::error::{LedgerError, LedgerResult};
use rust_decimal::Decimal;
use std::fmt;

/// Maximum fractional digits a balance or movement amount may carry
pub const MONEY_SCALE: u32 = 2;

// ============================================================================
// OwnerName - Validated Owner Handle (Private Field)
// ============================================================================

/// Validated owner handle (guaranteed lowercase, stable character set)
///
/// Fields are private to force validation through `new()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerName(String);

impl OwnerName {
    /// Create a new validated OwnerName
    ///
    /// # Validation Rules
    /// - Lowercase letters, digits, underscore only
    /// - Length: 3-32 characters
    /// - No leading/trailing/double underscore
    ///
    /// # Errors
    /// Returns `LedgerError::Validation` if validation fails
    pub fn new(name: &str) -> LedgerResult<Self> {
        let name = name.trim();

        if name.len() < 3 || name.len() > 32 {
            return Err(LedgerError::Validation(format!(
                "owner must be 3-32 characters, got {}",
                name.len()
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(LedgerError::Validation(format!(
                "owner '{}' contains invalid characters (lowercase letters, digits, underscore only)",
                name
            )));
        }

        if name.contains("__") || name.starts_with('_') || name.ends_with('_') {
            return Err(LedgerError::Validation(format!(
                "owner '{}' has invalid underscore placement",
                name
            )));
        }

        Ok(Self(name.to_string()))
    }

    /// Get the validated owner handle as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OwnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OwnerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Amount checks
// ============================================================================

/// True if the amount carries at most [`MONEY_SCALE`] fractional digits.
/// Trailing zeros do not count ("1.500" is fine, "1.505" is not).
pub fn has_money_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Validate a movement amount: strictly positive, at most 2 fractional digits
pub fn ensure_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if !has_money_scale(amount) {
        return Err(LedgerError::Validation(format!(
            "amount {} exceeds 2 fractional digits",
            amount
        )));
    }
    Ok(())
}

/// Validate a balance target: non-negative, at most 2 fractional digits
pub fn ensure_balance(balance: Decimal) -> LedgerResult<()> {
    if balance < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "balance must not be negative, got {}",
            balance
        )));
    }
    if !has_money_scale(balance) {
        return Err(LedgerError::Validation(format!(
            "balance {} exceeds 2 fractional digits",
            balance
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_owner_name_valid() {
        assert!(OwnerName::new("alice").is_ok());
        assert!(OwnerName::new("bob_42").is_ok());
        assert!(OwnerName::new("abc").is_ok()); // minimum length
        assert!(OwnerName::new("  alice  ").is_ok()); // trimmed
    }

    #[test]
    fn test_owner_name_invalid_length() {
        assert!(OwnerName::new("ab").is_err());
        assert!(OwnerName::new("").is_err());
        assert!(OwnerName::new(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_owner_name_invalid_chars() {
        assert!(OwnerName::new("Alice").is_err()); // uppercase
        assert!(OwnerName::new("al ice").is_err());
        assert!(OwnerName::new("alice!").is_err());
        assert!(OwnerName::new("al-ice").is_err());
    }

    #[test]
    fn test_owner_name_underscore_rules() {
        assert!(OwnerName::new("_alice").is_err());
        assert!(OwnerName::new("alice_").is_err());
        assert!(OwnerName::new("al__ice").is_err());
        assert!(OwnerName::new("al_ice").is_ok());
    }

    #[test]
    fn test_owner_name_as_str() {
        let owner = OwnerName::new("alice").unwrap();
        assert_eq!(owner.as_str(), "alice");
        assert_eq!(owner.to_string(), "alice");
    }

    #[test]
    fn test_has_money_scale() {
        assert!(has_money_scale(Decimal::from_str("100").unwrap()));
        assert!(has_money_scale(Decimal::from_str("100.5").unwrap()));
        assert!(has_money_scale(Decimal::from_str("100.55").unwrap()));
        assert!(has_money_scale(Decimal::from_str("100.500").unwrap())); // trailing zeros
        assert!(!has_money_scale(Decimal::from_str("100.555").unwrap()));
        assert!(!has_money_scale(Decimal::from_str("0.001").unwrap()));
    }

    #[test]
    fn test_ensure_amount() {
        assert!(ensure_amount(Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(ensure_amount(Decimal::ZERO).is_err());
        assert!(ensure_amount(Decimal::from_str("-5").unwrap()).is_err());
        assert!(ensure_amount(Decimal::from_str("1.005").unwrap()).is_err());
    }

    #[test]
    fn test_ensure_balance() {
        assert!(ensure_balance(Decimal::ZERO).is_ok());
        assert!(ensure_balance(Decimal::from_str("10.50").unwrap()).is_ok());
        assert!(ensure_balance(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(ensure_balance(Decimal::from_str("1.005").unwrap()).is_err());
    }
}
