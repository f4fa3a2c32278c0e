//! Settlement period state machine and calendar keys
//!
//! Status IDs are stored as SMALLINT in PostgreSQL. COMPLETED is terminal;
//! FAILED stays retryable forever (the sweep will keep picking it up).

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Settlement period status
///
/// Transitions: PENDING -> PROCESSING -> COMPLETED | FAILED,
/// FAILED -> PROCESSING (retry). No transition leaves COMPLETED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum PeriodStatus {
    /// Log row exists but no run has claimed it yet
    Pending = 0,

    /// A run owns this period right now
    Processing = 10,

    /// Terminal: interest disbursed, aggregates recorded
    Completed = 20,

    /// Last run aborted; eligible for the sweep
    Failed = -10,
}

impl PeriodStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PeriodStatus::Completed)
    }

    /// Check if the sweep should retry a period in this state
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, PeriodStatus::Pending | PeriodStatus::Failed)
    }

    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(PeriodStatus::Pending),
            10 => Some(PeriodStatus::Processing),
            20 => Some(PeriodStatus::Completed),
            -10 => Some(PeriodStatus::Failed),
            _ => None,
        }
    }

    /// Check whether `self -> to` is an allowed transition
    pub fn can_transition(&self, to: PeriodStatus) -> bool {
        matches!(
            (self, to),
            (PeriodStatus::Pending, PeriodStatus::Processing)
                | (PeriodStatus::Failed, PeriodStatus::Processing)
                | (PeriodStatus::Processing, PeriodStatus::Completed)
                | (PeriodStatus::Processing, PeriodStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Pending => "PENDING",
            PeriodStatus::Processing => "PROCESSING",
            PeriodStatus::Completed => "COMPLETED",
            PeriodStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Calendar-month settlement key, e.g. "2026-08"
///
/// Fields are private to force validation through `new()`/`parse()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> LedgerResult<Self> {
        if !(1..=12).contains(&month) || !(2000..=9999).contains(&year) {
            return Err(LedgerError::Validation(format!(
                "invalid settlement period {:04}-{:02}",
                year, month
            )));
        }
        Ok(Self(format!("{:04}-{:02}", year, month)))
    }

    /// Parse a "YYYY-MM" token
    pub fn parse(s: &str) -> LedgerResult<Self> {
        let (year, month) = s
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .ok_or_else(|| {
                LedgerError::Validation(format!("invalid settlement period '{}'", s))
            })?;
        // Re-format so "2026-8" and "2026-08" normalize identically
        Self::new(year, month)
    }

    /// The period a given date falls in
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// The period the current wall clock falls in
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement period log row - one per period, updated in place as the run
/// progresses, never deleted
#[derive(Debug, Clone)]
pub struct SettlementPeriod {
    pub id: Uuid,
    pub period: String,
    pub status: PeriodStatus,
    pub total_accounts: i64,
    pub processed_count: i64,
    /// Signed sum of all interest applied in the completed run
    pub total_interest: Decimal,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_id_roundtrip() {
        let statuses = [
            PeriodStatus::Pending,
            PeriodStatus::Processing,
            PeriodStatus::Completed,
            PeriodStatus::Failed,
        ];

        for status in statuses {
            let id = status.id();
            let recovered = PeriodStatus::from_id(id).unwrap();
            assert_eq!(status, recovered);
        }
    }

    #[test]
    fn test_invalid_status_id() {
        assert!(PeriodStatus::from_id(999).is_none());
        assert!(PeriodStatus::from_id(-999).is_none());
    }

    #[test]
    fn test_terminal_and_retryable() {
        assert!(PeriodStatus::Completed.is_terminal());
        assert!(!PeriodStatus::Failed.is_terminal());

        assert!(PeriodStatus::Pending.is_retryable());
        assert!(PeriodStatus::Failed.is_retryable());
        assert!(!PeriodStatus::Processing.is_retryable());
        assert!(!PeriodStatus::Completed.is_retryable());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(PeriodStatus::Pending.can_transition(PeriodStatus::Processing));
        assert!(PeriodStatus::Failed.can_transition(PeriodStatus::Processing));
        assert!(PeriodStatus::Processing.can_transition(PeriodStatus::Completed));
        assert!(PeriodStatus::Processing.can_transition(PeriodStatus::Failed));
    }

    #[test]
    fn test_completed_is_final() {
        for to in [
            PeriodStatus::Pending,
            PeriodStatus::Processing,
            PeriodStatus::Completed,
            PeriodStatus::Failed,
        ] {
            assert!(!PeriodStatus::Completed.can_transition(to));
        }
    }

    #[test]
    fn test_period_key_new() {
        assert_eq!(PeriodKey::new(2026, 8).unwrap().as_str(), "2026-08");
        assert!(PeriodKey::new(2026, 0).is_err());
        assert!(PeriodKey::new(2026, 13).is_err());
    }

    #[test]
    fn test_period_key_parse() {
        assert_eq!(PeriodKey::parse("2026-08").unwrap().as_str(), "2026-08");
        assert_eq!(PeriodKey::parse("2026-8").unwrap().as_str(), "2026-08");
        assert!(PeriodKey::parse("202608").is_err());
        assert!(PeriodKey::parse("2026-00").is_err());
        assert!(PeriodKey::parse("garbage").is_err());
    }

    #[test]
    fn test_period_key_from_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(PeriodKey::from_date(date).as_str(), "2026-01");
    }

    #[test]
    fn test_period_key_ordering() {
        let jan = PeriodKey::parse("2026-01").unwrap();
        let feb = PeriodKey::parse("2026-02").unwrap();
        let dec_prev = PeriodKey::parse("2025-12").unwrap();
        assert!(jan < feb);
        assert!(dec_prev < jan);
    }
}
