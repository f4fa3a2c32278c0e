//! Settlement engine: one exactly-once interest run per period
//!
//! A run claims the period in the job log, then disburses interest to
//! every account and flips the period COMPLETED in one transaction, so a
//! crash at any point leaves either the full run or none of it. Any error
//! before commit rolls back the disbursement and marks the period FAILED
//! for the sweep to retry.

use super::log::SettlementJobLog;
use super::models::{PeriodKey, PeriodStatus};
use crate::account::AccountStore;
use crate::db::Database;
use crate::error::{LedgerError, LedgerResult};
use crate::transfer::TransferProtocol;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

/// Aggregates of a completed settlement run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementSummary {
    pub period: String,
    /// Accounts seen by the run
    pub total_accounts: i64,
    /// Accounts whose balance actually changed (non-zero applied interest)
    pub processed_count: i64,
    /// Signed sum of all applied interest
    pub total_interest: Decimal,
}

/// Drives interest settlement for calendar periods
#[derive(Clone)]
pub struct SettlementEngine {
    db: Arc<Database>,
    accounts: AccountStore,
    protocol: TransferProtocol,
    log: SettlementJobLog,
    period_rate: Decimal,
}

impl SettlementEngine {
    pub fn new(db: Arc<Database>, period_rate: Decimal) -> Self {
        let pool = db.pool().clone();
        Self {
            accounts: AccountStore::new(pool.clone()),
            protocol: TransferProtocol::new(db.clone()),
            log: SettlementJobLog::new(pool),
            db,
            period_rate,
        }
    }

    pub fn job_log(&self) -> &SettlementJobLog {
        &self.log
    }

    /// Run settlement for one period, exactly once
    ///
    /// A COMPLETED period short-circuits with its stored aggregates, so
    /// retries and duplicate triggers are harmless. A period owned by a
    /// live concurrent run returns SettlementFailure without touching
    /// balances.
    pub async fn run_period(&self, period: &PeriodKey) -> LedgerResult<SettlementSummary> {
        let entry = self.log.get_or_create(period).await?;

        if entry.status == PeriodStatus::Completed {
            tracing::info!(%period, "Settlement already completed, skipping");
            return Ok(SettlementSummary {
                period: entry.period,
                total_accounts: entry.total_accounts,
                processed_count: entry.processed_count,
                total_interest: entry.total_interest,
            });
        }

        if !self.log.claim(period).await? {
            return Err(LedgerError::SettlementFailure {
                period: period.to_string(),
                detail: "another runner owns this period".to_string(),
            });
        }

        tracing::info!(%period, rate = %self.period_rate, "Settlement run started");

        match self.disburse(period).await {
            Ok(summary) => {
                tracing::info!(
                    %period,
                    total_accounts = summary.total_accounts,
                    processed = summary.processed_count,
                    total_interest = %summary.total_interest,
                    "Settlement run completed"
                );
                Ok(summary)
            }
            Err(e) => {
                let detail = e.to_string();
                if !self.log.fail(period, &detail).await? {
                    // Ownership already moved (stale recovery or a
                    // competing runner); nothing left to mark.
                    tracing::warn!(%period, "Period no longer PROCESSING, skipping FAILED mark");
                }
                tracing::error!(%period, error = %detail, "Settlement run failed");
                Err(LedgerError::SettlementFailure {
                    period: period.to_string(),
                    detail,
                })
            }
        }
    }

    /// Run settlement for the period the wall clock falls in
    pub async fn run_current(&self) -> LedgerResult<SettlementSummary> {
        self.run_period(&PeriodKey::current()).await
    }

    /// Retry every PENDING or FAILED period, oldest first
    ///
    /// One bad period does not block later ones; errors are logged and
    /// the sweep moves on. Returns the number of periods that completed.
    pub async fn reconcile_missed_periods(&self) -> LedgerResult<usize> {
        let unfinished = self.log.find_unfinished().await?;
        if unfinished.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = unfinished.len(), "Sweeping unfinished settlement periods");

        let mut completed = 0;
        for entry in unfinished {
            let period = PeriodKey::parse(&entry.period)?;
            match self.run_period(&period).await {
                Ok(_) => completed += 1,
                Err(e) => {
                    tracing::warn!(%period, error = %e, "Sweep retry failed");
                }
            }
        }

        Ok(completed)
    }

    /// Disburse interest to every account in one transaction
    async fn disburse(&self, period: &PeriodKey) -> LedgerResult<SettlementSummary> {
        let mut tx = self.db.begin().await?;

        // All rows locked in id order; the run sees one consistent snapshot
        // and no transfer can interleave mid-disbursement.
        let accounts = self.accounts.list_all_for_update(&mut tx).await?;
        let total_accounts = accounts.len() as i64;

        let mut processed_count = 0i64;
        let mut total_interest = Decimal::ZERO;

        for account in &accounts {
            let interest = compute_interest(account.balance, self.period_rate);
            let applied = self.protocol.apply_interest(&mut tx, account, interest).await?;
            if applied != Decimal::ZERO {
                processed_count += 1;
                total_interest += applied;
            }
        }

        // The PROCESSING -> COMPLETED flip rides in the same transaction
        // as the movements: a crash before commit leaves neither, so the
        // retry starts from a clean slate. A zero-row CAS means ownership
        // moved mid-run (stale recovery reassigned the period); committing
        // now would disburse a second time, so the run rolls back instead.
        let completed = self
            .log
            .complete(&mut tx, period, total_accounts, processed_count, total_interest)
            .await?;
        if !completed {
            return Err(LedgerError::Conflict(format!(
                "lost ownership of period {} mid-run",
                period
            )));
        }

        tx.commit().await?;

        Ok(SettlementSummary {
            period: period.to_string(),
            total_accounts,
            processed_count,
            total_interest,
        })
    }
}

/// Interest for one balance: `balance * rate`, truncated toward zero at
/// 2 decimal places. Truncation (not banker's rounding) keeps the engine
/// from ever inventing a cent.
pub fn compute_interest(balance: Decimal, rate: Decimal) -> Decimal {
    (balance * rate).round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_compute_interest_truncates_toward_zero() {
        let rate = d("0.00833");
        // 800.00 * 0.00833 = 6.664 -> 6.66
        assert_eq!(compute_interest(d("800.00"), rate), d("6.66"));
        // 200.00 * 0.00833 = 1.666 -> 1.66, never 1.67
        assert_eq!(compute_interest(d("200.00"), rate), d("1.66"));
    }

    #[test]
    fn test_compute_interest_zero_balance() {
        assert_eq!(compute_interest(d("0"), d("0.00833")), Decimal::ZERO);
    }

    #[test]
    fn test_compute_interest_small_balance_rounds_to_zero() {
        // 0.01 * 0.00833 = 0.0000833 -> 0.00
        assert_eq!(compute_interest(d("0.01"), d("0.00833")), d("0.00"));
    }

    #[test]
    fn test_compute_interest_negative_rate() {
        // -1.666 truncates toward zero to -1.66
        assert_eq!(compute_interest(d("200.00"), d("-0.00833")), d("-1.66"));
    }
}
