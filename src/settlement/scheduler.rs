//! Settlement scheduler: the two timers behind exactly-once settlement
//!
//! The period trigger fires once per calendar month on the 1st at the
//! configured UTC hour. The backlog sweep runs on a fixed cadence (and
//! once immediately at startup, which is the crash-recovery path): it
//! reaps stale PROCESSING rows, then retries every unfinished period.

use super::engine::{SettlementEngine, SettlementSummary};
use super::models::PeriodKey;
use crate::config::SettlementConfig;
use crate::error::LedgerResult;
use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub settlement_hour: u32,
    pub sweep_interval_secs: u64,
    pub stale_processing_secs: i64,
}

impl From<&SettlementConfig> for SchedulerConfig {
    fn from(cfg: &SettlementConfig) -> Self {
        Self {
            settlement_hour: cfg.settlement_hour,
            sweep_interval_secs: cfg.sweep_interval_secs,
            stale_processing_secs: cfg.stale_processing_secs,
        }
    }
}

/// Owns the period-trigger and sweep tasks
pub struct SettlementScheduler {
    engine: Arc<SettlementEngine>,
    config: SchedulerConfig,
    handles: Vec<JoinHandle<()>>,
}

impl SettlementScheduler {
    pub fn new(engine: Arc<SettlementEngine>, config: SchedulerConfig) -> Self {
        Self {
            engine,
            config,
            handles: Vec::new(),
        }
    }

    /// Spawn both background tasks. Idempotent start is not supported;
    /// call once per scheduler.
    pub fn start(&mut self) {
        let engine = self.engine.clone();
        let hour = self.config.settlement_hour;
        self.handles.push(tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_period_run(now, hour);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                tracing::info!(next_run = %next, "Settlement trigger armed");
                sleep(wait).await;

                let period = PeriodKey::current();
                if let Err(e) = engine.run_period(&period).await {
                    // The sweep will retry; the trigger just moves on.
                    tracing::warn!(%period, error = %e, "Scheduled settlement run failed");
                }
            }
        }));

        let engine = self.engine.clone();
        let sweep_interval = Duration::from_secs(self.config.sweep_interval_secs);
        let stale_secs = self.config.stale_processing_secs;
        self.handles.push(tokio::spawn(async move {
            // First pass runs immediately so a restart recovers any
            // period the previous process abandoned.
            loop {
                if let Err(e) = engine.job_log().recover_stale_processing(stale_secs).await {
                    tracing::warn!(error = %e, "Stale-period recovery failed");
                }
                match engine.reconcile_missed_periods().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(completed = n, "Sweep settled missed periods"),
                    Err(e) => tracing::warn!(error = %e, "Settlement sweep failed"),
                }
                sleep(sweep_interval).await;
            }
        }));

        tracing::info!(
            settlement_hour = self.config.settlement_hour,
            sweep_interval_secs = self.config.sweep_interval_secs,
            "Settlement scheduler started"
        );
    }

    /// Abort both background tasks
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        tracing::info!("Settlement scheduler stopped");
    }

    /// Force a run for the current period (operator escape hatch)
    pub async fn run_now(&self) -> LedgerResult<SettlementSummary> {
        self.engine.run_current().await
    }

    /// When the period trigger will next fire
    pub fn next_run_at(&self) -> DateTime<Utc> {
        next_period_run(Utc::now(), self.config.settlement_hour)
    }
}

impl Drop for SettlementScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Next period-trigger instant: the 1st of the month at `hour` UTC.
/// If this month's instant is still in the future, use it; otherwise
/// the 1st of next month.
pub fn next_period_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let this_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, hour, 0, 0)
        .single()
        .unwrap_or(now);

    if this_month > now {
        this_month
    } else {
        // First of the month plus one month is always valid
        this_month + Months::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
    }

    #[test]
    fn test_next_run_same_month_before_trigger() {
        // 1st at 01:30, trigger hour 2: fires later the same day
        let now = at(2026, 8, 1, 1, 30);
        assert_eq!(next_period_run(now, 2), at(2026, 8, 1, 2, 0));
    }

    #[test]
    fn test_next_run_rolls_to_next_month() {
        let now = at(2026, 8, 15, 12, 0);
        assert_eq!(next_period_run(now, 2), at(2026, 9, 1, 2, 0));
    }

    #[test]
    fn test_next_run_exactly_at_trigger_rolls_over() {
        let now = at(2026, 8, 1, 2, 0);
        assert_eq!(next_period_run(now, 2), at(2026, 9, 1, 2, 0));
    }

    #[test]
    fn test_next_run_crosses_year_boundary() {
        let now = at(2026, 12, 20, 0, 0);
        assert_eq!(next_period_run(now, 2), at(2027, 1, 1, 2, 0));
    }

    #[test]
    fn test_scheduler_config_from_settlement_config() {
        let cfg = SettlementConfig::default();
        let sched: SchedulerConfig = (&cfg).into();
        assert_eq!(sched.settlement_hour, cfg.settlement_hour);
        assert_eq!(sched.sweep_interval_secs, cfg.sweep_interval_secs);
        assert_eq!(sched.stale_processing_secs, cfg.stale_processing_secs);
    }
}
