//! ledgerd - Ledger & Settlement Engine daemon
//!
//! Boot sequence: config, logging, PostgreSQL pool, schema, settlement
//! scheduler. The process then idles until Ctrl-C; all work happens in
//! the scheduler's background tasks.

use ledgerd::config::AppConfig;
use ledgerd::db::Database;
use ledgerd::settlement::{SchedulerConfig, SettlementEngine, SettlementScheduler};
use std::sync::Arc;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = ledgerd::logging::init_logging(&config);

    tracing::info!("Starting ledgerd in {} mode", env);

    let db = Arc::new(Database::connect(&config.postgres_url).await?);
    db.apply_schema(include_str!("../schema.sql")).await?;

    let engine = Arc::new(SettlementEngine::new(
        db.clone(),
        config.settlement.period_rate,
    ));
    let mut scheduler =
        SettlementScheduler::new(engine, SchedulerConfig::from(&config.settlement));
    scheduler.start();

    tracing::info!(next_run = %scheduler.next_run_at(), "ledgerd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    scheduler.stop();

    Ok(())
}
