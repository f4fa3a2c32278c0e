//! Tracing setup: rolling log file plus stdout in text mode

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber. The returned guard must stay alive for
/// the life of the process or buffered log lines are lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(file_appender(config));

    let default_filter = if config.enable_tracing {
        config.log_level.clone()
    } else {
        format!("{},ledgerd=off", config.log_level)
    };
    // RUST_LOG wins over the config file when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    }
}
