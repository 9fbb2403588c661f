//! Logging initialization.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::LogLevel;

/// Prefix of the daily rolling log files (`worker.log.YYYY-MM-DD`).
const LOG_FILE_PREFIX: &str = "worker.log";

/// Initialize logging with the specified level.
///
/// Console logs go to stderr so stdout stays clean. `RUST_LOG` directives
/// are added on top of `level`. When `log_dir` is given, logs are also
/// written to a daily rolling file in that directory; the returned guard
/// must be held until exit so buffered lines are flushed.
pub fn init_logging(level: LogLevel, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level: Level = level.into();
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .context("Failed to initialize logging")?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(Some(guard))
}
