//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! - **Server** ([`init_production`]): JSON file layer with daily rotation,
//!   plus a human-readable stderr layer.
//! - **CLI** ([`init_cli`]): stderr only, for `models` and `leads`.
//!
//! Both honour `RUST_LOG`; the default filter is `info` for leadline and
//! `warn` for everything else.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn,leadline=info";

/// Prefix of rotated log files inside the logs directory.
pub const LOG_FILE_PREFIX: &str = "leadline.log";

/// Keeps the non-blocking file writer alive.
///
/// Dropping it flushes buffered entries; hold it for the life of the
/// process.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialise server logging, writing `{logs_dir}/leadline.log.YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed. The directory is created first either
/// way.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(file_writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("global tracing subscriber already installed")?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise stderr-only logging for one-shot subcommands.
///
/// Silently keeps an already-installed subscriber.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
