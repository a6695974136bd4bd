use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{ProspectorError, Result};

/// Initializes the logging system with both console and file output.
///
/// `RUST_LOG` directives are honoured on top of the configured crate level. The
/// returned guard flushes the file writer when dropped, so keep it alive for the
/// life of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.dir)?;

    // Create a non-blocking file appender for daily log rotation
    let file_appender = tracing_appender::rolling::daily(&config.dir, "prospector.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // JSON for files, human-readable for the console
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let directive = format!("domain_prospector={}", config.level)
        .parse()
        .map_err(|e| {
            ProspectorError::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(directive))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| {
            ProspectorError::Config(format!("Failed to install tracing subscriber: {}", e))
        })?;

    Ok(guard)
}
