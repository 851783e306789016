//! Tracing subscriber setup

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::{DicomWebError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails when the
/// filter is invalid, a subscriber is already installed or the log file
/// cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let directives = filter_directives(config, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directives).map_err(|e| {
        DicomWebError::Logging(format!("invalid filter '{}': {}", directives, e))
    })?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    let file_layer = if config.log_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file_path)
            .map_err(|e| {
                DicomWebError::Logging(format!(
                    "cannot open log file {}: {}",
                    config.log_file_path, e
                ))
            })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DicomWebError::Logging(e.to_string()))
}

/// `RUST_LOG` when set and non-empty, the configured level otherwise
fn filter_directives(config: &LoggingConfig, rust_log: Option<String>) -> String {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.to_ascii_lowercase())
}
