//! Logging setup
//!
//! Library code logs through the `log` facade. The binary (or an embedding
//! application) calls [`init`] once to route those records to a log file
//! through a `fern` dispatcher.

use anyhow::{Context, Result};
use log::LevelFilter;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

use crate::config::LoggingConfig;
use crate::constants::{APP_DIR_NAME, LOG_FILE_NAME};

static LOGGER: OnceCell<PathBuf> = OnceCell::new();

/// Parse a textual level from the configuration.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        other => anyhow::bail!("Invalid log level '{}'", other),
    }
}

/// Get the path of the log file
pub fn get_log_file_path() -> Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))
        .map(|dir| dir.join(APP_DIR_NAME).join(LOG_FILE_NAME))
}

/// Install the global logger described by the configuration.
///
/// Does nothing when logging is disabled. Only the first successful call
/// installs a dispatcher; later calls return the path already in use.
///
/// # Returns
/// The log file path, or `None` when logging is disabled
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let path = LOGGER.get_or_try_init(|| -> Result<PathBuf> {
        let level = parse_level(&config.level)?;
        let path = get_log_file_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] {:<5} {}: {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .level_for("sqlx", LevelFilter::Warn)
            .level_for("sea_orm", LevelFilter::Warn)
            .chain(
                fern::log_file(&path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?,
            )
            .apply()
            .context("A global logger is already installed")?;

        Ok(path)
    })?;

    Ok(Some(path.clone()))
}
