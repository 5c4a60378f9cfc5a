//! Logging setup for the hrclean binary.
//!
//! Logs go to stderr and to a daily rolling file in the platform data
//! directory.
//!
//! ```no_run
//! hrclean::logging::init(false).expect("Failed to initialize logging");
//! tracing::info!("Pipeline started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/hrclean/logs`
/// - macOS: `~/Library/Application Support/hrclean/logs`
/// - Linux: `~/.local/share/hrclean/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join("hrclean").join("logs"))
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `verbose`; without either the level is `info`. When
/// the log file cannot be opened, logging continues on stderr alone.
///
/// # Errors
///
/// Returns error if the filter is invalid or a subscriber is already installed
pub fn init(verbose: bool) -> Result<()> {
    let file = get_log_dir().and_then(|dir| file_appender(&dir).map(|appender| (dir, appender)));
    let (file, appender) = match file {
        Ok((dir, appender)) => (Ok(dir), Some(appender)),
        Err(err) => (Err(err), None),
    };

    subscriber(verbose, appender)?
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match file {
        Ok(dir) => tracing::debug!("Logging initialized, log directory: {}", dir.display()),
        Err(err) => tracing::warn!("File logging unavailable, logging to stderr only: {err:#}"),
    }

    Ok(())
}

/// Daily rolling appender keeping the last 10 files.
fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("hrclean")
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create log file appender")
}

/// Console layer always, file layer when an appender is given.
fn subscriber(
    verbose: bool,
    appender: Option<RollingFileAppender>,
) -> Result<impl tracing::Subscriber + Send + Sync> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let file_layer = appender.map(|appender| {
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(appender)
    });

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        // Headless CI containers may have no data dir at all.
        if let Ok(log_dir) = get_log_dir() {
            assert!(log_dir.ends_with("hrclean/logs") || log_dir.ends_with("hrclean\\logs"));
        }
    }

    #[test]
    fn test_file_appender_in_unwritable_place() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "")?;

        assert!(file_appender(&blocker.join("logs")).is_err());
        assert!(file_appender(&dir.path().join("logs")).is_ok());
        Ok(())
    }

    #[test]
    fn test_console_only_subscriber() -> anyhow::Result<()> {
        let subscriber = subscriber(false, None)?;
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("console only");
        });
        Ok(())
    }
}
