use anyhow::Result;
use std::env;
use std::path::Path;
use tracing::{warn, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "pylot.log";

/// Log to stderr and to a daily rolling `pylot.log` in `log_dir`.
///
/// File logging is skipped with a warning when `log_dir` is missing or not
/// writable; the configuration loader reports the real problem afterwards.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    let log_level = env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let (file_layer, file_error) = match file_appender(log_dir) {
        Ok(appender) => (
            Some(fmt::layer().with_writer(appender).with_ansi(false)),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("Logging to stderr only: {}", e);
    }
    Ok(())
}

/// Daily rolling appender in an existing directory. Never creates `log_dir`.
fn file_appender(log_dir: &Path) -> Result<RollingFileAppender, String> {
    if !log_dir.is_dir() {
        return Err(format!("log directory {} does not exist", log_dir.display()));
    }
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE)
        .build(log_dir)
        .map_err(|e| format!("failed to open {} in {}: {e}", LOG_FILE, log_dir.display()))
}
