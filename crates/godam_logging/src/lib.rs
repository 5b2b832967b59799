//! Shared logging setup for GoDam binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str =
    "godam=info,godam_db=info,godam_schema=info,godam_validator=info,godam_sinks=info";

const HOME_ENV: &str = "GODAM_HOME";

/// Logging configuration shared by GoDam binaries.
#[derive(Debug, Clone)]
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Raise console output to debug.
    pub verbose: bool,
    /// Machine output owns stdout; console logs stay on stderr and drop to warn.
    pub json_mode: bool,
    /// Also write a daily-rolling file under [`logs_dir`].
    pub file_logging: bool,
}

/// Keeps the non-blocking file writer flushing. Hold it until exit.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize tracing with stderr output and an optional daily log file.
///
/// A log directory that cannot be created only disables the file layer.
pub fn init_logging(config: LogConfig<'_>) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let mut file_guard = None;
    let file_layer = if config.file_logging {
        match ensure_logs_dir() {
            Ok(log_dir) => {
                let appender = tracing_appender::rolling::daily(
                    log_dir,
                    format!("{}.log", sanitize_name(config.app_name)),
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(env_filter.clone()),
                )
            }
            Err(err) => {
                eprintln!("Warning: failed to create logs directory: {:#}", err);
                None
            }
        }
    } else {
        None
    };

    let console_filter = if config.verbose {
        EnvFilter::new(console_debug_filter())
    } else if config.json_mode {
        EnvFilter::new("warn")
    } else {
        env_filter
    };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(BoxMakeWriter::new(std::io::stderr))
        .with_target(false)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard { _file: file_guard })
}

fn console_debug_filter() -> String {
    DEFAULT_LOG_FILTER.replace("=info", "=debug")
}

/// GoDam home directory: `$GODAM_HOME`, else `~/.godam`.
pub fn godam_home() -> Result<PathBuf> {
    if let Some(override_path) = std::env::var_os(HOME_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(override_path));
    }
    dirs::home_dir()
        .map(|home| home.join(".godam"))
        .context("Could not determine home directory; set GODAM_HOME")
}

/// Logs directory: `<home>/logs`.
pub fn logs_dir() -> Result<PathBuf> {
    Ok(godam_home()?.join("logs"))
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir()?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
