//! Logging setup for global_search.
//!
//! Installs a layered tracing subscriber: an `EnvFilter` (honouring
//! `RUST_LOG`, otherwise the configured level) and one `fmt` layer. The fmt
//! layer writes to the configured log file through a non-blocking
//! `tracing_appender` worker, or to stderr when no file is set. Stdout is
//! left to search results.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive. Dropping it flushes pending lines.
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// The file log lines go to, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Initialize the global tracing subscriber.
///
/// `verbose` forces the `debug` level regardless of `config.level`; a set
/// `RUST_LOG` still takes precedence over both.
///
/// # Errors
/// Returns an error if the log directory cannot be created, the log path has
/// no file name, or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.file.as_deref() {
        Some(file) => {
            let path = PathBuf::from(file);
            let (dir, file_name) = split_log_path(&path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            tracing::info!(path = %path.display(), level, "File logging enabled");
            Ok(LoggingGuard {
                _guard: Some(guard),
                log_file: Some(path),
            })
        }
        None => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            Ok(LoggingGuard {
                _guard: None,
                log_file: None,
            })
        }
    }
}

/// Split a log file path into its directory (`.` when bare) and file name.
fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}
