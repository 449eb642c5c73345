//! Structured JSON logging for the navigation runtime.
//!
//! Every run writes one JSON log file named `navstack-<run_id>.json` into
//! the configured directory. The run id is a UUID v7, so file names sort
//! chronologically and runs beyond `max-files` are deleted at startup.
//!
//! The level comes from [`LoggingSettings::level`] unless `RUST_LOG` is set:
//!
//! ```bash
//! RUST_LOG=debug navstack
//! RUST_LOG=navstack_core::navigation=trace,info navstack
//! ```
//!
//! ```no_run
//! use navstack_core::logging::{get_run_id, init_logging, shutdown_logging};
//! use navstack_core::settings::LoggingSettings;
//!
//! init_logging(&LoggingSettings::default())?;
//! tracing::info!(run_id = get_run_id(), "navigation shell started");
//! shutdown_logging();
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::settings::LoggingSettings;
use anyhow::{Context, Error};
use std::fs;
use std::fs::DirEntry;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FILE_PREFIX: &str = "navstack-";
const LOG_FILE_SUFFIX: &str = "json";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

static LOG_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Unique id of this process run, generated on first access.
pub fn get_run_id() -> &'static str {
    RUN_ID.get_or_init(|| Uuid::now_v7().to_string()).as_str()
}

/// Deletes the oldest run logs so that at most `max_files` remain.
///
/// Relies on run ids being UUID v7: lexicographic order of the file names is
/// chronological order. `max_files == 0` keeps everything.
fn cleanup_run_logs(log_dir: &Path, max_files: usize) -> Result<(), Error> {
    if max_files == 0 {
        return Ok(());
    }

    let mut entries = collect_run_log_entries(log_dir)?;
    if entries.len() <= max_files {
        return Ok(());
    }

    entries.sort_by_key(|entry| entry.file_name());
    let remove_count = entries.len() - max_files;
    for entry in entries.into_iter().take(remove_count) {
        fs::remove_file(entry.path())
            .with_context(|| format!("can't remove old log file {}", entry.path().display()))?;
    }

    Ok(())
}

fn collect_run_log_entries(log_dir: &Path) -> Result<Vec<DirEntry>, Error> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(log_dir)
        .with_context(|| format!("can't read log directory {}", log_dir.display()))?
    {
        let entry = entry.context("can't read log directory entry")?;
        if is_run_log_entry(&entry) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

fn is_run_log_entry(entry: &DirEntry) -> bool {
    let file_name = entry.file_name();
    let file_name = file_name.to_string_lossy();
    file_name.starts_with(LOG_FILE_PREFIX) && file_name.ends_with(LOG_FILE_SUFFIX)
}

/// Installs the global JSON subscriber.
///
/// Call once at startup, before the navigation engine is built. Does nothing
/// when logging is disabled.
///
/// # Errors
///
/// Fails when the log directory can't be created or cleaned, the level
/// filter doesn't parse, or a global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), Error> {
    if !settings.enabled {
        return Ok(());
    }

    let current_working_dir =
        std::env::current_dir().context("can't get current working directory")?;
    let log_dir = current_working_dir.join(&settings.directory);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("can't create log directory {}", log_dir.display()))?;

    cleanup_run_logs(&log_dir, settings.max_files)?;

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(format!("{}{}", LOG_FILE_PREFIX, get_run_id()))
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&log_dir)
        .context("can't initialize log file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(Mutex::new(Some(guard)));

    let filter = build_filter(settings)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("can't initialize tracing subscriber")?;

    eprintln!(
        "navstack run started with ID: {} (version {})",
        get_run_id(),
        VERSION
    );

    Ok(())
}

/// Flushes buffered log lines, waiting at most a few seconds.
pub fn shutdown_logging() {
    let Some(mutex) = LOG_GUARD.get() else {
        return;
    };
    let Ok(mut guard_opt) = mutex.lock() else {
        return;
    };
    if let Some(guard) = guard_opt.take() {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            drop(guard);
            let _ = tx.send(());
        });

        let _ = rx.recv_timeout(SHUTDOWN_TIMEOUT);
    }
}

/// `RUST_LOG` wins over the configured level; an empty level means `info`.
fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, Error> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = settings.level.trim();
    let level = if level.is_empty() { "info" } else { level };

    EnvFilter::builder()
        .parse(level)
        .context("invalid logging level")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_log_file(dir: &Path, index: usize) -> Result<(), Error> {
        let file_name = format!("{}{:04}.{}", LOG_FILE_PREFIX, index, LOG_FILE_SUFFIX);
        fs::write(dir.join(file_name), b"{}")?;
        Ok(())
    }

    fn collect_log_file_names(dir: &Path) -> Result<Vec<String>, Error> {
        let mut entries = collect_run_log_entries(dir)?;
        entries.sort_by_key(|entry| entry.file_name());
        Ok(entries
            .into_iter()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect())
    }

    #[test]
    fn test_cleanup_run_logs_removes_oldest_entries() -> Result<(), Error> {
        let temp_dir = TempDir::new()?;
        for index in 1..=5 {
            create_log_file(temp_dir.path(), index)?;
        }

        cleanup_run_logs(temp_dir.path(), 2)?;

        assert_eq!(
            collect_log_file_names(temp_dir.path())?,
            vec![
                format!("{}0004.{}", LOG_FILE_PREFIX, LOG_FILE_SUFFIX),
                format!("{}0005.{}", LOG_FILE_PREFIX, LOG_FILE_SUFFIX),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_cleanup_run_logs_max_files_zero_keeps_all() -> Result<(), Error> {
        let temp_dir = TempDir::new()?;
        for index in 1..=3 {
            create_log_file(temp_dir.path(), index)?;
        }

        cleanup_run_logs(temp_dir.path(), 0)?;

        assert_eq!(collect_log_file_names(temp_dir.path())?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_cleanup_ignores_foreign_files() -> Result<(), Error> {
        let temp_dir = TempDir::new()?;
        for index in 1..=3 {
            create_log_file(temp_dir.path(), index)?;
        }
        fs::write(temp_dir.path().join("Settings.toml"), b"")?;
        fs::write(temp_dir.path().join("navstack-notes.txt"), b"")?;

        cleanup_run_logs(temp_dir.path(), 1)?;

        assert_eq!(collect_log_file_names(temp_dir.path())?.len(), 1);
        assert!(temp_dir.path().join("Settings.toml").exists());
        assert!(temp_dir.path().join("navstack-notes.txt").exists());
        Ok(())
    }

    #[test]
    fn test_run_id_is_stable() {
        let run_id = get_run_id();
        assert_eq!(get_run_id(), run_id);
        assert!(Uuid::parse_str(run_id).is_ok());
    }

    #[test]
    fn test_disabled_logging_is_a_noop() -> Result<(), Error> {
        let settings = LoggingSettings {
            enabled: false,
            ..LoggingSettings::default()
        };
        init_logging(&settings)
    }
}
