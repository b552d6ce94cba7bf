// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use crate::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_PREFIX: &str = "cosmic-ext-ejecter.log";
const KEEP_DAYS: u64 = 7;

/// Noisy dependencies stay at warn unless RUST_LOG says otherwise.
fn default_directives(level: &str) -> String {
    format!("{level},zbus=warn,tracing=warn")
}

pub(crate) fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.log_level.as_directive())));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    if !config.log_to_disk {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        return;
    }

    match file_writer() {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::SystemTime);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("cosmic-ext-ejecter: failed to initialize file logging: {e:#}");
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .init();
        }
    }
}

fn file_writer() -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (dir, prefix) = resolve_log_location(
        std::env::var_os("EJECTER_LOG_FILE"),
        std::env::var_os("EJECTER_LOG_DIR"),
    );

    fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("cannot create log directory {}: {e}", dir.display()))?;
    remove_expired_logs(&dir, &prefix.to_string_lossy());

    Ok(tracing_appender::non_blocking(
        tracing_appender::rolling::daily(&dir, &prefix),
    ))
}

/// `EJECTER_LOG_FILE` names the file prefix and its directory; otherwise
/// `EJECTER_LOG_DIR` or the XDG state directory holds the default prefix.
fn resolve_log_location(file: Option<OsString>, dir: Option<OsString>) -> (PathBuf, OsString) {
    let Some(file) = file.map(PathBuf::from) else {
        let dir = dir.map(PathBuf::from).unwrap_or_else(default_log_dir);
        return (dir, OsString::from(DEFAULT_LOG_PREFIX));
    };

    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => default_log_dir(),
    };
    let prefix = file
        .file_name()
        .map_or_else(|| OsString::from(DEFAULT_LOG_PREFIX), OsString::from);
    (dir, prefix)
}

fn default_log_dir() -> PathBuf {
    let state_home = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".local/state")))
        .unwrap_or_else(|| PathBuf::from("/tmp"));

    state_home.join("cosmic-ext-ejecter").join("logs")
}

/// Delete rolled files with our prefix that are older than the retention window.
fn remove_expired_logs(dir: &Path, prefix: &str) {
    let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_secs(KEEP_DAYS * 24 * 60 * 60))
    else {
        return;
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let expired = entries.flatten().filter(|entry| {
        entry.file_type().is_ok_and(|t| t.is_file())
            && entry.file_name().to_string_lossy().starts_with(prefix)
            && entry
                .metadata()
                .and_then(|m| m.modified())
                .is_ok_and(|modified| modified < cutoff)
    });

    for entry in expired {
        let _ = fs::remove_file(entry.path());
    }
}
