//! Tracing setup: a console layer on stderr plus a per-run log file.
//!
//! Console verbosity follows `--debug` and `RUST_LOG`. The file always records
//! at least `info` so a technician can hand the log over after a failed run.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::shell::{hostname, platform::sanitize_for_filename};

/// Log directory used when none is configured on Windows.
pub const DEFAULT_LOG_DIR: &str = r"C:\ProvisioningLogs";

/// Keeps the file writer alive; drop it last.
pub struct LogHandle {
    path: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

impl LogHandle {
    /// The log file of this run, if one could be created.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// `provisioning_<HOST>_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(host: &str, at: DateTime<Local>) -> String {
    format!(
        "provisioning_{}_{}.log",
        sanitize_for_filename(host),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// The configured directory, or the platform default.
pub fn default_log_dir(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(dir) => dir.to_path_buf(),
        None if cfg!(windows) => PathBuf::from(DEFAULT_LOG_DIR),
        None => std::env::temp_dir().join("ProvisioningLogs"),
    }
}

/// Create the log file in `dir`, falling back to the temp dir.
pub fn create_log_file(dir: &Path, file_name: &str) -> Option<(PathBuf, File)> {
    let fallback = std::env::temp_dir();
    for candidate in [dir, fallback.as_path()] {
        if fs::create_dir_all(candidate).is_err() {
            continue;
        }
        let path = candidate.join(file_name);
        if let Ok(file) = File::create(&path) {
            return Some((path, file));
        }
    }
    None
}

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN on the console
pub fn init_tracing(debug: bool, log_dir: Option<&Path>) -> LogHandle {
    let console_filter = if debug {
        EnvFilter::new("provisioner=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("provisioner=warn"))
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let dir = default_log_dir(log_dir);
    let name = log_file_name(&hostname(), Local::now());

    match create_log_file(&dir, &name) {
        Some((path, file)) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let file_filter = EnvFilter::new(if debug {
                "provisioner=debug"
            } else {
                "provisioner=info"
            });
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(file_filter);

            // A subscriber may already be installed (tests); keep it.
            let _ = tracing_subscriber::registry()
                .with(console)
                .with(file_layer)
                .try_init();

            LogHandle {
                path: Some(path),
                _guard: Some(guard),
            }
        }
        None => {
            let _ = tracing_subscriber::registry().with(console).try_init();
            tracing::warn!("Could not create a log file in {}", dir.display());
            LogHandle {
                path: None,
                _guard: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn file_name_has_host_and_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            log_file_name("WS-042", at),
            "provisioning_WS-042_20260304_050607.log"
        );
    }

    #[test]
    fn configured_dir_wins() {
        let dir = Path::new("/var/log/provisioning");
        assert_eq!(default_log_dir(Some(dir)), dir);
    }

    #[test]
    fn creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs/nested");

        let (path, _file) = create_log_file(&dir, "run.log").unwrap();

        assert_eq!(path, dir.join("run.log"));
        assert!(path.exists());
    }

    #[test]
    fn unusable_dir_falls_back_to_temp() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let name = format!("fallback_{}.log", std::process::id());
        let (path, _file) = create_log_file(&blocker.join("logs"), &name).unwrap();

        assert_eq!(path.parent().unwrap(), std::env::temp_dir());
        fs::remove_file(path).ok();
    }
}
