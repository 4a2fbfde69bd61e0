//! Tracing subscriber initialization.
//!
//! The viewer owns the terminal, so logs go to a file. Follow them with
//! `tail -f` in another terminal.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Directory and file name a log path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Directory holding the log file. Empty for a bare file name.
    pub directory: PathBuf,
    /// File name inside `directory`.
    pub file_name: String,
}

impl LogTarget {
    /// Split `log_path` into directory and file name.
    ///
    /// # Errors
    ///
    /// [`LoggingError::InvalidPath`] when the path has no UTF-8 file name,
    /// [`LoggingError::NoParentDirectory`] for a root path.
    pub fn resolve(log_path: &Path) -> Result<Self, LoggingError> {
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

        let directory = log_path
            .parent()
            .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

        Ok(Self {
            directory: directory.to_path_buf(),
            file_name: file_name.to_string(),
        })
    }

    /// Create the directory if needed.
    pub fn ensure_directory(&self) -> Result<(), LoggingError> {
        if self.directory.as_os_str().is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.directory).map_err(|source| {
            LoggingError::DirectoryCreation {
                path: self.directory.clone(),
                source,
            }
        })
    }
}

/// Initialize the tracing subscriber with file-based logging.
///
/// Respects `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Creates the log
/// directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the path is unusable, the directory cannot be created, or a
/// subscriber is already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let target = LogTarget::resolve(log_path)?;
    target.ensure_directory()?;

    let directory = if target.directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        target.directory.as_path()
    };
    let file_appender = tracing_appender::rolling::never(directory, &target.file_name);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn resolve_splits_directory_and_file_name() {
        let target = LogTarget::resolve(Path::new("/var/log/boview/boview.log")).unwrap();
        assert_eq!(target.directory, PathBuf::from("/var/log/boview"));
        assert_eq!(target.file_name, "boview.log");
    }

    #[test]
    fn resolve_accepts_bare_file_name() {
        let target = LogTarget::resolve(Path::new("boview.log")).unwrap();
        assert!(target.directory.as_os_str().is_empty());
        assert_eq!(target.file_name, "boview.log");
    }

    #[test]
    fn resolve_rejects_root() {
        let result = LogTarget::resolve(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))));
    }

    #[test]
    #[serial(tracing_init)]
    fn init_creates_log_directory_if_missing() {
        let test_dir = std::env::temp_dir().join("boview_test_logs_create");
        let log_file = test_dir.join("test.log");
        let _ = fs::remove_dir_all(&test_dir);

        // The subscriber may already be set by another test; the directory is
        // created before that check.
        let _ = init(&log_file);

        assert!(
            test_dir.exists(),
            "Log directory should be created: {:?}",
            test_dir
        );

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_reports_subscriber_already_set() {
        let test_dir = std::env::temp_dir().join("boview_test_logs_twice");
        let log_file = test_dir.join("twice.log");

        let _ = init(&log_file);
        let second = init(&log_file);
        assert!(matches!(second, Err(LoggingError::SubscriberAlreadySet)));

        let _ = fs::remove_dir_all(&test_dir);
    }
}
