//! Error types for boview.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via `?` and
//! `From` conversions up to [`AppError`] in the binary.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for the viewer binary
//!   - [`crate::config::ConfigError`] - Config file read/parse failures
//!   - [`crate::logging::LoggingError`] - Tracing subscriber setup failures
//!   - [`FetchError`] - Page fetch failures (source unreadable, cancelled, transport)
//!   - [`crate::view::TuiError`] - Terminal failures
//! - [`StorageError`] - Key-value preference store failures
//!
//! # Recovery Strategy
//!
//! Inside the state managers nothing is fatal:
//! - **Fetch failures** are recorded as a message on the navigation manager. Existing rows
//!   stay on screen; retry is an explicit `refresh()`.
//! - **Storage failures** are swallowed with a `warn!` and a default value is used.
//! - **Stale fetch completions** are not errors at all; they are discarded.
//!
//! Only startup failures (bad config, unreadable data file, broken terminal) reach `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// The record source could not be opened.
    #[error("Failed to load records: {0}")]
    Fetch(#[from] FetchError),

    /// The terminal viewer failed.
    ///
    /// **Recovery**: Attempt terminal cleanup, then exit with the error on stderr.
    #[error("Viewer error: {0}")]
    Viewer(#[from] crate::view::TuiError),
}

/// Errors produced by a [`crate::source::PageFetcher`].
///
/// The navigation manager turns these into a human-readable message via `Display`,
/// so every variant's message is written for an operator to read inline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request was superseded by a newer one and aborted.
    ///
    /// **When this occurs**: A fetcher observed its cancellation token firing. The
    /// navigation manager never surfaces this variant for the request that superseded it.
    #[error("Request was cancelled")]
    Cancelled,

    /// The backing record file could not be read or decoded.
    #[error("Failed to read records from {path}: {reason}")]
    Source {
        /// Path of the record file.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Any other transport-level failure, already phrased for display.
    #[error("{0}")]
    Transport(String),
}

/// Errors from a [`crate::storage::KeyValueStore`].
///
/// Callers in the state layer never propagate these; they log and fall back.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure while reading or writing the preference file.
    #[error("Preference store I/O error at {path}: {source}")]
    Io {
        /// Preference file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be (de)serialized.
    #[error("Preference store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store is unusable (poisoned lock, disabled backend).
    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_are_operator_readable() {
        let err = FetchError::Source {
            path: PathBuf::from("/tmp/payments.json"),
            reason: "expected an array".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/payments.json"));
        assert!(msg.contains("expected an array"));

        assert_eq!(
            FetchError::Transport("gateway timeout".into()).to_string(),
            "gateway timeout"
        );
    }

    #[test]
    fn app_error_wraps_fetch_error() {
        let err: AppError = FetchError::Cancelled.into();
        assert!(matches!(err, AppError::Fetch(FetchError::Cancelled)));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn storage_error_from_serde() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: StorageError = serde_err.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
