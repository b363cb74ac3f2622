use std::path::PathBuf;

use thiserror::Error;

use crate::backend::ImportValidationReport;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    #[error("Unknown setting \"{name}\" (expected one of: {known})")]
    UnknownSetting { name: String, known: String },

    #[error("Invalid value for setting \"{name}\": {source}")]
    InvalidSettingValue {
        name: String,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Import(#[from] ImportError),
}

/// Failures crossing the backend boundary
#[derive(Debug, Error)]
pub(crate) enum BackendError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed import file {}: {reason}", path.display())]
    MalformedArchive { path: PathBuf, reason: String },

    #[error("Import file {} failed validation: {}", path.display(), issues.join("; "))]
    InvalidImport { path: PathBuf, issues: Vec<String> },

    #[error("Unknown project id {id}")]
    UnknownProject { id: i64 },

    #[error("{operation} is not supported by the local data store")]
    Unsupported { operation: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("Cannot {action} while import is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Import file is not valid: {}", report.issues.join("; "))]
    ValidationFailed { report: ImportValidationReport },

    #[error("{0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("Failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),
}
