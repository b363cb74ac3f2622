//! Values exchanged across the backend boundary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::range::DateRange;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DaemonStatus {
    pub(crate) running: bool,
    pub(crate) pid: Option<u32>,
    pub(crate) version: Option<String>,
    pub(crate) is_compatible: bool,
    pub(crate) autostart: bool,
    pub(crate) unassigned_sessions: u64,
    pub(crate) unassigned_apps: u64,
    pub(crate) exe_path: Option<String>,
}

/// An imported session that overlaps one already stored for the same application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionConflict {
    pub(crate) application: String,
    pub(crate) imported_start: String,
    pub(crate) imported_end: String,
    pub(crate) existing_start: String,
    pub(crate) existing_end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ImportValidationReport {
    pub(crate) valid: bool,
    pub(crate) missing_projects: Vec<String>,
    pub(crate) missing_applications: Vec<String>,
    pub(crate) overlapping_sessions: Vec<SessionConflict>,
    /// Reasons the file cannot be imported; empty when `valid`
    #[serde(default)]
    pub(crate) issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ImportSummary {
    pub(crate) projects_created: u64,
    pub(crate) apps_created: u64,
    pub(crate) sessions_imported: u64,
    pub(crate) sessions_merged: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SessionCountFilter {
    pub(crate) date_range: Option<DateRange>,
    pub(crate) unassigned: bool,
    /// Minimum session length in seconds
    pub(crate) min_duration: Option<u64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ExportRequest {
    pub(crate) project_id: Option<i64>,
    pub(crate) date_start: Option<NaiveDate>,
    pub(crate) date_end: Option<NaiveDate>,
    pub(crate) output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ExportSummary {
    pub(crate) path: PathBuf,
    pub(crate) projects: u64,
    pub(crate) applications: u64,
    pub(crate) sessions: u64,
}
