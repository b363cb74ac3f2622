//! Backend boundary
//!
//! Everything that mutates tracked data lives behind the [`Backend`] trait. The
//! dashboard core only calls these operations and reacts to their results.

mod archive;
mod local;
mod merge;
mod types;

use std::path::Path;

use crate::error::BackendError;

pub(crate) use local::LocalBackend;
pub(crate) use types::{
    DaemonStatus, ExportRequest, ExportSummary, ImportSummary, ImportValidationReport,
    SessionCountFilter,
};

/// Operations offered by the tracking backend
pub(crate) trait Backend {
    fn daemon_status(&self) -> Result<DaemonStatus, BackendError>;

    fn start_daemon(&self) -> Result<(), BackendError>;

    fn stop_daemon(&self) -> Result<(), BackendError>;

    fn restart_daemon(&self) -> Result<(), BackendError>;

    /// Inspect an import file against current data. Must not mutate anything.
    fn validate_import(&self, path: &Path) -> Result<ImportValidationReport, BackendError>;

    fn import_data(&self, path: &Path) -> Result<ImportSummary, BackendError>;

    /// Merge sessions separated by at most `gap_fill_minutes`; returns how many were absorbed
    fn rebuild_sessions(&self, gap_fill_minutes: u32) -> Result<u64, BackendError>;

    fn session_count(&self, filter: &SessionCountFilter) -> Result<u64, BackendError>;

    fn export_data(&self, request: &ExportRequest) -> Result<ExportSummary, BackendError>;
}
