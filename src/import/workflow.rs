use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::backend::{Backend, ImportSummary, ImportValidationReport};
use crate::error::{BackendError, ImportError};

/// Where an import stands. Data is only mutated between `Importing` and `Summarized`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum ImportState {
    #[default]
    Idle,
    Validated {
        path: PathBuf,
        report: ImportValidationReport,
    },
    Importing {
        path: PathBuf,
    },
    Summarized {
        summary: ImportSummary,
    },
}

impl ImportState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validated { .. } => "validated",
            Self::Importing { .. } => "importing",
            Self::Summarized { .. } => "summarized",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ImportWorkflow {
    state: ImportState,
}

impl ImportWorkflow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> &ImportState {
        &self.state
    }

    fn reject(&self, action: &'static str) -> ImportError {
        ImportError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    /// Check `path` against current data. Only the read-only backend call is made.
    pub(crate) fn validate(
        &mut self,
        backend: &dyn Backend,
        path: &Path,
    ) -> Result<ImportValidationReport, ImportError> {
        if !matches!(self.state, ImportState::Idle | ImportState::Validated { .. }) {
            return Err(self.reject("validate"));
        }

        let report = match backend.validate_import(path) {
            Ok(report) => report,
            Err(e) => {
                self.state = ImportState::Idle;
                return Err(e.into());
            }
        };
        if !report.valid {
            self.state = ImportState::Idle;
            return Err(ImportError::ValidationFailed { report });
        }

        self.state = ImportState::Validated {
            path: path.to_path_buf(),
            report: report.clone(),
        };
        Ok(report)
    }

    pub(crate) fn cancel(&mut self) -> Result<(), ImportError> {
        if !matches!(self.state, ImportState::Validated { .. }) {
            return Err(self.reject("cancel"));
        }
        self.state = ImportState::Idle;
        Ok(())
    }

    /// Move to `Importing` and hand back the validated file
    pub(crate) fn begin_commit(&mut self) -> Result<PathBuf, ImportError> {
        let ImportState::Validated { path, .. } = &self.state else {
            return Err(self.reject("commit"));
        };
        let path = path.clone();
        self.state = ImportState::Importing { path: path.clone() };
        Ok(path)
    }

    pub(crate) fn complete(
        &mut self,
        result: Result<ImportSummary, BackendError>,
    ) -> Result<ImportSummary, ImportError> {
        let ImportState::Importing { path } = &self.state else {
            return Err(self.reject("complete"));
        };
        match result {
            Ok(summary) => {
                info!(
                    event = "dashboard.import.summarized",
                    path = %path.display(),
                    sessions_imported = summary.sessions_imported,
                    sessions_merged = summary.sessions_merged,
                );
                self.state = ImportState::Summarized { summary };
                Ok(summary)
            }
            Err(e) => {
                warn!(
                    event = "dashboard.import.failed",
                    path = %path.display(),
                    error = %e,
                );
                self.state = ImportState::Idle;
                Err(e.into())
            }
        }
    }

    pub(crate) fn commit(&mut self, backend: &dyn Backend) -> Result<ImportSummary, ImportError> {
        let path = self.begin_commit()?;
        let result = backend.import_data(&path);
        self.complete(result)
    }

    /// Dismiss the summary and return to `Idle`
    pub(crate) fn acknowledge(&mut self) -> Result<ImportSummary, ImportError> {
        let ImportState::Summarized { summary } = self.state else {
            return Err(self.reject("acknowledge"));
        };
        self.state = ImportState::Idle;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DaemonStatus, ExportRequest, ExportSummary, SessionCountFilter};
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeBackend {
        invalid: bool,
        fail_validation: bool,
        fail_import: bool,
        validations: Cell<u32>,
        imports: Cell<u32>,
    }

    impl Backend for FakeBackend {
        fn daemon_status(&self) -> Result<DaemonStatus, BackendError> {
            Ok(DaemonStatus::default())
        }

        fn start_daemon(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn stop_daemon(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn restart_daemon(&self) -> Result<(), BackendError> {
            Ok(())
        }

        fn validate_import(&self, _path: &Path) -> Result<ImportValidationReport, BackendError> {
            self.validations.set(self.validations.get() + 1);
            if self.fail_validation {
                return Err(BackendError::Unsupported {
                    operation: "validation",
                });
            }
            Ok(ImportValidationReport {
                valid: !self.invalid,
                missing_projects: vec!["Client A".to_string()],
                issues: if self.invalid {
                    vec!["session #1 ends before it starts".to_string()]
                } else {
                    Vec::new()
                },
                ..ImportValidationReport::default()
            })
        }

        fn import_data(&self, _path: &Path) -> Result<ImportSummary, BackendError> {
            self.imports.set(self.imports.get() + 1);
            if self.fail_import {
                return Err(BackendError::UnknownProject { id: 1 });
            }
            Ok(ImportSummary {
                projects_created: 1,
                apps_created: 2,
                sessions_imported: 3,
                sessions_merged: 0,
            })
        }

        fn rebuild_sessions(&self, _gap_fill_minutes: u32) -> Result<u64, BackendError> {
            Ok(0)
        }

        fn session_count(&self, _filter: &SessionCountFilter) -> Result<u64, BackendError> {
            Ok(0)
        }

        fn export_data(&self, request: &ExportRequest) -> Result<ExportSummary, BackendError> {
            Ok(ExportSummary {
                path: request.output.clone(),
                projects: 0,
                applications: 0,
                sessions: 0,
            })
        }
    }

    fn path() -> PathBuf {
        PathBuf::from("import.json")
    }

    #[test]
    fn happy_path_runs_full_cycle() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();

        let report = flow.validate(&backend, &path()).unwrap();
        assert_eq!(report.missing_projects, vec!["Client A"]);
        assert_eq!(flow.state().name(), "validated");
        assert_eq!(backend.imports.get(), 0);

        let summary = flow.commit(&backend).unwrap();
        assert_eq!(summary.sessions_imported, 3);
        assert_eq!(flow.state().name(), "summarized");

        assert_eq!(flow.acknowledge().unwrap(), summary);
        assert_eq!(flow.state(), &ImportState::Idle);
        assert_eq!(backend.imports.get(), 1);
    }

    #[test]
    fn commit_without_validation_is_rejected() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();
        let err = flow.commit(&backend).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InvalidTransition {
                state: "idle",
                action: "commit"
            }
        ));
        assert_eq!(backend.imports.get(), 0);
    }

    #[test]
    fn invalid_report_returns_to_idle_with_report() {
        let backend = FakeBackend {
            invalid: true,
            ..FakeBackend::default()
        };
        let mut flow = ImportWorkflow::new();
        let err = flow.validate(&backend, &path()).unwrap_err();
        match err {
            ImportError::ValidationFailed { report } => assert_eq!(report.issues.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(flow.state(), &ImportState::Idle);
        assert!(flow.commit(&backend).is_err());
        assert_eq!(backend.imports.get(), 0);
    }

    #[test]
    fn validation_rpc_failure_returns_to_idle() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();
        flow.validate(&backend, &path()).unwrap();

        let failing = FakeBackend {
            fail_validation: true,
            ..FakeBackend::default()
        };
        assert!(matches!(
            flow.validate(&failing, &path()),
            Err(ImportError::Backend(_))
        ));
        assert_eq!(flow.state(), &ImportState::Idle);
    }

    #[test]
    fn revalidation_replaces_candidate() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();
        flow.validate(&backend, Path::new("a.json")).unwrap();
        flow.validate(&backend, Path::new("b.json")).unwrap();
        assert_eq!(backend.validations.get(), 2);
        assert_eq!(flow.begin_commit().unwrap(), PathBuf::from("b.json"));
    }

    #[test]
    fn cancel_discards_validation_without_backend_call() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();
        flow.validate(&backend, &path()).unwrap();
        flow.cancel().unwrap();
        assert_eq!(flow.state(), &ImportState::Idle);
        assert!(flow.cancel().is_err());
        assert_eq!(backend.imports.get(), 0);
    }

    #[test]
    fn failed_import_never_hangs_in_importing() {
        let backend = FakeBackend {
            fail_import: true,
            ..FakeBackend::default()
        };
        let mut flow = ImportWorkflow::new();
        flow.validate(&backend, &path()).unwrap();
        assert!(flow.commit(&backend).is_err());
        assert_eq!(flow.state(), &ImportState::Idle);
    }

    #[test]
    fn no_validation_while_importing_or_summarized() {
        let backend = FakeBackend::default();
        let mut flow = ImportWorkflow::new();
        flow.validate(&backend, &path()).unwrap();
        flow.begin_commit().unwrap();
        assert!(flow.validate(&backend, &path()).is_err());
        assert!(flow.acknowledge().is_err());

        flow.complete(backend.import_data(&path())).unwrap();
        let err = flow.validate(&backend, &path()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot validate while import is summarized");
    }
}
