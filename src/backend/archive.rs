//! On-disk archive format shared by import and export

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::consts::ARCHIVE_VERSION;
use crate::error::BackendError;
use crate::utils::parse_datetime;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Archive {
    #[serde(default = "default_version")]
    pub(crate) version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) exported_at: Option<String>,
    #[serde(default)]
    pub(crate) projects: Vec<ArchiveProject>,
    #[serde(default)]
    pub(crate) applications: Vec<ArchiveApplication>,
    #[serde(default)]
    pub(crate) sessions: Vec<ArchiveSession>,
}

fn default_version() -> u32 {
    ARCHIVE_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArchiveProject {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArchiveApplication {
    pub(crate) exe_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArchiveSession {
    pub(crate) app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) project: Option<String>,
    pub(crate) start: String,
    pub(crate) end: String,
}

/// A session that passed the structural checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedSession {
    pub(crate) app: String,
    pub(crate) project: Option<String>,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
}

/// Application names are matched case-insensitively
pub(crate) fn normalize_exe(name: &str) -> String {
    name.trim().to_lowercase()
}

fn clean_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

impl Archive {
    pub(crate) fn read(path: &Path) -> Result<Self, BackendError> {
        let content = fs::read_to_string(path).map_err(|source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive: Archive =
            serde_json::from_str(&content).map_err(|e| BackendError::MalformedArchive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if archive.version > ARCHIVE_VERSION {
            return Err(BackendError::MalformedArchive {
                path: path.to_path_buf(),
                reason: format!(
                    "archive version {} is newer than supported version {ARCHIVE_VERSION}",
                    archive.version
                ),
            });
        }
        Ok(archive)
    }

    pub(crate) fn write(&self, path: &Path) -> Result<(), BackendError> {
        let io_err = |source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    /// Project names referenced anywhere in the archive, first spelling wins
    pub(crate) fn project_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let explicit = self.projects.iter().map(|p| Some(p.name.as_str()));
        let from_apps = self.applications.iter().map(|a| a.project.as_deref());
        let from_sessions = self.sessions.iter().map(|s| s.project.as_deref());
        explicit
            .chain(from_apps)
            .chain(from_sessions)
            .filter_map(clean_name)
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect()
    }

    /// Normalized application names: declared ones first, then session-only ones
    pub(crate) fn application_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let declared = self.applications.iter().map(|a| a.exe_name.as_str());
        let from_sessions = self.sessions.iter().map(|s| s.app.as_str());
        declared
            .chain(from_sessions)
            .map(normalize_exe)
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    pub(crate) fn application(&self, exe_name: &str) -> Option<&ArchiveApplication> {
        self.applications
            .iter()
            .find(|a| normalize_exe(&a.exe_name) == exe_name)
    }

    pub(crate) fn project_color(&self, name: &str) -> Option<&str> {
        self.projects
            .iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(name))
            .and_then(|p| p.color.as_deref())
    }

    /// Split sessions into usable ones and human-readable problems
    pub(crate) fn parse_sessions(&self) -> (Vec<ParsedSession>, Vec<String>) {
        let mut parsed = Vec::with_capacity(self.sessions.len());
        let mut issues = Vec::new();

        for (index, session) in self.sessions.iter().enumerate() {
            let number = index + 1;
            let app = normalize_exe(&session.app);
            if app.is_empty() {
                issues.push(format!("session #{number} has no application"));
                continue;
            }
            let (Some(start), Some(end)) = (parse_datetime(&session.start), parse_datetime(&session.end))
            else {
                issues.push(format!(
                    "session #{number} ({app}) has an unreadable timestamp"
                ));
                continue;
            };
            if end < start {
                issues.push(format!(
                    "session #{number} ({app}) ends before it starts"
                ));
                continue;
            }
            parsed.push(ParsedSession {
                app,
                project: clean_name(session.project.as_deref()),
                start,
                end,
            });
        }

        for app in &self.applications {
            if normalize_exe(&app.exe_name).is_empty() {
                issues.push("an application entry has an empty exe_name".to_string());
            }
        }

        (parsed, issues)
    }
}
