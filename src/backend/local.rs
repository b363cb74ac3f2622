//! Backend implementation over the dashboard's SQLite database
//!
//! Tracked data lives in `timeflow_dashboard.db`; the daemon reports its own state
//! through `daemon_status.json` in the same directory.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::archive::{Archive, ArchiveApplication, ArchiveProject, ArchiveSession, ParsedSession};
use super::merge::{Span, merge_with_gap, overlaps};
use super::types::{
    DaemonStatus, ExportRequest, ExportSummary, ImportSummary, ImportValidationReport,
    SessionConflict, SessionCountFilter,
};
use super::Backend;
use crate::consts::{
    ARCHIVE_VERSION, DAEMON_HEARTBEAT_TIMEOUT_SECS, DAEMON_STATUS_FILE_NAME, DATE_FORMAT,
    DB_FILE_NAME,
};
use crate::error::BackendError;
use crate::utils::{format_datetime, parse_datetime};

const DASHBOARD_VERSION: &str = env!("CARGO_PKG_VERSION");

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    color TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exe_name TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL
);
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    app_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_app_start ON sessions(app_id, start_time);
";

/// Heartbeat file written by the daemon
#[derive(Debug, Default, Deserialize)]
struct DaemonStatusFile {
    pid: Option<u32>,
    version: Option<String>,
    exe_path: Option<String>,
    #[serde(default)]
    autostart: bool,
    heartbeat: Option<DateTime<Utc>>,
}

/// Validation outcome plus the sessions that survived parsing
struct ImportPlan {
    report: ImportValidationReport,
    sessions: Vec<ParsedSession>,
}

pub(crate) struct LocalBackend {
    conn: Connection,
    status_path: PathBuf,
}

impl LocalBackend {
    pub(crate) fn open(data_dir: &Path) -> Result<Self, BackendError> {
        fs::create_dir_all(data_dir).map_err(|source| BackendError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let conn = Connection::open(data_dir.join(DB_FILE_NAME))?;
        conn.busy_timeout(std::time::Duration::from_millis(2000))?;
        Self::with_connection(conn, data_dir.join(DAEMON_STATUS_FILE_NAME))
    }

    #[cfg(test)]
    pub(crate) fn in_memory(status_path: PathBuf) -> Result<Self, BackendError> {
        Self::with_connection(Connection::open_in_memory()?, status_path)
    }

    fn with_connection(conn: Connection, status_path: PathBuf) -> Result<Self, BackendError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, status_path })
    }

    fn read_status_file(&self) -> Result<Option<DaemonStatusFile>, BackendError> {
        if !self.status_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.status_path).map_err(|source| BackendError::Io {
            path: self.status_path.clone(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn inspect(&self, archive: &Archive) -> Result<ImportPlan, BackendError> {
        let (sessions, issues) = archive.parse_sessions();

        let mut missing_projects = Vec::new();
        for name in archive.project_names() {
            if find_project(&self.conn, &name)?.is_none() {
                missing_projects.push(name);
            }
        }

        let mut missing_applications = Vec::new();
        for exe in archive.application_names() {
            if find_application(&self.conn, &exe)?.is_none() {
                missing_applications.push(exe);
            }
        }

        let mut overlapping_sessions = Vec::new();
        for session in &sessions {
            let Some((app_id, _)) = find_application(&self.conn, &session.app)? else {
                continue;
            };
            for existing in overlapping_spans(&self.conn, app_id, session.start, session.end)? {
                overlapping_sessions.push(SessionConflict {
                    application: session.app.clone(),
                    imported_start: format_datetime(session.start),
                    imported_end: format_datetime(session.end),
                    existing_start: format_datetime(existing.start),
                    existing_end: format_datetime(existing.end),
                });
            }
        }

        Ok(ImportPlan {
            report: ImportValidationReport {
                valid: issues.is_empty(),
                missing_projects,
                missing_applications,
                overlapping_sessions,
                issues,
            },
            sessions,
        })
    }
}

impl Backend for LocalBackend {
    fn daemon_status(&self) -> Result<DaemonStatus, BackendError> {
        let file = self.read_status_file()?;
        let unassigned_sessions = count(&self.conn, "SELECT COUNT(*) FROM sessions WHERE project_id IS NULL")?;
        let unassigned_apps = count(&self.conn, "SELECT COUNT(*) FROM applications WHERE project_id IS NULL")?;
        Ok(build_status(file, Utc::now(), unassigned_sessions, unassigned_apps))
    }

    fn start_daemon(&self) -> Result<(), BackendError> {
        Err(BackendError::Unsupported {
            operation: "starting the daemon",
        })
    }

    fn stop_daemon(&self) -> Result<(), BackendError> {
        Err(BackendError::Unsupported {
            operation: "stopping the daemon",
        })
    }

    fn restart_daemon(&self) -> Result<(), BackendError> {
        Err(BackendError::Unsupported {
            operation: "restarting the daemon",
        })
    }

    fn validate_import(&self, path: &Path) -> Result<ImportValidationReport, BackendError> {
        let archive = Archive::read(path)?;
        let plan = self.inspect(&archive)?;
        info!(
            event = "dashboard.import.validated",
            path = %path.display(),
            valid = plan.report.valid,
            missing_projects = plan.report.missing_projects.len(),
            missing_applications = plan.report.missing_applications.len(),
            overlaps = plan.report.overlapping_sessions.len(),
        );
        Ok(plan.report)
    }

    fn import_data(&self, path: &Path) -> Result<ImportSummary, BackendError> {
        let archive = Archive::read(path)?;
        let plan = self.inspect(&archive)?;
        if !plan.report.valid {
            return Err(BackendError::InvalidImport {
                path: path.to_path_buf(),
                issues: plan.report.issues,
            });
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut summary = ImportSummary::default();
        let created_at = Utc::now().to_rfc3339();

        for name in archive.project_names() {
            if find_project(&tx, &name)?.is_some() {
                continue;
            }
            tx.execute(
                "INSERT INTO projects (name, color, created_at) VALUES (?1, ?2, ?3)",
                params![name, archive.project_color(&name), created_at],
            )?;
            summary.projects_created += 1;
        }

        for exe in archive.application_names() {
            if find_application(&tx, &exe)?.is_some() {
                continue;
            }
            let declared = archive.application(&exe);
            let display_name = declared
                .and_then(|a| a.display_name.as_deref())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(&exe)
                .to_string();
            let project_id = match declared.and_then(|a| a.project.as_deref()) {
                Some(name) => find_project(&tx, name.trim())?,
                None => None,
            };
            tx.execute(
                "INSERT INTO applications (exe_name, display_name, project_id) VALUES (?1, ?2, ?3)",
                params![exe, display_name, project_id],
            )?;
            summary.apps_created += 1;
        }

        for session in &plan.sessions {
            let Some((app_id, app_project)) = find_application(&tx, &session.app)? else {
                continue;
            };
            let project_id = match &session.project {
                Some(name) => find_project(&tx, name)?,
                None => app_project,
            };

            let existing = overlapping_spans(&tx, app_id, session.start, session.end)?;
            let Some(first) = existing.first() else {
                insert_session(&tx, app_id, project_id, session.start, session.end)?;
                summary.sessions_imported += 1;
                continue;
            };

            let start = existing.iter().map(|s| s.start).fold(session.start, NaiveDateTime::min);
            let end = existing.iter().map(|s| s.end).fold(session.end, NaiveDateTime::max);
            update_session(&tx, first.id, start, end)?;
            for absorbed in &existing[1..] {
                tx.execute("DELETE FROM sessions WHERE id = ?1", [absorbed.id])?;
            }
            summary.sessions_merged += 1;
        }

        tx.commit()?;
        info!(
            event = "dashboard.import.committed",
            path = %path.display(),
            projects_created = summary.projects_created,
            apps_created = summary.apps_created,
            sessions_imported = summary.sessions_imported,
            sessions_merged = summary.sessions_merged,
        );
        Ok(summary)
    }

    fn rebuild_sessions(&self, gap_fill_minutes: u32) -> Result<u64, BackendError> {
        let gap = Duration::minutes(i64::from(gap_fill_minutes));
        let tx = self.conn.unchecked_transaction()?;

        let mut groups: BTreeMap<(i64, Option<i64>), Vec<Span>> = BTreeMap::new();
        {
            let mut stmt = tx.prepare(
                "SELECT id, app_id, project_id, start_time, end_time FROM sessions
                 ORDER BY app_id, project_id, start_time",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;
            for row in rows {
                let (id, app_id, project_id, start, end) = row?;
                let (Some(start), Some(end)) = (parse_datetime(&start), parse_datetime(&end)) else {
                    debug!(event = "dashboard.rebuild.unreadable_row", id = id);
                    continue;
                };
                groups
                    .entry((app_id, project_id))
                    .or_default()
                    .push(Span { id, start, end });
            }
        }

        let mut absorbed = 0u64;
        for spans in groups.into_values() {
            for merged in merge_with_gap(spans, gap) {
                if !merged.changed() {
                    continue;
                }
                update_session(&tx, merged.keep, merged.start, merged.end)?;
                for id in &merged.absorbed {
                    tx.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
                }
                absorbed += merged.absorbed.len() as u64;
            }
        }

        tx.commit()?;
        info!(
            event = "dashboard.rebuild.completed",
            gap_fill_minutes = gap_fill_minutes,
            merged = absorbed,
        );
        Ok(absorbed)
    }

    fn session_count(&self, filter: &SessionCountFilter) -> Result<u64, BackendError> {
        let mut sql = String::from("SELECT COUNT(*) FROM sessions WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();

        if let Some(range) = &filter.date_range {
            sql.push_str(" AND substr(start_time, 1, 10) BETWEEN ? AND ?");
            args.push(Value::Text(range.start().format(DATE_FORMAT).to_string()));
            args.push(Value::Text(range.end().format(DATE_FORMAT).to_string()));
        }
        if filter.unassigned {
            sql.push_str(" AND project_id IS NULL");
        }
        if let Some(min) = filter.min_duration {
            sql.push_str(" AND duration_seconds >= ?");
            args.push(Value::Integer(i64::try_from(min).unwrap_or(i64::MAX)));
        }

        let total: i64 = self
            .conn
            .query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }

    fn export_data(&self, request: &ExportRequest) -> Result<ExportSummary, BackendError> {
        if let Some(id) = request.project_id {
            let exists = self
                .conn
                .query_row("SELECT 1 FROM projects WHERE id = ?1", [id], |_| Ok(()))
                .optional()?
                .is_some();
            if !exists {
                return Err(BackendError::UnknownProject { id });
            }
        }

        let mut sql = String::from(
            "SELECT a.exe_name, a.display_name, pa.name, p.name, s.start_time, s.end_time
             FROM sessions s
             JOIN applications a ON a.id = s.app_id
             LEFT JOIN projects p ON p.id = s.project_id
             LEFT JOIN projects pa ON pa.id = a.project_id
             WHERE 1 = 1",
        );
        let mut args: Vec<Value> = Vec::new();
        if let Some(id) = request.project_id {
            sql.push_str(" AND s.project_id = ?");
            args.push(Value::Integer(id));
        }
        if let Some(start) = request.date_start {
            sql.push_str(" AND substr(s.start_time, 1, 10) >= ?");
            args.push(Value::Text(start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = request.date_end {
            sql.push_str(" AND substr(s.start_time, 1, 10) <= ?");
            args.push(Value::Text(end.format(DATE_FORMAT).to_string()));
        }
        sql.push_str(" ORDER BY s.start_time, s.id");

        let mut sessions = Vec::new();
        let mut applications: BTreeMap<String, ArchiveApplication> = BTreeMap::new();
        let mut project_names: BTreeSet<String> = BTreeSet::new();
        {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;
            for row in rows {
                let (exe_name, display_name, app_project, project, start, end) = row?;
                project_names.extend(app_project.iter().chain(project.iter()).cloned());
                applications
                    .entry(exe_name.clone())
                    .or_insert_with(|| ArchiveApplication {
                        exe_name: exe_name.clone(),
                        display_name: Some(display_name),
                        project: app_project,
                    });
                sessions.push(ArchiveSession {
                    app: exe_name,
                    project,
                    start,
                    end,
                });
            }
        }

        let colors = project_colors(&self.conn)?;
        let projects: Vec<ArchiveProject> = project_names
            .into_iter()
            .map(|name| ArchiveProject {
                color: colors.get(&name).cloned().flatten(),
                name,
            })
            .collect();

        let archive = Archive {
            version: ARCHIVE_VERSION,
            exported_at: Some(Utc::now().to_rfc3339()),
            projects,
            applications: applications.into_values().collect(),
            sessions,
        };
        archive.write(&request.output)?;

        let summary = ExportSummary {
            path: request.output.clone(),
            projects: archive.projects.len() as u64,
            applications: archive.applications.len() as u64,
            sessions: archive.sessions.len() as u64,
        };
        info!(
            event = "dashboard.export.written",
            path = %summary.path.display(),
            sessions = summary.sessions,
        );
        Ok(summary)
    }
}

fn build_status(
    file: Option<DaemonStatusFile>,
    now: DateTime<Utc>,
    unassigned_sessions: u64,
    unassigned_apps: u64,
) -> DaemonStatus {
    let Some(file) = file else {
        return DaemonStatus {
            is_compatible: true,
            unassigned_sessions,
            unassigned_apps,
            ..DaemonStatus::default()
        };
    };

    let running = file
        .heartbeat
        .is_some_and(|beat| (now - beat).num_seconds().abs() <= DAEMON_HEARTBEAT_TIMEOUT_SECS);
    let is_compatible = match file.version.as_deref() {
        Some(version) => versions_compatible(version, DASHBOARD_VERSION),
        None => !running,
    };

    DaemonStatus {
        running,
        pid: file.pid.filter(|_| running),
        version: file.version,
        is_compatible,
        autostart: file.autostart,
        unassigned_sessions,
        unassigned_apps,
        exe_path: file.exe_path,
    }
}

fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor: String = parts
        .next()
        .unwrap_or("0")
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    Some((major, minor.parse().ok()?))
}

/// Daemon and dashboard agree when major and minor versions match
fn versions_compatible(daemon: &str, dashboard: &str) -> bool {
    match (major_minor(daemon), major_minor(dashboard)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn count(conn: &Connection, sql: &str) -> Result<u64, BackendError> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

fn find_project(conn: &Connection, name: &str) -> Result<Option<i64>, BackendError> {
    Ok(conn
        .query_row("SELECT id FROM projects WHERE name = ?1", [name], |row| row.get(0))
        .optional()?)
}

/// `(id, default project)` of an application
fn find_application(
    conn: &Connection,
    exe_name: &str,
) -> Result<Option<(i64, Option<i64>)>, BackendError> {
    Ok(conn
        .query_row(
            "SELECT id, project_id FROM applications WHERE exe_name = ?1",
            [exe_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

fn project_colors(conn: &Connection) -> Result<HashMap<String, Option<String>>, BackendError> {
    let mut stmt = conn.prepare("SELECT name, color FROM projects")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
}

/// Stored sessions of `app_id` intersecting `[start, end]`, earliest first
fn overlapping_spans(
    conn: &Connection,
    app_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Span>, BackendError> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time FROM sessions
         WHERE app_id = ?1 AND start_time <= ?3 AND end_time >= ?2
         ORDER BY start_time, id",
    )?;
    let rows = stmt.query_map(
        params![app_id, format_datetime(start), format_datetime(end)],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    )?;

    let mut spans = Vec::new();
    for row in rows {
        let (id, s, e) = row?;
        if let (Some(s), Some(e)) = (parse_datetime(&s), parse_datetime(&e))
            && overlaps(start, end, s, e)
        {
            spans.push(Span { id, start: s, end: e });
        }
    }
    Ok(spans)
}

fn insert_session(
    conn: &Connection,
    app_id: i64,
    project_id: Option<i64>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(), BackendError> {
    conn.execute(
        "INSERT INTO sessions (app_id, project_id, start_time, end_time, duration_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            app_id,
            project_id,
            format_datetime(start),
            format_datetime(end),
            (end - start).num_seconds()
        ],
    )?;
    Ok(())
}

fn update_session(
    conn: &Connection,
    id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<(), BackendError> {
    conn.execute(
        "UPDATE sessions SET start_time = ?1, end_time = ?2, duration_seconds = ?3 WHERE id = ?4",
        params![format_datetime(start), format_datetime(end), (end - start).num_seconds(), id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::DateRange;
    use chrono::NaiveDate;
    use tempfile::{TempDir, tempdir};

    const FIRST_IMPORT: &str = r##"{
        "version": 1,
        "projects": [{"name": "Client A", "color": "#38bdf8"}],
        "applications": [
            {"exe_name": "code.exe", "display_name": "VS Code", "project": "Client A"},
            {"exe_name": "slack.exe", "display_name": "Slack"}
        ],
        "sessions": [
            {"app": "code.exe", "start": "2024-03-14T09:00:00", "end": "2024-03-14T10:00:00"},
            {"app": "code.exe", "start": "2024-03-14T10:03:00", "end": "2024-03-14T11:00:00"},
            {"app": "slack.exe", "start": "2024-03-15T09:00:00", "end": "2024-03-15T09:01:00"},
            {"app": "figma.exe", "project": "Client B", "start": "2024-03-15T13:00:00", "end": "2024-03-15T15:00:00"}
        ]
    }"##;

    fn setup() -> (TempDir, LocalBackend) {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::in_memory(dir.path().join(DAEMON_STATUS_FILE_NAME)).unwrap();
        (dir, backend)
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn total(backend: &LocalBackend) -> u64 {
        backend.session_count(&SessionCountFilter::default()).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn validation_is_read_only_and_repeatable() {
        let (dir, backend) = setup();
        let path = write(&dir, "import.json", FIRST_IMPORT);

        let first = backend.validate_import(&path).unwrap();
        let second = backend.validate_import(&path).unwrap();
        assert_eq!(first, second);
        assert!(first.valid);
        assert_eq!(first.missing_projects, vec!["Client A", "Client B"]);
        assert_eq!(
            first.missing_applications,
            vec!["code.exe", "slack.exe", "figma.exe"]
        );
        assert!(first.overlapping_sessions.is_empty());
        assert_eq!(total(&backend), 0);
    }

    #[test]
    fn import_creates_entities_and_sessions() {
        let (dir, backend) = setup();
        let path = write(&dir, "import.json", FIRST_IMPORT);

        let summary = backend.import_data(&path).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                projects_created: 2,
                apps_created: 3,
                sessions_imported: 4,
                sessions_merged: 0,
            }
        );
        assert_eq!(total(&backend), 4);

        // slack has no project, everything else inherits one
        let unassigned = SessionCountFilter {
            unassigned: true,
            ..SessionCountFilter::default()
        };
        assert_eq!(backend.session_count(&unassigned).unwrap(), 1);
    }

    #[test]
    fn reimport_merges_instead_of_duplicating() {
        let (dir, backend) = setup();
        let path = write(&dir, "import.json", FIRST_IMPORT);
        backend.import_data(&path).unwrap();

        let report = backend.validate_import(&path).unwrap();
        assert!(report.missing_projects.is_empty());
        assert!(report.missing_applications.is_empty());
        assert_eq!(report.overlapping_sessions.len(), 4);

        let summary = backend.import_data(&path).unwrap();
        assert_eq!(summary.sessions_imported, 0);
        assert_eq!(summary.sessions_merged, 4);
        assert_eq!(summary.projects_created, 0);
        assert_eq!(total(&backend), 4);
    }

    #[test]
    fn overlapping_import_extends_existing_session() {
        let (dir, backend) = setup();
        backend
            .import_data(&write(&dir, "a.json", FIRST_IMPORT))
            .unwrap();
        let extra = write(
            &dir,
            "b.json",
            r#"{"sessions": [{"app": "Slack.exe", "start": "2024-03-15T08:30:00", "end": "2024-03-15T09:00:30"}]}"#,
        );
        let report = backend.validate_import(&extra).unwrap();
        assert_eq!(report.overlapping_sessions.len(), 1);
        assert_eq!(report.overlapping_sessions[0].existing_start, "2024-03-15T09:00:00");

        backend.import_data(&extra).unwrap();
        let long = SessionCountFilter {
            min_duration: Some(30 * 60),
            unassigned: true,
            ..SessionCountFilter::default()
        };
        assert_eq!(backend.session_count(&long).unwrap(), 1);
    }

    #[test]
    fn invalid_file_is_reported_and_refused() {
        let (dir, backend) = setup();
        let path = write(
            &dir,
            "bad.json",
            r#"{"sessions": [{"app": "code.exe", "start": "2024-03-15T10:00:00", "end": "2024-03-15T09:00:00"}]}"#,
        );
        let report = backend.validate_import(&path).unwrap();
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 1);

        let err = backend.import_data(&path).unwrap_err();
        assert!(matches!(err, BackendError::InvalidImport { .. }));
        assert_eq!(total(&backend), 0);
        assert_eq!(backend.daemon_status().unwrap().unassigned_apps, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (dir, backend) = setup();
        let path = write(&dir, "broken.json", "[1, 2");
        assert!(matches!(
            backend.validate_import(&path),
            Err(BackendError::MalformedArchive { .. })
        ));
    }

    #[test]
    fn rebuild_fills_small_gaps() {
        let (dir, backend) = setup();
        backend
            .import_data(&write(&dir, "a.json", FIRST_IMPORT))
            .unwrap();

        assert_eq!(backend.rebuild_sessions(2).unwrap(), 0);
        assert_eq!(backend.rebuild_sessions(5).unwrap(), 1);
        assert_eq!(total(&backend), 3);
        // idempotent once merged
        assert_eq!(backend.rebuild_sessions(5).unwrap(), 0);
    }

    #[test]
    fn session_count_filters_by_date_range() {
        let (dir, backend) = setup();
        backend
            .import_data(&write(&dir, "a.json", FIRST_IMPORT))
            .unwrap();
        let day = |date| SessionCountFilter {
            date_range: Some(DateRange::single(date)),
            ..SessionCountFilter::default()
        };
        assert_eq!(backend.session_count(&day(d(2024, 3, 14))).unwrap(), 2);
        assert_eq!(backend.session_count(&day(d(2024, 3, 15))).unwrap(), 2);
        assert_eq!(backend.session_count(&day(d(2024, 3, 16))).unwrap(), 0);
    }

    #[test]
    fn export_round_trips_into_fresh_store() {
        let (dir, backend) = setup();
        backend
            .import_data(&write(&dir, "a.json", FIRST_IMPORT))
            .unwrap();

        let output = dir.path().join("out").join("export.json");
        let summary = backend
            .export_data(&ExportRequest {
                project_id: None,
                date_start: Some(d(2024, 3, 15)),
                date_end: None,
                output: output.clone(),
            })
            .unwrap();
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.applications, 2);
        assert_eq!(summary.projects, 1);

        let (_other_dir, fresh) = setup();
        let imported = fresh.import_data(&output).unwrap();
        assert_eq!(imported.sessions_imported, 2);
        assert_eq!(imported.projects_created, 1);
    }

    #[test]
    fn export_unknown_project_fails() {
        let (dir, backend) = setup();
        let err = backend
            .export_data(&ExportRequest {
                project_id: Some(42),
                date_start: None,
                date_end: None,
                output: dir.path().join("x.json"),
            })
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownProject { id: 42 }));
    }

    #[test]
    fn missing_status_file_means_stopped() {
        let (_dir, backend) = setup();
        let status = backend.daemon_status().unwrap();
        assert!(!status.running);
        assert!(status.is_compatible);
        assert_eq!(status.pid, None);
    }

    #[test]
    fn fresh_heartbeat_means_running() {
        let (dir, backend) = setup();
        let beat = Utc::now().to_rfc3339();
        write(
            &dir,
            DAEMON_STATUS_FILE_NAME,
            &format!(
                r#"{{"pid": 4242, "version": "{DASHBOARD_VERSION}", "autostart": true, "heartbeat": "{beat}"}}"#
            ),
        );
        let status = backend.daemon_status().unwrap();
        assert!(status.running);
        assert!(status.is_compatible);
        assert!(status.autostart);
        assert_eq!(status.pid, Some(4242));
    }

    #[test]
    fn stale_heartbeat_means_stopped() {
        let now = Utc::now();
        let file = DaemonStatusFile {
            pid: Some(1),
            version: Some("9.9.0".to_string()),
            heartbeat: Some(now - Duration::minutes(5)),
            ..DaemonStatusFile::default()
        };
        let status = build_status(Some(file), now, 0, 0);
        assert!(!status.running);
        assert!(!status.is_compatible);
        assert_eq!(status.pid, None);
    }

    #[test]
    fn version_compatibility_uses_major_minor() {
        assert!(versions_compatible("0.3.7", "0.3.0"));
        assert!(versions_compatible("v1.2.0-beta", "1.2.9"));
        assert!(!versions_compatible("0.4.0", "0.3.0"));
        assert!(!versions_compatible("garbage", "0.3.0"));
    }

    #[test]
    fn daemon_control_is_unsupported_locally() {
        let (_dir, backend) = setup();
        assert!(matches!(
            backend.start_daemon(),
            Err(BackendError::Unsupported { .. })
        ));
        assert!(backend.stop_daemon().is_err());
        assert!(backend.restart_daemon().is_err());
    }
}
