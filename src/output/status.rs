use comfy_table::Color;
use serde::Serialize;

use crate::backend::DaemonStatus;
use crate::output::format::{
    create_styled_table, flag_cell, format_number, header_cell, right_cell, styled_cell,
    to_pretty_json,
};
use crate::range::DateRange;

pub(crate) fn print_status_table(status: &DaemonStatus, use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![header_cell("Field", use_color), header_cell("Value", use_color)]);

    table.add_row(vec![
        styled_cell("Running", None, true),
        flag_cell(status.running, true, use_color),
    ]);
    table.add_row(vec![
        styled_cell("PID", None, true),
        styled_cell(
            &status.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
            None,
            false,
        ),
    ]);
    table.add_row(vec![
        styled_cell("Version", None, true),
        styled_cell(status.version.as_deref().unwrap_or("unknown"), None, false),
    ]);
    table.add_row(vec![
        styled_cell("Compatible", None, true),
        flag_cell(status.is_compatible, true, use_color),
    ]);
    table.add_row(vec![
        styled_cell("Autostart", None, true),
        flag_cell(status.autostart, true, false),
    ]);
    let warn = |n: u64| (use_color && n > 0).then_some(Color::Yellow);
    table.add_row(vec![
        styled_cell("Unassigned sessions", None, true),
        right_cell(
            &format_number(status.unassigned_sessions),
            warn(status.unassigned_sessions),
            false,
        ),
    ]);
    table.add_row(vec![
        styled_cell("Unassigned apps", None, true),
        right_cell(
            &format_number(status.unassigned_apps),
            warn(status.unassigned_apps),
            false,
        ),
    ]);
    if let Some(path) = &status.exe_path {
        table.add_row(vec![
            styled_cell("Executable", None, true),
            styled_cell(path, None, false),
        ]);
    }

    println!("\n  TimeFlow Daemon\n");
    println!("{table}");
    if !status.is_compatible {
        println!("\n  Daemon version does not match this dashboard; restart it after upgrading.\n");
    }
}

pub(crate) fn output_status_json(status: &DaemonStatus) -> String {
    to_pretty_json(status)
}

/// What `watch` shows each time the refresh bus fires
#[derive(Debug, Serialize)]
pub(crate) struct WatchSnapshot<'a> {
    pub(crate) refresh: u64,
    pub(crate) range: DateRange,
    pub(crate) sessions: Option<u64>,
    pub(crate) status: Option<&'a DaemonStatus>,
    /// The latest status poll failed; `status` is the last good one
    pub(crate) stale: bool,
}

/// One line per snapshot, suitable for a terminal or a log
pub(crate) fn format_snapshot_line(snapshot: &WatchSnapshot<'_>) -> String {
    let daemon = match snapshot.status {
        Some(s) if s.running => match &s.version {
            Some(v) => format!("running v{v}"),
            None => "running".to_string(),
        },
        Some(_) => "stopped".to_string(),
        None => "unknown".to_string(),
    };
    let daemon = if snapshot.stale {
        format!("{daemon} (stale)")
    } else {
        daemon
    };
    let sessions = snapshot
        .sessions
        .map_or_else(|| "?".to_string(), format_number);
    let mut parts = vec![
        format!("#{}", snapshot.refresh),
        snapshot.range.to_string(),
        format!("{sessions} sessions"),
        format!("daemon {daemon}"),
    ];
    if let Some(s) = snapshot.status
        && s.unassigned_sessions > 0
    {
        parts.push(format!("{} unassigned", format_number(s.unassigned_sessions)));
    }
    parts.join(" | ")
}

pub(crate) fn output_snapshot_json(snapshot: &WatchSnapshot<'_>) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|e| {
        eprintln!("Failed to serialize JSON output: {e}");
        "{}".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::single(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn snapshot_line_for_running_daemon() {
        let status = DaemonStatus {
            running: true,
            version: Some("0.3.1".to_string()),
            unassigned_sessions: 1200,
            ..DaemonStatus::default()
        };
        let line = format_snapshot_line(&WatchSnapshot {
            refresh: 4,
            range: range(),
            sessions: Some(12),
            status: Some(&status),
            stale: false,
        });
        assert_eq!(
            line,
            "#4 | 2024-03-15 .. 2024-03-15 | 12 sessions | daemon running v0.3.1 | 1,200 unassigned"
        );
    }

    #[test]
    fn snapshot_line_before_first_poll() {
        let line = format_snapshot_line(&WatchSnapshot {
            refresh: 1,
            range: range(),
            sessions: None,
            status: None,
            stale: true,
        });
        assert!(line.ends_with("? sessions | daemon unknown (stale)"));
    }

    #[test]
    fn status_json_round_trips() {
        let status = DaemonStatus {
            pid: Some(7),
            ..DaemonStatus::default()
        };
        let back: DaemonStatus = serde_json::from_str(&output_status_json(&status)).unwrap();
        assert_eq!(back, status);
    }
}
