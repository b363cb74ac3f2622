use comfy_table::Color;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::backend::{ImportSummary, ImportValidationReport};
use crate::output::format::{
    create_styled_table, format_number, header_cell, key_value_table, right_cell, styled_cell,
    to_pretty_json,
};

pub(crate) fn print_validation_report(
    path: &Path,
    report: &ImportValidationReport,
    use_color: bool,
) {
    let yellow = use_color.then_some(Color::Yellow);
    println!("\n  Import Check: {}\n", path.display());

    let verdict = if report.valid { "valid" } else { "invalid" };
    let verdict_color = use_color.then_some(if report.valid { Color::Green } else { Color::Red });
    let mut table = create_styled_table();
    table.set_header(vec![header_cell("Check", use_color), header_cell("Result", use_color)]);
    table.add_row(vec![
        styled_cell("File", None, true),
        styled_cell(verdict, verdict_color, true),
    ]);
    table.add_row(vec![
        styled_cell("New projects", None, true),
        styled_cell(&list_or_dash(&report.missing_projects), None, false),
    ]);
    table.add_row(vec![
        styled_cell("New applications", None, true),
        styled_cell(&list_or_dash(&report.missing_applications), None, false),
    ]);
    let overlaps = report.overlapping_sessions.len() as u64;
    table.add_row(vec![
        styled_cell("Overlapping sessions", None, true),
        right_cell(
            &format_number(overlaps),
            yellow.filter(|_| overlaps > 0),
            false,
        ),
    ]);
    println!("{table}");

    if !report.overlapping_sessions.is_empty() {
        let mut conflicts = create_styled_table();
        conflicts.set_header(vec![
            header_cell("Application", use_color),
            header_cell("Imported", use_color),
            header_cell("Existing", use_color),
        ]);
        for c in &report.overlapping_sessions {
            conflicts.add_row(vec![
                styled_cell(&c.application, None, false),
                styled_cell(&format!("{} .. {}", c.imported_start, c.imported_end), None, false),
                styled_cell(&format!("{} .. {}", c.existing_start, c.existing_end), yellow, false),
            ]);
        }
        println!("\n  Overlapping sessions are merged into the existing ones on import.\n");
        println!("{conflicts}");
    }

    for issue in &report.issues {
        println!("  - {issue}");
    }
    println!();
}

fn list_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

pub(crate) fn output_validation_json(path: &Path, report: &ImportValidationReport) -> String {
    to_pretty_json(&json!({
        "path": path,
        "report": report,
    }))
}

pub(crate) fn print_import_summary(path: &Path, summary: &ImportSummary, use_color: bool) {
    let rows = [
        ("Projects created", format_number(summary.projects_created)),
        ("Applications created", format_number(summary.apps_created)),
        ("Sessions imported", format_number(summary.sessions_imported)),
        ("Sessions merged", format_number(summary.sessions_merged)),
    ];
    println!("\n  Imported {}\n", path.display());
    println!("{}", key_value_table(&rows, use_color));
}

pub(crate) fn output_import_json(
    path: &Path,
    report: &ImportValidationReport,
    summary: &ImportSummary,
) -> String {
    to_pretty_json(&json!({
        "path": path,
        "report": report,
        "summary": summary,
    }))
}

pub(crate) fn print_pending(dir: &Path, files: &[PathBuf]) {
    if files.is_empty() {
        println!("No pending imports in {}", dir.display());
        return;
    }
    println!("\n  Pending imports in {}\n", dir.display());
    for file in files {
        let name = file.file_name().map_or_else(
            || file.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        println!("  {name}");
    }
    println!();
}

pub(crate) fn output_pending_json(files: &[PathBuf]) -> String {
    to_pretty_json(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_json_nests_report() {
        let report = ImportValidationReport {
            valid: true,
            missing_projects: vec!["Client A".to_string()],
            ..ImportValidationReport::default()
        };
        let json = output_validation_json(Path::new("a.json"), &report);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["path"], "a.json");
        assert_eq!(value["report"]["missing_projects"][0], "Client A");
    }

    #[test]
    fn list_or_dash_for_empty() {
        assert_eq!(list_or_dash(&[]), "-");
        assert_eq!(list_or_dash(&["a".to_string(), "b".to_string()]), "a, b");
    }
}
