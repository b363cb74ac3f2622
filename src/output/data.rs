use serde_json::json;

use crate::backend::ExportSummary;
use crate::output::format::{format_duration, format_number, key_value_table, to_pretty_json};
use crate::range::DateRange;

pub(crate) fn print_count(
    range: Option<DateRange>,
    unassigned: bool,
    min_duration: Option<u64>,
    count: u64,
) {
    let mut scope = Vec::new();
    if unassigned {
        scope.push("unassigned".to_string());
    }
    if let Some(secs) = min_duration {
        scope.push(format!("at least {}", format_duration(secs)));
    }
    let scope = if scope.is_empty() {
        String::new()
    } else {
        format!(" ({})", scope.join(", "))
    };
    match range {
        Some(range) => println!("{} sessions in {range}{scope}", format_number(count)),
        None => println!("{} sessions{scope}", format_number(count)),
    }
}

pub(crate) fn output_count_json(
    range: Option<DateRange>,
    unassigned: bool,
    min_duration: Option<u64>,
    count: u64,
) -> String {
    to_pretty_json(&json!({
        "range": range,
        "unassigned": unassigned,
        "min_duration": min_duration,
        "sessions": count,
    }))
}

pub(crate) fn print_rebuild(gap_fill_minutes: u32, merged: u64) {
    if merged == 0 {
        println!("No sessions within {gap_fill_minutes} min of each other; nothing merged");
    } else {
        println!(
            "Merged {} sessions (gap fill {gap_fill_minutes} min)",
            format_number(merged)
        );
    }
}

pub(crate) fn output_rebuild_json(gap_fill_minutes: u32, merged: u64) -> String {
    to_pretty_json(&json!({
        "gap_fill_minutes": gap_fill_minutes,
        "merged": merged,
    }))
}

pub(crate) fn print_export(summary: &ExportSummary, use_color: bool) {
    let rows = [
        ("File", summary.path.display().to_string()),
        ("Projects", format_number(summary.projects)),
        ("Applications", format_number(summary.applications)),
        ("Sessions", format_number(summary.sessions)),
    ];
    println!("\n  Export Written\n");
    println!("{}", key_value_table(&rows, use_color));
}

pub(crate) fn output_export_json(summary: &ExportSummary) -> String {
    to_pretty_json(summary)
}
