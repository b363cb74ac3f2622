mod data;
mod format;
mod import;
mod range;
mod settings;
mod status;

pub(crate) use data::{
    output_count_json, output_export_json, output_rebuild_json, print_count, print_export,
    print_rebuild,
};
pub(crate) use format::to_pretty_json;
pub(crate) use import::{
    output_import_json, output_pending_json, output_validation_json, print_import_summary,
    print_pending, print_validation_report,
};
pub(crate) use range::{RangeView, output_range_json, print_range_table};
pub(crate) use settings::{output_settings_json, print_settings_table};
pub(crate) use status::{
    WatchSnapshot, format_snapshot_line, output_snapshot_json, output_status_json,
    print_status_table,
};
