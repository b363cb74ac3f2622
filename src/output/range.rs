use chrono::NaiveDate;
use serde::Serialize;

use crate::output::format::{key_value_table, to_pretty_json, yes_no};
use crate::range::{DateRangeController, TimePreset};

/// Serializable view of the controller for a given day
#[derive(Debug, Serialize)]
pub(crate) struct RangeView {
    preset: TimePreset,
    start: NaiveDate,
    end: NaiveDate,
    days: i64,
    custom: bool,
    can_shift_forward: bool,
}

impl RangeView {
    pub(crate) fn new(controller: &DateRangeController, today: NaiveDate) -> Self {
        let range = controller.range();
        Self {
            preset: controller.preset(),
            start: range.start(),
            end: range.end(),
            days: range.days(),
            custom: controller.is_custom(),
            can_shift_forward: controller.can_shift_forward(today),
        }
    }
}

pub(crate) fn print_range_table(view: &RangeView, use_color: bool) {
    let preset = if view.custom {
        format!("{} (custom)", view.preset)
    } else {
        view.preset.to_string()
    };
    let rows = [
        ("Preset", preset),
        ("Start", view.start.to_string()),
        ("End", view.end.to_string()),
        ("Days", view.days.to_string()),
        ("Can go forward", yes_no(view.can_shift_forward).to_string()),
    ];
    println!("\n  Dashboard Range\n");
    println!("{}", key_value_table(&rows, use_color));
}

pub(crate) fn output_range_json(view: &RangeView) -> String {
    to_pretty_json(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_carries_dates_and_flags() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let controller = DateRangeController::with_preset(TimePreset::Month, today);
        let json = output_range_json(&RangeView::new(&controller, today));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["preset"], "month");
        assert_eq!(value["start"], "2024-03-01");
        assert_eq!(value["end"], "2024-03-15");
        assert_eq!(value["days"], 15);
        assert_eq!(value["can_shift_forward"], false);
    }
}
