use chrono::NaiveDate;
use tracing::debug;

use super::preset::{
    DateRange, Direction, TimePreset, can_shift_forward, infer_preset, match_preset_preferring,
    preset_to_range, shift_date_range,
};
use crate::settings::DashboardViewSettings;

/// The window the dashboard is looking at, kept consistent with its preset.
///
/// `custom` is set when the range is not the live window of `preset`, either because
/// the user picked arbitrary dates or navigated away from the current period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateRangeController {
    preset: TimePreset,
    range: DateRange,
    custom: bool,
}

impl DateRangeController {
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self::with_preset(TimePreset::default(), today)
    }

    pub(crate) fn with_preset(preset: TimePreset, today: NaiveDate) -> Self {
        Self {
            preset,
            range: preset_to_range(preset, today),
            custom: false,
        }
    }

    pub(crate) fn preset(&self) -> TimePreset {
        self.preset
    }

    pub(crate) fn range(&self) -> DateRange {
        self.range
    }

    pub(crate) fn is_custom(&self) -> bool {
        self.custom
    }

    pub(crate) fn set_preset(&mut self, preset: TimePreset, today: NaiveDate) {
        self.preset = preset;
        self.range = preset_to_range(preset, today);
        self.custom = false;
    }

    /// Adopt an arbitrary range. A range matching no preset keeps its dates but
    /// reverts the preset indicator to `Week`.
    pub(crate) fn set_range(&mut self, range: DateRange, today: NaiveDate) {
        let matched = match_preset_preferring(range, today, Some(self.preset));
        self.custom = matched.is_none();
        self.preset = matched.unwrap_or_else(|| infer_preset(range, today));
        self.range = range;
    }

    /// Returns `false` when the range did not move.
    pub(crate) fn shift(&mut self, direction: Direction, today: NaiveDate) -> bool {
        let Some(next) = shift_date_range(self.range, self.preset, direction, today) else {
            debug!(
                event = "dashboard.range.shift_rejected",
                preset = self.preset.as_str(),
                direction = ?direction,
            );
            return false;
        };
        self.range = next;
        self.custom = next != preset_to_range(self.preset, today);
        true
    }

    pub(crate) fn can_shift_forward(&self, today: NaiveDate) -> bool {
        can_shift_forward(self.range, today)
    }

    /// Slide a live preset window onto a new day; custom ranges stay put.
    pub(crate) fn refresh_for(&mut self, today: NaiveDate) {
        if !self.custom {
            self.range = preset_to_range(self.preset, today);
        }
    }

    pub(crate) fn from_view(view: &DashboardViewSettings, today: NaiveDate) -> Self {
        if view.custom
            && let (Some(start), Some(end)) = (view.start, view.end)
            && let Ok(range) = DateRange::new(start, end)
        {
            return Self {
                preset: view.preset,
                range,
                custom: true,
            };
        }
        Self::with_preset(view.preset, today)
    }

    pub(crate) fn to_view(&self) -> DashboardViewSettings {
        DashboardViewSettings {
            preset: self.preset,
            start: Some(self.range.start()),
            end: Some(self.range.end()),
            custom: self.custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn starts_on_live_week() {
        let today = d(2024, 3, 15);
        let ctl = DateRangeController::new(today);
        assert_eq!(ctl.preset(), TimePreset::Week);
        assert_eq!(ctl.range(), preset_to_range(TimePreset::Week, today));
        assert!(!ctl.is_custom());
        assert!(!ctl.can_shift_forward(today));
    }

    #[test]
    fn set_range_matching_preset_clears_custom() {
        let today = d(2024, 3, 15);
        let mut ctl = DateRangeController::new(today);
        ctl.set_range(DateRange::new(d(2024, 3, 1), today).unwrap(), today);
        assert_eq!(ctl.preset(), TimePreset::Month);
        assert!(!ctl.is_custom());
    }

    #[test]
    fn set_range_custom_reverts_indicator_to_week_and_keeps_dates() {
        let today = d(2024, 3, 15);
        let mut ctl = DateRangeController::with_preset(TimePreset::Month, today);
        let custom = DateRange::new(d(2024, 1, 10), d(2024, 1, 20)).unwrap();
        ctl.set_range(custom, today);
        assert_eq!(ctl.preset(), TimePreset::Week);
        assert_eq!(ctl.range(), custom);
        assert!(ctl.is_custom());
    }

    #[test]
    fn set_range_keeps_current_preset_when_windows_coincide() {
        let today = d(2024, 3, 7);
        let mut ctl = DateRangeController::with_preset(TimePreset::Month, today);
        ctl.set_range(preset_to_range(TimePreset::Month, today), today);
        assert_eq!(ctl.preset(), TimePreset::Month);
    }

    #[test]
    fn shift_back_and_forward_returns_to_live_window() {
        let today = d(2024, 3, 15);
        let mut ctl = DateRangeController::with_preset(TimePreset::Month, today);
        assert!(ctl.shift(Direction::Backward, today));
        assert!(ctl.is_custom());
        assert_eq!(ctl.preset(), TimePreset::Month);
        assert!(ctl.can_shift_forward(today));

        assert!(ctl.shift(Direction::Forward, today));
        assert!(!ctl.is_custom());
        assert_eq!(ctl.range(), preset_to_range(TimePreset::Month, today));
        assert!(!ctl.shift(Direction::Forward, today));
    }

    #[test]
    fn all_preset_does_not_move() {
        let today = d(2024, 3, 15);
        let mut ctl = DateRangeController::with_preset(TimePreset::All, today);
        let before = ctl.clone();
        assert!(!ctl.shift(Direction::Backward, today));
        assert_eq!(ctl, before);
    }

    #[test]
    fn refresh_for_slides_live_window_only() {
        let mut live = DateRangeController::with_preset(TimePreset::Today, d(2024, 3, 15));
        live.refresh_for(d(2024, 3, 16));
        assert_eq!(live.range(), DateRange::single(d(2024, 3, 16)));

        let mut navigated = DateRangeController::with_preset(TimePreset::Today, d(2024, 3, 15));
        navigated.shift(Direction::Backward, d(2024, 3, 15));
        navigated.refresh_for(d(2024, 3, 16));
        assert_eq!(navigated.range(), DateRange::single(d(2024, 3, 14)));
    }

    #[test]
    fn view_round_trip_preserves_custom_window() {
        let today = d(2024, 3, 15);
        let mut ctl = DateRangeController::with_preset(TimePreset::Week, today);
        ctl.shift(Direction::Backward, today);
        let restored = DateRangeController::from_view(&ctl.to_view(), today);
        assert_eq!(restored, ctl);
    }

    #[test]
    fn live_view_is_recomputed_for_a_later_day() {
        let ctl = DateRangeController::with_preset(TimePreset::Week, d(2024, 3, 15));
        let restored = DateRangeController::from_view(&ctl.to_view(), d(2024, 3, 20));
        assert_eq!(restored.range(), preset_to_range(TimePreset::Week, d(2024, 3, 20)));
    }
}
