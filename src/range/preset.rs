//! Named time presets and the pure date-window arithmetic behind them.
//!
//! Every function takes the reference day explicitly so results never depend
//! on the wall clock.

use chrono::{Days, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::{ALL_TIME_START, DATE_FORMAT};
use crate::error::AppError;
use crate::utils::{first_of_month, last_of_month};

/// Inclusive calendar-day window, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub(crate) struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = AppError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub(crate) fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub(crate) fn start(&self) -> NaiveDate {
        self.start
    }

    pub(crate) fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included
    pub(crate) fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TimePreset {
    /// Only the current day
    Today,
    /// The last seven days, today included (default)
    #[default]
    Week,
    /// From the first of the current month to today
    Month,
    /// Everything recorded so far
    All,
}

impl TimePreset {
    /// Candidate order used when classifying a range
    pub(crate) const ALL: [TimePreset; 4] = [
        TimePreset::Today,
        TimePreset::Week,
        TimePreset::Month,
        TimePreset::All,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TimePreset::Today => "today",
            TimePreset::Week => "week",
            TimePreset::Month => "month",
            TimePreset::All => "all",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == lower)
    }
}

impl fmt::Display for TimePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Backward,
    Forward,
}

pub(crate) fn all_time_start() -> NaiveDate {
    let (year, month, day) = ALL_TIME_START;
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

pub(crate) fn preset_to_range(preset: TimePreset, today: NaiveDate) -> DateRange {
    let start = match preset {
        TimePreset::Today => today,
        TimePreset::Week => today.checked_sub_days(Days::new(6)).unwrap_or(today),
        TimePreset::Month => first_of_month(today),
        TimePreset::All => all_time_start().min(today),
    };
    DateRange { start, end: today }
}

/// The preset that currently produces exactly `range`, or `None` for a custom range
pub(crate) fn match_preset(range: DateRange, today: NaiveDate) -> Option<TimePreset> {
    TimePreset::ALL
        .into_iter()
        .find(|&preset| preset_to_range(preset, today) == range)
}

/// Like [`match_preset`], but keeps `current` when several presets coincide
/// (Month and Today on the 1st, Week and Month on the 7th).
pub(crate) fn match_preset_preferring(
    range: DateRange,
    today: NaiveDate,
    current: Option<TimePreset>,
) -> Option<TimePreset> {
    if let Some(preset) = current
        && preset_to_range(preset, today) == range
    {
        return Some(preset);
    }
    match_preset(range, today)
}

/// Classify a range, falling back to `Week` when it matches no preset.
pub(crate) fn infer_preset(range: DateRange, today: NaiveDate) -> TimePreset {
    match_preset(range, today).unwrap_or(TimePreset::Week)
}

/// Move the window one step in `direction`. `None` means the range stays as it is:
/// `All` never shifts, and a forward shift whose start would pass `today` is rejected.
pub(crate) fn shift_date_range(
    range: DateRange,
    preset: TimePreset,
    direction: Direction,
    today: NaiveDate,
) -> Option<DateRange> {
    let (start, end) = match preset {
        TimePreset::All => return None,
        TimePreset::Today => shift_days(range, 1, direction)?,
        TimePreset::Week => shift_days(range, 7, direction)?,
        TimePreset::Month => {
            let anchor = first_of_month(range.start);
            let step = Months::new(1);
            let first = match direction {
                Direction::Backward => anchor.checked_sub_months(step)?,
                Direction::Forward => anchor.checked_add_months(step)?,
            };
            (first, last_of_month(first))
        }
    };

    if direction == Direction::Forward && start > today {
        return None;
    }

    DateRange::new(start, end.min(today)).ok()
}

fn shift_days(range: DateRange, days: u64, direction: Direction) -> Option<(NaiveDate, NaiveDate)> {
    let step = Days::new(days);
    match direction {
        Direction::Backward => Some((
            range.start.checked_sub_days(step)?,
            range.end.checked_sub_days(step)?,
        )),
        Direction::Forward => Some((
            range.start.checked_add_days(step)?,
            range.end.checked_add_days(step)?,
        )),
    }
}

pub(crate) fn can_shift_forward(range: DateRange, today: NaiveDate) -> bool {
    range.end < today
}
