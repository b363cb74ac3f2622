//! The persisted settings records and their normalization rules

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::persist::SettingRecord;
use crate::range::TimePreset;

const TIME_FORMAT: &str = "%H:%M";

/// `gap_fill_minutes` -> `gapFillMinutes`
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Field by its snake_case name, or the camelCase spelling older dashboards wrote
fn field<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw.get(name).or_else(|| raw.get(camel_case(name).as_str()))
}

fn str_field<'a>(raw: &'a Value, name: &str) -> Option<&'a str> {
    field(raw, name).and_then(Value::as_str).map(str::trim)
}

fn bool_field(raw: &Value, name: &str, default: bool) -> bool {
    field(raw, name).and_then(Value::as_bool).unwrap_or(default)
}

/// Integer field clamped into `[min, max]`; non-numbers give `default`
fn clamped_field(raw: &Value, name: &str, min: i64, max: i64, default: i64) -> i64 {
    let Some(value) = field(raw, name) else {
        return default;
    };
    if let Some(n) = value.as_i64() {
        n.clamp(min, max)
    } else if let Some(f) = value.as_f64()
        && f.is_finite()
    {
        (f.round() as i64).clamp(min, max)
    } else {
        default
    }
}

fn time_field(raw: &Value, name: &str) -> Option<NaiveTime> {
    str_field(raw, name).and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok())
}

fn date_field(raw: &Value, name: &str) -> Option<NaiveDate> {
    str_field(raw, name).and_then(|s| crate::utils::parse_date(s).ok())
}

/// `#RGB` or `#RRGGBB`
fn is_hex_color(s: &str) -> bool {
    matches!(s.len(), 4 | 7)
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WorkingHoursSettings {
    pub(crate) start: String,
    pub(crate) end: String,
    pub(crate) color: String,
}

impl Default for WorkingHoursSettings {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            color: "#10b981".to_string(),
        }
    }
}

impl SettingRecord for WorkingHoursSettings {
    const NAME: &'static str = "working-hours";

    fn normalize(raw: &Value) -> Self {
        let defaults = Self::default();
        let start = time_field(raw, "start");
        let end = time_field(raw, "end");
        if let (Some(start), Some(end)) = (start, end)
            && end <= start
        {
            return defaults;
        }

        let format = |t: NaiveTime| t.format(TIME_FORMAT).to_string();
        let normalized = Self {
            start: start.map_or(defaults.start.clone(), format),
            end: end.map_or(defaults.end.clone(), format),
            color: str_field(raw, "color")
                .filter(|c| is_hex_color(c))
                .map_or(defaults.color.clone(), str::to_lowercase),
        };
        // one field falling back can still leave the window inverted
        if normalized.end <= normalized.start {
            return defaults;
        }
        normalized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionSettings {
    pub(crate) gap_fill_minutes: u32,
    pub(crate) min_duration_seconds: u32,
    pub(crate) rebuild_on_startup: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            gap_fill_minutes: 5,
            min_duration_seconds: 0,
            rebuild_on_startup: false,
        }
    }
}

impl SettingRecord for SessionSettings {
    const NAME: &'static str = "sessions";

    fn normalize(raw: &Value) -> Self {
        let d = Self::default();
        Self {
            gap_fill_minutes: clamped_field(raw, "gap_fill_minutes", 0, 30, d.gap_fill_minutes.into())
                as u32,
            min_duration_seconds: clamped_field(
                raw,
                "min_duration_seconds",
                0,
                3600,
                d.min_duration_seconds.into(),
            ) as u32,
            rebuild_on_startup: bool_field(raw, "rebuild_on_startup", d.rebuild_on_startup),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CurrencySettings {
    pub(crate) code: String,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            code: "USD".to_string(),
        }
    }
}

impl SettingRecord for CurrencySettings {
    const NAME: &'static str = "currency";

    fn normalize(raw: &Value) -> Self {
        let code = str_field(raw, "code")
            .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase);
        code.map_or_else(Self::default, |code| Self { code })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AppearanceSettings {
    pub(crate) chart_animations: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            chart_animations: true,
        }
    }
}

impl SettingRecord for AppearanceSettings {
    const NAME: &'static str = "appearance";

    fn normalize(raw: &Value) -> Self {
        Self {
            chart_animations: bool_field(raw, "chart_animations", true),
        }
    }
}

/// The dashboard's last selected range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DashboardViewSettings {
    pub(crate) preset: TimePreset,
    pub(crate) start: Option<NaiveDate>,
    pub(crate) end: Option<NaiveDate>,
    pub(crate) custom: bool,
}

impl SettingRecord for DashboardViewSettings {
    const NAME: &'static str = "view";

    fn normalize(raw: &Value) -> Self {
        let start = date_field(raw, "start");
        let end = date_field(raw, "end");
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Self::default();
        }
        Self {
            preset: str_field(raw, "preset")
                .and_then(TimePreset::parse)
                .unwrap_or_default(),
            start,
            end,
            custom: bool_field(raw, "custom", false),
        }
    }
}
