//! Date range state: presets, shifting and the controller that keeps them consistent

mod controller;
mod preset;

pub(crate) use controller::DateRangeController;
pub(crate) use preset::{DateRange, Direction, TimePreset};
pub(crate) use preset::all_time_start;
