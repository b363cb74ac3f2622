//! Persisted dashboard settings

mod persist;
mod records;
mod store;

use serde_json::Value;

use crate::error::AppError;

pub(crate) use persist::{SettingRecord, load, save};
pub(crate) use records::{
    AppearanceSettings, CurrencySettings, DashboardViewSettings, SessionSettings,
    WorkingHoursSettings,
};
pub(crate) use store::{FileStore, KeyValueStore};

pub(crate) const RECORD_NAMES: [&str; 5] = [
    WorkingHoursSettings::NAME,
    SessionSettings::NAME,
    CurrencySettings::NAME,
    AppearanceSettings::NAME,
    DashboardViewSettings::NAME,
];

#[derive(Clone, Copy)]
enum Op<'a> {
    Show,
    Set(&'a Value),
    Reset,
}

fn apply<T: SettingRecord>(store: &dyn KeyValueStore, op: Op<'_>) -> Value {
    let record: T = match op {
        Op::Show => load(store),
        Op::Set(raw) => persist::save_with(
            store,
            &T::primary_key(),
            &T::legacy_key(),
            T::normalize,
            raw,
        ),
        Op::Reset => save(store, &T::default()),
    };
    serde_json::to_value(record).unwrap_or(Value::Null)
}

fn dispatch(store: &dyn KeyValueStore, name: &str, op: Op<'_>) -> Result<Value, AppError> {
    let value = match name {
        "working-hours" => apply::<WorkingHoursSettings>(store, op),
        "sessions" => apply::<SessionSettings>(store, op),
        "currency" => apply::<CurrencySettings>(store, op),
        "appearance" => apply::<AppearanceSettings>(store, op),
        "view" => apply::<DashboardViewSettings>(store, op),
        _ => {
            return Err(AppError::UnknownSetting {
                name: name.to_string(),
                known: RECORD_NAMES.join(", "),
            });
        }
    };
    Ok(value)
}

/// Current value of one record, as JSON
pub(crate) fn show(store: &dyn KeyValueStore, name: &str) -> Result<Value, AppError> {
    dispatch(store, name, Op::Show)
}

pub(crate) fn show_all(store: &dyn KeyValueStore) -> Vec<(&'static str, Value)> {
    RECORD_NAMES
        .iter()
        .filter_map(|name| show(store, name).ok().map(|value| (*name, value)))
        .collect()
}

/// Store `json` for a record; returns the normalized value actually persisted
pub(crate) fn set(store: &dyn KeyValueStore, name: &str, json: &str) -> Result<Value, AppError> {
    let raw: Value = serde_json::from_str(json).map_err(|source| AppError::InvalidSettingValue {
        name: name.to_string(),
        source,
    })?;
    dispatch(store, name, Op::Set(&raw))
}

pub(crate) fn reset(store: &dyn KeyValueStore, name: &str) -> Result<Value, AppError> {
    dispatch(store, name, Op::Reset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::store::MemoryStore;

    #[test]
    fn unknown_record_lists_known_names() {
        let store = MemoryStore::default();
        let err = show(&store, "theme").unwrap_err();
        assert!(err.to_string().contains("working-hours, sessions"));
    }

    #[test]
    fn set_returns_normalized_value() {
        let store = MemoryStore::default();
        let value = set(&store, "currency", r#"{"code": "gbp"}"#).unwrap();
        assert_eq!(value["code"], "GBP");
        assert_eq!(show(&store, "currency").unwrap()["code"], "GBP");
    }

    #[test]
    fn set_rejects_invalid_json() {
        let store = MemoryStore::default();
        let err = set(&store, "currency", "gbp").unwrap_err();
        assert!(matches!(err, AppError::InvalidSettingValue { .. }));
        assert!(!store.contains("timeflow.settings.currency"));
    }

    #[test]
    fn reset_writes_defaults() {
        let store = MemoryStore::default();
        set(&store, "sessions", r#"{"gap_fill_minutes": 30}"#).unwrap();
        let value = reset(&store, "sessions").unwrap();
        assert_eq!(value["gap_fill_minutes"], 5);
        assert_eq!(load::<SessionSettings>(&store), SessionSettings::default());
    }

    #[test]
    fn show_all_covers_every_record() {
        let store = MemoryStore::default();
        let all = show_all(&store);
        let names: Vec<_> = all.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, RECORD_NAMES);
    }
}
