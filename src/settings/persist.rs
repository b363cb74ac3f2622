//! Versioned settings records with legacy-key migration
//!
//! Loading never fails: missing, unparseable or out-of-range data falls back to
//! defaults. Saving normalizes first, so the returned value is what was stored.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::consts::{LEGACY_SETTINGS_PREFIX, SETTINGS_PREFIX};

/// A settings record stored under `timeflow.settings.<NAME>`
pub(crate) trait SettingRecord: Serialize + Default + Sized {
    const NAME: &'static str;

    /// Build a valid record from arbitrary JSON, field by field
    fn normalize(raw: &Value) -> Self;

    fn primary_key() -> String {
        format!("{SETTINGS_PREFIX}{}", Self::NAME)
    }

    fn legacy_key() -> String {
        format!("{LEGACY_SETTINGS_PREFIX}{}", Self::NAME)
    }
}

pub(crate) fn load_with<T, F>(
    store: &dyn KeyValueStore,
    primary: &str,
    legacy: &str,
    normalize: F,
) -> T
where
    T: Default,
    F: Fn(&Value) -> T,
{
    let raw = match store.get(primary) {
        Some(raw) => raw,
        None => match store.get(legacy) {
            Some(raw) => {
                migrate(store, primary, legacy, &raw);
                raw
            }
            None => return T::default(),
        },
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => normalize(&value),
        Err(e) => {
            warn!(
                event = "dashboard.settings.unparseable",
                key = primary,
                error = %e,
            );
            T::default()
        }
    }
}

fn migrate(store: &dyn KeyValueStore, primary: &str, legacy: &str, raw: &str) {
    if let Err(e) = store.set(primary, raw) {
        warn!(
            event = "dashboard.settings.migration_failed",
            key = primary,
            error = %e,
        );
        return;
    }
    if let Err(e) = store.remove(legacy) {
        warn!(event = "dashboard.settings.legacy_remove_failed", key = legacy, error = %e);
    }
    debug!(event = "dashboard.settings.migrated", from = legacy, to = primary);
}

pub(crate) fn save_with<T, F>(
    store: &dyn KeyValueStore,
    primary: &str,
    legacy: &str,
    normalize: F,
    value: &Value,
) -> T
where
    T: Serialize,
    F: Fn(&Value) -> T,
{
    let normalized = normalize(value);
    match serde_json::to_string(&normalized) {
        Ok(json) => {
            if let Err(e) = store.set(primary, &json) {
                warn!(event = "dashboard.settings.write_failed", key = primary, error = %e);
            }
        }
        Err(e) => warn!(event = "dashboard.settings.encode_failed", key = primary, error = %e),
    }
    if let Err(e) = store.remove(legacy) {
        warn!(event = "dashboard.settings.legacy_remove_failed", key = legacy, error = %e);
    }
    normalized
}

pub(crate) fn load<T: SettingRecord>(store: &dyn KeyValueStore) -> T {
    load_with(store, &T::primary_key(), &T::legacy_key(), T::normalize)
}

pub(crate) fn save<T: SettingRecord>(store: &dyn KeyValueStore, value: &T) -> T {
    let raw = serde_json::to_value(value).unwrap_or(Value::Null);
    save_with(store, &T::primary_key(), &T::legacy_key(), T::normalize, &raw)
}
