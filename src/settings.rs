use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, SETTINGS_KEY};
use crate::types::settings::{FieldRange, Settings, CACHE_GC_TIME, CACHE_STALE_TIME, REFRESH_INTERVAL};

/// Read settings from storage. Never fails: anything unusable becomes a default.
pub fn load_settings(store: &dyn KeyValueStore) -> Settings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            warn!(key = SETTINGS_KEY, "No stored settings, using defaults");
            return Settings::default();
        }
        Err(e) => {
            warn!(error = %e, key = SETTINGS_KEY, "Failed to read settings, using defaults");
            return Settings::default();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, key = SETTINGS_KEY, "Stored settings are corrupt, using defaults");
            return Settings::default();
        }
    };

    let (settings, defaulted) = Settings::from_json_lenient(&value);
    if !defaulted.is_empty() {
        warn!(fields = ?defaulted, "Stored settings incomplete, defaulted missing fields");
    }
    settings
}

/// Write the full settings object. Failures are logged, never returned.
pub fn save_settings(store: &dyn KeyValueStore, settings: &Settings) {
    let json = match serde_json::to_string(settings) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to encode settings");
            return;
        }
    };
    if let Err(e) = store.set(SETTINGS_KEY, &json) {
        warn!(error = %e, key = SETTINGS_KEY, "Failed to persist settings");
    }
}

/// Owner of the live [`Settings`] value.
///
/// Every update clamps, publishes to subscribers, then re-persists all fields.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    current: watch::Sender<Settings>,
}

impl SettingsStore {
    /// Load once from storage.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = load_settings(store.as_ref());
        debug!(?settings, "Settings loaded");
        let (current, _) = watch::channel(settings);
        Self { store, current }
    }

    pub fn current(&self) -> Settings {
        *self.current.borrow()
    }

    /// Receiver that observes every update as soon as it is applied.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.current.subscribe()
    }

    pub fn update_refresh_interval(&self, n: f64) -> Settings {
        self.update_field(REFRESH_INTERVAL, n, |s, v| s.refresh_interval_seconds = v)
    }

    pub fn update_cache_stale_time(&self, n: f64) -> Settings {
        self.update_field(CACHE_STALE_TIME, n, |s, v| s.cache_stale_time_minutes = v)
    }

    pub fn update_cache_gc_time(&self, n: f64) -> Settings {
        self.update_field(CACHE_GC_TIME, n, |s, v| s.cache_gc_time_minutes = v)
    }

    /// Restore the built-in defaults.
    pub fn reset(&self) -> Settings {
        self.replace(Settings::default())
    }

    fn update_field(&self, range: FieldRange, n: f64, apply: impl FnOnce(&mut Settings, u32)) -> Settings {
        let value = range.clamp(n);
        debug!(field = range.name, requested = n, stored = value, "Updating setting");
        let mut next = self.current();
        apply(&mut next, value);
        self.replace(next)
    }

    fn replace(&self, next: Settings) -> Settings {
        self.current.send_replace(next);
        save_settings(self.store.as_ref(), &next);
        next
    }
}
