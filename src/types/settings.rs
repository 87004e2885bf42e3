use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Inclusive range and default for one integer setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub name: &'static str,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl FieldRange {
    /// Round to the nearest integer, then clamp into `[min, max]`.
    /// NaN resolves to the default.
    pub fn clamp(&self, n: f64) -> u32 {
        if n.is_nan() {
            return self.default;
        }
        n.round().clamp(self.min as f64, self.max as f64) as u32
    }
}

pub const REFRESH_INTERVAL: FieldRange = FieldRange {
    name: "refreshInterval",
    min: 5,
    max: 600,
    default: 30,
};

pub const CACHE_STALE_TIME: FieldRange = FieldRange {
    name: "cacheStaleTimeMinutes",
    min: 0,
    max: 60,
    default: 5,
};

pub const CACHE_GC_TIME: FieldRange = FieldRange {
    name: "cacheGcTimeMinutes",
    min: 1,
    max: 120,
    default: 10,
};

/// User-level dashboard preferences. Fields are always within their ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "refreshInterval")]
    pub refresh_interval_seconds: u32,
    pub cache_stale_time_minutes: u32,
    pub cache_gc_time_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: REFRESH_INTERVAL.default,
            cache_stale_time_minutes: CACHE_STALE_TIME.default,
            cache_gc_time_minutes: CACHE_GC_TIME.default,
        }
    }
}

impl Settings {
    /// Build settings from an arbitrary JSON value, field by field.
    ///
    /// Returns the settings plus the names of fields that were missing or not
    /// numeric and therefore fell back to their defaults.
    pub fn from_json_lenient(value: &serde_json::Value) -> (Self, Vec<&'static str>) {
        let mut defaulted = Vec::new();
        let mut field = |range: FieldRange| match value.get(range.name).and_then(|v| v.as_f64()) {
            Some(n) => range.clamp(n),
            None => {
                defaulted.push(range.name);
                range.default
            }
        };
        let settings = Self {
            refresh_interval_seconds: field(REFRESH_INTERVAL),
            cache_stale_time_minutes: field(CACHE_STALE_TIME),
            cache_gc_time_minutes: field(CACHE_GC_TIME),
        };
        (settings, defaulted)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds as u64)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache_stale_time_minutes as u64 * 60)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.cache_gc_time_minutes as u64 * 60)
    }
}
