use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThrottle {
    pub max_alerts: u32,
    pub window_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub alerting: bool,
    pub sandbox_mode: bool,
    pub simulate_provider_failure: bool,
}

/// Backend operating parameters. The remote copy is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    pub polling_interval_sec: u32,
    pub kv_write_interval_sec: u32,
    pub primary_provider: String,
    pub backup_provider: String,
    pub alert_throttle: AlertThrottle,
    pub feature_flags: FeatureFlags,
}

impl Default for AdminConfig {
    /// Built-in fallback shown when the admin backend cannot be reached.
    fn default() -> Self {
        Self {
            polling_interval_sec: 30,
            kv_write_interval_sec: 60,
            primary_provider: "alpaca".to_string(),
            backup_provider: "finnhub".to_string(),
            alert_throttle: AlertThrottle {
                max_alerts: 5,
                window_seconds: 300,
            },
            feature_flags: FeatureFlags {
                alerting: true,
                sandbox_mode: false,
                simulate_provider_failure: false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThrottlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_alerts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulate_provider_failure: Option<bool>,
}

/// Partial update body for `POST /config/update`. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polling_interval_sec: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kv_write_interval_sec: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_throttle: Option<AlertThrottlePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_flags: Option<FeatureFlagsPatch>,
}

fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
    (old != new).then(|| new.clone())
}

impl AdminConfigPatch {
    /// Fields of `edited` that differ from `base`.
    pub fn diff(base: &AdminConfig, edited: &AdminConfig) -> Self {
        let throttle = AlertThrottlePatch {
            max_alerts: changed(&base.alert_throttle.max_alerts, &edited.alert_throttle.max_alerts),
            window_seconds: changed(
                &base.alert_throttle.window_seconds,
                &edited.alert_throttle.window_seconds,
            ),
        };
        let flags = FeatureFlagsPatch {
            alerting: changed(&base.feature_flags.alerting, &edited.feature_flags.alerting),
            sandbox_mode: changed(
                &base.feature_flags.sandbox_mode,
                &edited.feature_flags.sandbox_mode,
            ),
            simulate_provider_failure: changed(
                &base.feature_flags.simulate_provider_failure,
                &edited.feature_flags.simulate_provider_failure,
            ),
        };
        Self {
            polling_interval_sec: changed(&base.polling_interval_sec, &edited.polling_interval_sec),
            kv_write_interval_sec: changed(
                &base.kv_write_interval_sec,
                &edited.kv_write_interval_sec,
            ),
            primary_provider: changed(&base.primary_provider, &edited.primary_provider),
            backup_provider: changed(&base.backup_provider, &edited.backup_provider),
            alert_throttle: (throttle != AlertThrottlePatch::default()).then_some(throttle),
            feature_flags: (flags != FeatureFlagsPatch::default()).then_some(flags),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
