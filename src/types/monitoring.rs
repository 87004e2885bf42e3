use serde::{Deserialize, Serialize};

/// Operational metrics from `GET /monitor/metrics`.
///
/// Series are ordered oldest bucket first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSnapshot {
    #[serde(default)]
    pub latency_ms: Vec<f64>,
    #[serde(default)]
    pub throughput_per_min: Vec<f64>,
    #[serde(default)]
    pub error_rate: Vec<f64>,
    #[serde(default)]
    pub db_lag_ms: f64,
}

impl MonitoringSnapshot {
    /// Built-in sample shown when the metrics endpoint is unavailable.
    pub fn sample() -> Self {
        Self {
            latency_ms: vec![120.0, 135.0, 110.0, 150.0, 128.0, 142.0],
            throughput_per_min: vec![42.0, 48.0, 51.0, 45.0, 53.0, 49.0],
            error_rate: vec![0.01, 0.0, 0.02, 0.01, 0.0, 0.01],
            db_lag_ms: 35.0,
        }
    }

    pub fn latest_latency_ms(&self) -> Option<f64> {
        self.latency_ms.last().copied()
    }

    pub fn latest_throughput_per_min(&self) -> Option<f64> {
        self.throughput_per_min.last().copied()
    }

    pub fn latest_error_rate(&self) -> Option<f64> {
        self.error_rate.last().copied()
    }
}
