//! In-process fakes for the remote collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::admin::AdminBackend;
use crate::error::{DeckError, DeckResult};
use crate::provider::QuoteProvider;
use crate::types::admin::{AdminConfig, AdminConfigPatch};
use crate::types::monitoring::MonitoringSnapshot;
use crate::types::quote::{Quote, SearchResult};

const UNIVERSE: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("AMD", "Advanced Micro Devices"),
    ("AMZN", "Amazon.com Inc."),
    ("GOOGL", "Alphabet Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("MSTR", "MicroStrategy"),
    ("NVDA", "NVIDIA Corporation"),
];

fn unavailable() -> DeckError {
    DeckError::Http {
        status: 503,
        url: "fake://provider".to_string(),
    }
}

/// Quote provider that synthesizes a quote per requested symbol unless a
/// fixed response is set. Prices rise by one per call so responses from
/// different calls are distinguishable.
#[derive(Default)]
pub struct FakeProvider {
    response: Mutex<Option<Vec<Quote>>>,
    failing: AtomicBool,
    delays: Mutex<HashMap<Vec<String>, Duration>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    fetches: Mutex<Vec<Vec<String>>>,
    searches: Mutex<Vec<String>>,
    calls: AtomicU64,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, quotes: Vec<Quote>) {
        *self.response.lock().unwrap() = Some(quotes);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, symbols: &[&str], delay: Duration) {
        let key = symbols.iter().map(|s| s.to_string()).collect();
        self.delays.lock().unwrap().insert(key, delay);
    }

    pub fn set_search_delay(&self, query: &str, delay: Duration) {
        self.search_delays.lock().unwrap().insert(query.to_string(), delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetches(&self) -> Vec<Vec<String>> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for FakeProvider {
    async fn fetch_stocks(&self, symbols: &[String]) -> DeckResult<Vec<Quote>> {
        self.fetches.lock().unwrap().push(symbols.to_vec());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(symbols).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if let Some(fixed) = self.response.lock().unwrap().clone() {
            return Ok(fixed);
        }
        Ok(symbols
            .iter()
            .map(|s| Quote::new(s.clone(), 100.0 + call as f64))
            .collect())
    }

    async fn search_symbols(&self, query: &str) -> DeckResult<Vec<SearchResult>> {
        self.searches.lock().unwrap().push(query.to_string());
        let delay = self.search_delays.lock().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let needle = query.trim().to_uppercase();
        Ok(UNIVERSE
            .iter()
            .filter(|(symbol, name)| symbol.starts_with(&needle) || name.to_uppercase().contains(&needle))
            .map(|(symbol, name)| SearchResult::new(*symbol, *name))
            .collect())
    }
}

/// Admin backend holding its own config. Updates merge server-side and echo
/// the full object; `echo_override` lets a test make the server disagree.
pub struct FakeAdmin {
    config: Mutex<AdminConfig>,
    failing: AtomicBool,
    echo_override: Mutex<Option<AdminConfig>>,
    updates: Mutex<Vec<serde_json::Value>>,
}

impl FakeAdmin {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config: Mutex::new(config),
            failing: AtomicBool::new(false),
            echo_override: Mutex::new(None),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_echo(&self, echo: AdminConfig) {
        *self.echo_override.lock().unwrap() = Some(echo);
    }

    pub fn update_bodies(&self) -> Vec<serde_json::Value> {
        self.updates.lock().unwrap().clone()
    }

    fn check(&self) -> DeckResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }

    fn echo(&self) -> AdminConfig {
        self.echo_override
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.config.lock().unwrap().clone())
    }
}

#[async_trait]
impl AdminBackend for FakeAdmin {
    async fn get_config(&self) -> DeckResult<AdminConfig> {
        self.check()?;
        Ok(self.echo())
    }

    async fn update_config(&self, patch: &AdminConfigPatch) -> DeckResult<AdminConfig> {
        self.check()?;
        self.updates.lock().unwrap().push(serde_json::to_value(patch)?);
        {
            let mut config = self.config.lock().unwrap();
            if let Some(v) = patch.polling_interval_sec {
                config.polling_interval_sec = v;
            }
            if let Some(v) = patch.kv_write_interval_sec {
                config.kv_write_interval_sec = v;
            }
            if let Some(v) = &patch.primary_provider {
                config.primary_provider = v.clone();
            }
            if let Some(v) = &patch.backup_provider {
                config.backup_provider = v.clone();
            }
            if let Some(t) = &patch.alert_throttle {
                if let Some(v) = t.max_alerts {
                    config.alert_throttle.max_alerts = v;
                }
                if let Some(v) = t.window_seconds {
                    config.alert_throttle.window_seconds = v;
                }
            }
            if let Some(f) = &patch.feature_flags {
                if let Some(v) = f.alerting {
                    config.feature_flags.alerting = v;
                }
                if let Some(v) = f.sandbox_mode {
                    config.feature_flags.sandbox_mode = v;
                }
                if let Some(v) = f.simulate_provider_failure {
                    config.feature_flags.simulate_provider_failure = v;
                }
            }
        }
        Ok(self.echo())
    }

    async fn set_provider_failure(&self, enabled: bool) -> DeckResult<AdminConfig> {
        self.check()?;
        self.config.lock().unwrap().feature_flags.simulate_provider_failure = enabled;
        Ok(self.echo())
    }

    async fn metrics(&self) -> DeckResult<MonitoringSnapshot> {
        self.check()?;
        Ok(MonitoringSnapshot {
            latency_ms: vec![80.0, 90.0],
            throughput_per_min: vec![60.0, 61.0],
            error_rate: vec![0.0, 0.0],
            db_lag_ms: 4.0,
        })
    }

    async fn openapi(&self) -> DeckResult<serde_json::Value> {
        self.check()?;
        Ok(serde_json::json!({"openapi": "3.0.0", "paths": {"/config/get": {}}}))
    }
}
