use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::DeckResult;
use crate::http::ApiClient;
use crate::types::admin::{AdminConfig, AdminConfigPatch};
use crate::types::monitoring::MonitoringSnapshot;

pub mod endpoints {
    pub const CONFIG_GET: &str = "/config/get";
    pub const CONFIG_UPDATE: &str = "/config/update";
    pub const MONITOR_METRICS: &str = "/monitor/metrics";
    pub const OPENAPI: &str = "/openapi.json";
    pub const SIMULATE_PROVIDER_FAILURE: &str = "/v1/api/simulate-provider-failure";
    pub const DISABLE_PROVIDER_FAILURE: &str = "/v1/api/disable-provider-failure";
}

/// Remote admin API.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn get_config(&self) -> DeckResult<AdminConfig>;

    /// Send a partial update; the backend answers with the full config.
    async fn update_config(&self, patch: &AdminConfigPatch) -> DeckResult<AdminConfig>;

    async fn set_provider_failure(&self, enabled: bool) -> DeckResult<AdminConfig>;

    async fn metrics(&self) -> DeckResult<MonitoringSnapshot>;

    async fn openapi(&self) -> DeckResult<serde_json::Value>;
}

/// Config responses arrive either bare or wrapped as `{"config": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigEnvelope {
    Bare(AdminConfig),
    Wrapped { config: AdminConfig },
}

impl From<ConfigEnvelope> for AdminConfig {
    fn from(envelope: ConfigEnvelope) -> Self {
        match envelope {
            ConfigEnvelope::Bare(config) | ConfigEnvelope::Wrapped { config } => config,
        }
    }
}

pub struct HttpAdminBackend {
    api: ApiClient,
}

impl HttpAdminBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AdminBackend for HttpAdminBackend {
    async fn get_config(&self) -> DeckResult<AdminConfig> {
        let envelope: ConfigEnvelope = self.api.get_json(endpoints::CONFIG_GET, &[]).await?;
        Ok(envelope.into())
    }

    async fn update_config(&self, patch: &AdminConfigPatch) -> DeckResult<AdminConfig> {
        let envelope: ConfigEnvelope = self.api.post_json(endpoints::CONFIG_UPDATE, patch).await?;
        Ok(envelope.into())
    }

    async fn set_provider_failure(&self, enabled: bool) -> DeckResult<AdminConfig> {
        let path = if enabled {
            endpoints::SIMULATE_PROVIDER_FAILURE
        } else {
            endpoints::DISABLE_PROVIDER_FAILURE
        };
        let envelope: ConfigEnvelope = self.api.post_empty(path).await?;
        Ok(envelope.into())
    }

    async fn metrics(&self) -> DeckResult<MonitoringSnapshot> {
        self.api.get_json(endpoints::MONITOR_METRICS, &[]).await
    }

    async fn openapi(&self) -> DeckResult<serde_json::Value> {
        self.api.get_json(endpoints::OPENAPI, &[]).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Remote,
    /// Built-in default substituted after a failed or unconfigured fetch.
    Fallback,
}

/// Client-side copy of the admin config.
///
/// The cache changes only on a confirmed server response (or the fallback
/// on load). Edits happen on drafts handed out by [`AdminConfigSync::draft`].
pub struct AdminConfigSync {
    backend: Arc<dyn AdminBackend>,
    cached: Mutex<Option<(AdminConfig, ConfigSource)>>,
}

impl AdminConfigSync {
    pub fn new(backend: Arc<dyn AdminBackend>) -> Self {
        Self {
            backend,
            cached: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(AdminConfig, ConfigSource)>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self, config: AdminConfig, source: ConfigSource) -> AdminConfig {
        *self.lock() = Some((config.clone(), source));
        config
    }

    /// Fetch the remote config, falling back to the built-in default on any failure.
    pub async fn load(&self) -> AdminConfig {
        match self.backend.get_config().await {
            Ok(config) => {
                info!("Admin config loaded");
                self.store(config, ConfigSource::Remote)
            }
            Err(e) => {
                warn!(error = %e, "Admin config unavailable, using built-in defaults");
                self.store(AdminConfig::default(), ConfigSource::Fallback)
            }
        }
    }

    pub fn cached(&self) -> Option<AdminConfig> {
        self.lock().as_ref().map(|(config, _)| config.clone())
    }

    pub fn source(&self) -> Option<ConfigSource> {
        self.lock().as_ref().map(|(_, source)| *source)
    }

    /// Editable copy of the cached config (the default before any load).
    pub fn draft(&self) -> AdminConfig {
        self.cached().unwrap_or_default()
    }

    /// Send `patch` and replace the cache with the server's answer.
    ///
    /// On failure the cache is left as it was and the error is returned.
    pub async fn save(&self, patch: AdminConfigPatch) -> DeckResult<AdminConfig> {
        if patch.is_empty() {
            debug!("Empty admin config patch, nothing to send");
            return Ok(self.draft());
        }
        let confirmed = self.backend.update_config(&patch).await.map_err(|e| {
            warn!(error = %e, "Admin config update failed");
            e
        })?;
        info!("Admin config updated");
        Ok(self.store(confirmed, ConfigSource::Remote))
    }

    /// Save only the fields of `draft` that differ from the cached config.
    pub async fn save_draft(&self, draft: &AdminConfig) -> DeckResult<AdminConfig> {
        let patch = AdminConfigPatch::diff(&self.draft(), draft);
        self.save(patch).await
    }

    pub async fn simulate_provider_failure(&self) -> DeckResult<AdminConfig> {
        self.set_provider_failure(true).await
    }

    pub async fn disable_provider_failure(&self) -> DeckResult<AdminConfig> {
        self.set_provider_failure(false).await
    }

    async fn set_provider_failure(&self, requested: bool) -> DeckResult<AdminConfig> {
        let confirmed = self.backend.set_provider_failure(requested).await.map_err(|e| {
            warn!(error = %e, requested, "Provider failure toggle failed");
            e
        })?;
        let echoed = confirmed.feature_flags.simulate_provider_failure;
        if echoed != requested {
            warn!(requested, echoed, "Backend kept a different provider failure flag");
        }
        Ok(self.store(confirmed, ConfigSource::Remote))
    }

    /// Raw OpenAPI document of the admin backend.
    pub async fn openapi(&self) -> DeckResult<serde_json::Value> {
        self.backend.openapi().await
    }
}
