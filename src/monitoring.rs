use std::sync::Arc;

use tracing::warn;

use crate::admin::AdminBackend;
use crate::types::monitoring::MonitoringSnapshot;

/// Single-shot reader for `GET /monitor/metrics`. No background refresh.
pub struct MonitoringReader {
    backend: Arc<dyn AdminBackend>,
}

impl MonitoringReader {
    pub fn new(backend: Arc<dyn AdminBackend>) -> Self {
        Self { backend }
    }

    /// Fetch once; on failure return the built-in sample.
    pub async fn load(&self) -> MonitoringSnapshot {
        match self.backend.metrics().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Monitoring metrics unavailable, showing sample data");
                MonitoringSnapshot::sample()
            }
        }
    }
}
