use crate::context::AppContext;
use crate::types::monitoring::MonitoringSnapshot;

pub async fn monitoring_load(ctx: &AppContext) -> MonitoringSnapshot {
    ctx.monitoring.load().await
}
