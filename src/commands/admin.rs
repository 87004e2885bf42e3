use crate::context::AppContext;
use crate::types::admin::{AdminConfig, AdminConfigPatch};

pub async fn admin_config_load(ctx: &AppContext) -> AdminConfig {
    ctx.admin.load().await
}

pub fn admin_config_draft(ctx: &AppContext) -> AdminConfig {
    ctx.admin.draft()
}

/// Send a partial update given as JSON, e.g. `{"pollingIntervalSec": 45}`.
pub async fn admin_config_update(ctx: &AppContext, patch_json: &str) -> Result<AdminConfig, String> {
    let patch: AdminConfigPatch = serde_json::from_str(patch_json).map_err(|e| e.to_string())?;
    ctx.admin.save(patch).await.map_err(|e| e.to_string())
}

pub async fn admin_config_save_draft(
    ctx: &AppContext,
    draft: &AdminConfig,
) -> Result<AdminConfig, String> {
    ctx.admin.save_draft(draft).await.map_err(|e| e.to_string())
}

pub async fn admin_provider_failure(ctx: &AppContext, enabled: bool) -> Result<AdminConfig, String> {
    let result = if enabled {
        ctx.admin.simulate_provider_failure().await
    } else {
        ctx.admin.disable_provider_failure().await
    };
    result.map_err(|e| e.to_string())
}

pub async fn admin_openapi(ctx: &AppContext) -> Result<serde_json::Value, String> {
    ctx.admin.openapi().await.map_err(|e| e.to_string())
}
