use serde::Deserialize;

use crate::context::AppContext;
use crate::types::settings::Settings;

/// Fields the settings panel may change. Values are clamped, never rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub refresh_interval: Option<f64>,
    pub cache_stale_time_minutes: Option<f64>,
    pub cache_gc_time_minutes: Option<f64>,
}

pub fn settings_get(ctx: &AppContext) -> Settings {
    ctx.settings.current()
}

pub fn settings_update(ctx: &AppContext, patch_json: &str) -> Result<Settings, String> {
    let patch: SettingsPatch = serde_json::from_str(patch_json).map_err(|e| e.to_string())?;
    if let Some(n) = patch.refresh_interval {
        ctx.settings.update_refresh_interval(n);
    }
    if let Some(n) = patch.cache_stale_time_minutes {
        ctx.settings.update_cache_stale_time(n);
    }
    if let Some(n) = patch.cache_gc_time_minutes {
        ctx.settings.update_cache_gc_time(n);
    }
    Ok(ctx.settings.current())
}

pub fn settings_reset(ctx: &AppContext) -> Settings {
    ctx.settings.reset()
}
