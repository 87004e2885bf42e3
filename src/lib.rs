pub mod admin;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod http;
pub mod keychain;
pub mod monitoring;
pub mod provider;
pub mod quote_cache;
pub mod scheduler;
pub mod search;
pub mod settings;
pub mod storage;
pub mod types;
pub mod watchlist;

#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DeckConfig;
use crate::context::AppContext;
use crate::error::DeckResult;

/// Initialize structured logging with tracing.
/// Respects RUST_LOG env var; defaults to `info` level for the tickerdeck crate.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tickerdeck=info"));

    // try_init: the host UI may have installed a subscriber already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Read configuration from the environment and build the application context.
pub fn start() -> DeckResult<AppContext> {
    init_tracing();
    let config = DeckConfig::from_env()?;
    info!(data_dir = %config.data_dir.display(), "Starting tickerdeck");
    AppContext::bootstrap(&config)
}
