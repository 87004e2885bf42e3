use std::sync::Arc;

use tracing::info;

use crate::admin::{AdminBackend, AdminConfigSync, HttpAdminBackend};
use crate::config::DeckConfig;
use crate::db;
use crate::error::{DeckError, DeckResult};
use crate::http::ApiClient;
use crate::monitoring::MonitoringReader;
use crate::provider::{HttpQuoteProvider, QuoteProvider};
use crate::quote_cache::{FetchOutcome, QuoteCache};
use crate::scheduler::RefreshScheduler;
use crate::search::SymbolSearch;
use crate::settings::SettingsStore;
use crate::storage::{KeyValueStore, SqliteStore};
use crate::watchlist::WatchlistController;

/// Every dashboard component, wired once at startup and handed to the UI.
pub struct AppContext {
    pub settings: SettingsStore,
    pub watchlist: WatchlistController,
    pub quotes: Arc<QuoteCache>,
    pub search: SymbolSearch,
    pub admin: AdminConfigSync,
    pub monitoring: MonitoringReader,
}

impl AppContext {
    /// Open durable storage under the configured data directory and connect
    /// the HTTP backends.
    pub fn bootstrap(config: &DeckConfig) -> DeckResult<Self> {
        if config.data_dir.exists() && !config.data_dir.is_dir() {
            return Err(DeckError::Precondition(format!(
                "data directory {} is not a directory",
                config.data_dir.display()
            )));
        }
        let db_path = config.db_path();
        let pool = db::create_pool(&db_path)?;
        db::init_db(&pool)?;
        info!(path = %db_path.display(), "Opened dashboard storage");

        let quotes_api = ApiClient::new(
            "quotes",
            config.quotes_url.clone(),
            config.api_token.clone(),
            config.http_timeout,
        )?;
        let admin_api = ApiClient::new(
            "admin",
            config.admin_url.clone(),
            config.api_token.clone(),
            config.http_timeout,
        )?;
        info!(
            quotes = quotes_api.is_configured(),
            admin = admin_api.is_configured(),
            authenticated = config.api_token.is_some(),
            "Backends configured"
        );

        Ok(Self::from_parts(
            Arc::new(SqliteStore::new(pool)),
            Arc::new(HttpQuoteProvider::new(quotes_api)),
            Arc::new(HttpAdminBackend::new(admin_api)),
        ))
    }

    pub fn from_parts(
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn QuoteProvider>,
        admin: Arc<dyn AdminBackend>,
    ) -> Self {
        let settings = SettingsStore::load(Arc::clone(&store));
        let watchlist = WatchlistController::load(store);
        let quotes = Arc::new(QuoteCache::new(Arc::clone(&provider), settings.subscribe()));
        Self {
            settings,
            watchlist,
            quotes,
            search: SymbolSearch::new(provider),
            admin: AdminConfigSync::new(Arc::clone(&admin)),
            monitoring: MonitoringReader::new(admin),
        }
    }

    /// Start the background quote refresh. Keep the handle alive for as long
    /// as quotes should refresh. Must be called from within a tokio runtime.
    pub fn start_refresh(&self) -> RefreshScheduler {
        RefreshScheduler::start(
            Arc::clone(&self.quotes),
            self.watchlist.subscribe(),
            self.settings.subscribe(),
        )
    }

    /// Manual refresh of the tracked set. Leaves the refresh timer alone.
    pub async fn refresh_quotes(&self) -> FetchOutcome {
        self.quotes.set_symbols(self.watchlist.symbols());
        self.quotes.refresh().await
    }
}
