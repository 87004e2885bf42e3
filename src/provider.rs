use async_trait::async_trait;

use crate::error::DeckResult;
use crate::http::ApiClient;
use crate::types::quote::{Quote, SearchResult};

/// Remote source of quotes and symbol lookups.
///
/// Symbol matching is case-insensitive. Partial or empty results are valid
/// answers, not errors.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_stocks(&self, symbols: &[String]) -> DeckResult<Vec<Quote>>;

    async fn search_symbols(&self, query: &str) -> DeckResult<Vec<SearchResult>>;
}

/// Provider backed by the dashboard's quote API
/// (`GET /stocks?symbols=A,B`, `GET /search?q=...`).
pub struct HttpQuoteProvider {
    api: ApiClient,
}

impl HttpQuoteProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn fetch_stocks(&self, symbols: &[String]) -> DeckResult<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let joined = symbols.join(",");
        self.api.get_json("/stocks", &[("symbols", joined.as_str())]).await
    }

    async fn search_symbols(&self, query: &str) -> DeckResult<Vec<SearchResult>> {
        self.api.get_json("/search", &[("q", query)]).await
    }
}
