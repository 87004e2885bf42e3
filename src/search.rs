use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::DeckResult;
use crate::provider::QuoteProvider;
use crate::types::quote::SearchResult;
use crate::watchlist::WatchlistController;

pub const MIN_QUERY_LEN: usize = 2;
pub const SEARCH_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// Query too short; suggestions were cleared without a request.
    Cleared,
    Suggestions(Vec<SearchResult>),
    /// A later keystroke took over; this result was not shown.
    Superseded,
}

/// State of a lookup other keystrokes for the same query can join.
#[derive(Debug, Clone)]
enum Lookup {
    Running,
    Done(Vec<SearchResult>),
    Failed,
}

enum Claim {
    Cached(Vec<SearchResult>),
    Join(watch::Receiver<Lookup>),
    Lead(watch::Sender<Lookup>),
}

#[derive(Default)]
struct SearchState {
    query: String,
    suggestions: Vec<SearchResult>,
    generation: u64,
    cache: HashMap<String, (Instant, Vec<SearchResult>)>,
    pending: HashMap<String, watch::Receiver<Lookup>>,
}

/// Removes a led lookup from `pending` if its task is dropped before it lands.
struct Leading<'a> {
    search: &'a SymbolSearch,
    query: Option<String>,
}

impl Drop for Leading<'_> {
    fn drop(&mut self) {
        if let Some(query) = self.query.take() {
            self.search.lock().pending.remove(&query);
        }
    }
}

/// Search-as-you-type assistant feeding the watchlist.
///
/// Each keystroke is a task tagged with a generation number. A task that
/// is no longer the latest skips its request if still debouncing, or drops
/// its result on arrival. Results are cached per literal query string, and
/// a keystroke repeating a query whose request is still out waits for it.
pub struct SymbolSearch {
    provider: Arc<dyn QuoteProvider>,
    debounce: Duration,
    stale_time: Duration,
    state: Mutex<SearchState>,
}

impl SymbolSearch {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self::with_debounce(provider, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(provider: Arc<dyn QuoteProvider>, debounce: Duration) -> Self {
        Self {
            provider,
            debounce,
            stale_time: SEARCH_STALE_TIME,
            state: Mutex::new(SearchState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn query(&self) -> String {
        self.lock().query.clone()
    }

    pub fn suggestions(&self) -> Vec<SearchResult> {
        self.lock().suggestions.clone()
    }

    fn fresh(&self, state: &SearchState, query: &str) -> Option<Vec<SearchResult>> {
        state
            .cache
            .get(query)
            .filter(|(at, _)| at.elapsed() < self.stale_time)
            .map(|(_, results)| results.clone())
    }

    /// Cached result or running lookup for `query`, if any.
    fn existing(&self, query: &str) -> Option<Claim> {
        let state = self.lock();
        if let Some(hit) = self.fresh(&state, query) {
            return Some(Claim::Cached(hit));
        }
        state.pending.get(query).cloned().map(Claim::Join)
    }

    /// Like [`Self::existing`], but registers a new lookup when there is none.
    fn claim(&self, query: &str) -> Claim {
        let mut state = self.lock();
        if let Some(hit) = self.fresh(&state, query) {
            return Claim::Cached(hit);
        }
        if let Some(rx) = state.pending.get(query) {
            return Claim::Join(rx.clone());
        }
        let (tx, rx) = watch::channel(Lookup::Running);
        state.pending.insert(query.to_string(), rx);
        Claim::Lead(tx)
    }

    /// Wait for another task's lookup. `None` if it failed or was dropped.
    async fn join(mut rx: watch::Receiver<Lookup>) -> Option<Vec<SearchResult>> {
        let landed = rx
            .wait_for(|lookup| !matches!(lookup, Lookup::Running))
            .await
            .ok()
            .map(|lookup| lookup.clone());
        match landed {
            Some(Lookup::Done(results)) => Some(results),
            _ => None,
        }
    }

    /// Show `results` if `generation` is still the latest keystroke.
    fn publish(&self, generation: u64, results: Vec<SearchResult>) -> SearchUpdate {
        let mut state = self.lock();
        if state.generation != generation {
            return SearchUpdate::Superseded;
        }
        state.suggestions = results.clone();
        SearchUpdate::Suggestions(results)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Handle a keystroke with the full query text.
    pub async fn input(&self, query: &str) -> DeckResult<SearchUpdate> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.query = query.to_string();
            state.generation
        };

        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            self.lock().suggestions.clear();
            return Ok(SearchUpdate::Cleared);
        }

        match self.existing(query) {
            Some(Claim::Cached(hit)) => {
                debug!(query, "Search cache hit");
                return Ok(self.publish(generation, hit));
            }
            Some(Claim::Join(rx)) => {
                if let Some(results) = Self::join(rx).await {
                    return Ok(self.publish(generation, results));
                }
            }
            _ => {}
        }

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }

        let tx = loop {
            if !self.is_current(generation) {
                return Ok(SearchUpdate::Superseded);
            }
            match self.claim(query) {
                Claim::Cached(hit) => return Ok(self.publish(generation, hit)),
                Claim::Join(rx) => {
                    debug!(query, "Joining running search");
                    if let Some(results) = Self::join(rx).await {
                        return Ok(self.publish(generation, results));
                    }
                }
                Claim::Lead(tx) => break tx,
            }
        };
        let mut leading = Leading {
            search: self,
            query: Some(query.to_string()),
        };

        let result = self.provider.search_symbols(trimmed).await;

        {
            let mut state = self.lock();
            leading.query = None;
            state.pending.remove(query);
            if let Ok(results) = &result {
                let stale_time = self.stale_time;
                state.cache.retain(|_, (at, _)| at.elapsed() < stale_time);
                state
                    .cache
                    .insert(query.to_string(), (Instant::now(), results.clone()));
            }
        }

        match result {
            Ok(results) => {
                tx.send_replace(Lookup::Done(results.clone()));
                debug!(query, count = results.len(), "Search results received");
                Ok(self.publish(generation, results))
            }
            Err(e) => {
                tx.send_replace(Lookup::Failed);
                warn!(error = %e, query, "Symbol search failed");
                let mut state = self.lock();
                if state.generation == generation {
                    state.suggestions.clear();
                }
                Err(e)
            }
        }
    }

    /// Add the chosen symbol to the watchlist, then reset the search box.
    ///
    /// Returns whether the watchlist changed. On a persistence failure the
    /// query and suggestions are kept so the user can retry.
    pub fn select(&self, symbol: &str, watchlist: &WatchlistController) -> DeckResult<bool> {
        let added = watchlist.add_symbol(&symbol.to_uppercase())?;
        self.clear();
        Ok(added)
    }

    /// Reset query and suggestions; in-flight lookups are discarded on arrival.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.query.clear();
        state.suggestions.clear();
    }
}
