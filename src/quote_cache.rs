use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::provider::QuoteProvider;
use crate::types::quote::Quote;
use crate::types::settings::Settings;

/// Cache key: the full tracked set, in display order.
pub type SetKey = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteStatus {
    /// Nothing is tracked, so nothing is fetched.
    Idle,
    /// First fetch for this set has not completed.
    Loading,
    Ready,
    /// The provider answered successfully with nothing to show.
    NoData,
    /// The last fetch failed. Previously fetched quotes remain in the view.
    Error { message: String },
}

/// What the dashboard renders for the current tracked set.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteView {
    pub symbols: Vec<String>,
    /// Ordered like `symbols`; untracked symbols are dropped.
    pub quotes: Vec<Quote>,
    pub status: QuoteStatus,
    pub fetching: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The tracked set was empty.
    Skipped,
    Updated { count: usize },
    NoData,
    /// A newer request for the same set already landed, or the set is no
    /// longer the one on screen. The response was kept under its own key only.
    Superseded,
    Failed { message: String },
}

/// Put quotes in tracked-set order, matching symbols case-insensitively.
pub fn order_by_tracked(tracked: &[String], quotes: &[Quote]) -> Vec<Quote> {
    tracked
        .iter()
        .filter_map(|symbol| quotes.iter().find(|q| q.matches_symbol(symbol)).cloned())
        .collect()
}

struct CacheEntry {
    quotes: Vec<Quote>,
    fetched_at: Option<Instant>,
    error: Option<String>,
    last_used: Instant,
    latest_issued: u64,
    latest_applied: u64,
    in_flight: usize,
}

impl CacheEntry {
    fn new(now: Instant) -> Self {
        Self {
            quotes: Vec::new(),
            fetched_at: None,
            error: None,
            last_used: now,
            latest_issued: 0,
            latest_applied: 0,
            in_flight: 0,
        }
    }

    fn is_fresh(&self, settings: &Settings, now: Instant) -> bool {
        self.fetched_at
            .is_some_and(|at| now.duration_since(at) < settings.stale_time())
    }
}

struct CacheState {
    current: SetKey,
    entries: HashMap<SetKey, CacheEntry>,
    /// Display of the previous set, shown while a new set loads.
    placeholder: Vec<Quote>,
    next_request: u64,
}

/// Quote cache keyed by tracked-set identity.
///
/// Responses are stored under the key that was current when the request was
/// issued, so a slow fetch for a superseded set never overwrites the quotes
/// of the set on screen.
pub struct QuoteCache {
    provider: Arc<dyn QuoteProvider>,
    settings: watch::Receiver<Settings>,
    state: Mutex<CacheState>,
    version: watch::Sender<u64>,
}

impl QuoteCache {
    pub fn new(provider: Arc<dyn QuoteProvider>, settings: watch::Receiver<Settings>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            provider,
            settings,
            state: Mutex::new(CacheState {
                current: Vec::new(),
                entries: HashMap::new(),
                placeholder: Vec::new(),
                next_request: 1,
            }),
            version,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn settings(&self) -> Settings {
        *self.settings.borrow()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Receiver bumped whenever the view may have changed.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn current_symbols(&self) -> SetKey {
        self.lock().current.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.lock().current.is_empty()
    }

    /// Re-key the cache to a new tracked set.
    ///
    /// Returns `true` when the caller should fetch now: the set is non-empty,
    /// nothing fresh is cached for it and no request for it is in flight.
    pub fn set_symbols(&self, symbols: SetKey) -> bool {
        let settings = self.settings();
        let now = Instant::now();
        let needs_fetch = {
            let mut state = self.lock();
            if state.current == symbols {
                return false;
            }
            let previous = std::mem::replace(&mut state.current, symbols.clone());
            let shown = display_quotes(&state, &previous);
            state.placeholder = shown;
            if let Some(old) = state.entries.get_mut(&previous) {
                old.last_used = now;
            }

            if symbols.is_empty() {
                false
            } else {
                let entry = state
                    .entries
                    .entry(symbols.clone())
                    .or_insert_with(|| CacheEntry::new(now));
                entry.last_used = now;
                !entry.is_fresh(&settings, now) && entry.in_flight == 0
            }
        };
        debug!(symbols = ?symbols, needs_fetch, "Quote cache re-keyed");
        self.collect_garbage();
        self.bump();
        needs_fetch
    }

    /// Fetch quotes for the current set and store them under that set's key.
    ///
    /// Safe to call concurrently with scheduled refreshes; it never touches
    /// the refresh timer.
    pub async fn refresh(&self) -> FetchOutcome {
        let (key, request_id) = {
            let mut state = self.lock();
            if state.current.is_empty() {
                return FetchOutcome::Skipped;
            }
            let key = state.current.clone();
            let request_id = state.next_request;
            state.next_request += 1;
            let now = Instant::now();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.latest_issued = request_id;
            entry.in_flight += 1;
            (key, request_id)
        };
        let guard = InFlight {
            cache: self,
            key: Some(key.clone()),
        };
        self.bump();

        let result = self.provider.fetch_stocks(&key).await;

        let outcome = {
            let mut state = self.lock();
            guard.finish(&mut state);
            let now = Instant::now();
            let is_current = state.current == key;
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));

            if request_id < entry.latest_applied {
                debug!(request_id, symbols = ?key, "Discarding response overtaken by a newer request");
                FetchOutcome::Superseded
            } else {
                entry.latest_applied = request_id;
                match result {
                    Ok(quotes) => {
                        let count = order_by_tracked(&key, &quotes).len();
                        entry.quotes = quotes;
                        entry.fetched_at = Some(now);
                        entry.error = None;
                        if !is_current {
                            FetchOutcome::Superseded
                        } else if count == 0 {
                            FetchOutcome::NoData
                        } else {
                            FetchOutcome::Updated { count }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, symbols = ?key, "Quote fetch failed, keeping last quotes");
                        let message = e.to_string();
                        entry.error = Some(message.clone());
                        if is_current {
                            FetchOutcome::Failed { message }
                        } else {
                            FetchOutcome::Superseded
                        }
                    }
                }
            }
        };
        self.bump();
        outcome
    }

    /// True when the current set has no fresh entry and nothing in flight.
    pub fn needs_fetch(&self) -> bool {
        let settings = self.settings();
        let state = self.lock();
        if state.current.is_empty() {
            return false;
        }
        state
            .entries
            .get(&state.current)
            .map_or(true, |e| !e.is_fresh(&settings, Instant::now()) && e.in_flight == 0)
    }

    /// Snapshot of what the dashboard should show right now.
    pub fn view(&self) -> QuoteView {
        let state = self.lock();
        let symbols = state.current.clone();
        if symbols.is_empty() {
            return QuoteView {
                symbols,
                quotes: Vec::new(),
                status: QuoteStatus::Idle,
                fetching: false,
            };
        }

        let entry = state.entries.get(&symbols);
        let fetching = entry.is_some_and(|e| e.in_flight > 0);
        let quotes = display_quotes(&state, &symbols);
        let status = match entry {
            Some(CacheEntry { error: Some(message), .. }) => QuoteStatus::Error {
                message: message.clone(),
            },
            Some(e) if e.fetched_at.is_some() => {
                if quotes.is_empty() {
                    QuoteStatus::NoData
                } else {
                    QuoteStatus::Ready
                }
            }
            _ => QuoteStatus::Loading,
        };

        QuoteView {
            symbols,
            quotes,
            status,
            fetching,
        }
    }

    /// Drop entries unused for longer than the configured GC time.
    /// The current set and sets with requests in flight are kept.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.settings().gc_time();
        let now = Instant::now();
        let mut state = self.lock();
        let current = state.current.clone();
        let before = state.entries.len();
        state.entries.retain(|key, entry| {
            *key == current || entry.in_flight > 0 || now.duration_since(entry.last_used) < gc_time
        });
        let removed = before - state.entries.len();
        if removed > 0 {
            debug!(removed, "Collected unused quote cache entries");
        }
        removed
    }

    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }
}

/// Holds one slot of `CacheEntry::in_flight` for a running fetch. Released
/// under the lock when the response lands, or on drop if the fetch is cancelled.
struct InFlight<'a> {
    cache: &'a QuoteCache,
    key: Option<SetKey>,
}

impl InFlight<'_> {
    fn finish(mut self, state: &mut CacheState) {
        if let Some(key) = self.key.take() {
            release(state, &key);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            release(&mut self.cache.lock(), &key);
            debug!(symbols = ?key, "Quote fetch cancelled");
            self.cache.bump();
        }
    }
}

fn release(state: &mut CacheState, key: &[String]) {
    if let Some(entry) = state.entries.get_mut(key) {
        entry.in_flight = entry.in_flight.saturating_sub(1);
    }
}

/// Quotes to display for `key`: its last successful fetch, or the previous
/// set's display filtered to `key` while nothing has been fetched yet.
fn display_quotes(state: &CacheState, key: &[String]) -> Vec<Quote> {
    match state.entries.get(key) {
        Some(entry) if entry.fetched_at.is_some() => order_by_tracked(key, &entry.quotes),
        _ => order_by_tracked(key, &state.placeholder),
    }
}
