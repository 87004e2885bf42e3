use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{DeckError, DeckResult};
use crate::storage::{KeyValueStore, WATCHLIST_KEY};

/// Trim and uppercase user input. `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    (!symbol.is_empty()).then_some(symbol)
}

/// Read the persisted tracked set. Absent or malformed storage yields an empty set.
pub fn load_symbols(store: &dyn KeyValueStore) -> Vec<String> {
    let raw = match store.get(WATCHLIST_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, key = WATCHLIST_KEY, "Failed to read watchlist, starting empty");
            return Vec::new();
        }
    };

    let items = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(_) => {
            warn!(key = WATCHLIST_KEY, "Stored watchlist is not an array, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, key = WATCHLIST_KEY, "Stored watchlist is corrupt, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.as_str())
        .filter_map(normalize_symbol)
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}

/// Owns the ordered tracked-symbol set.
///
/// Mutations persist first and only then publish, so a failed write leaves
/// both storage and subscribers on the previous set.
pub struct WatchlistController {
    store: Arc<dyn KeyValueStore>,
    symbols: watch::Sender<Vec<String>>,
    write_lock: Mutex<()>,
}

impl WatchlistController {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let symbols = load_symbols(store.as_ref());
        info!(count = symbols.len(), "Watchlist loaded");
        let (tx, _) = watch::channel(symbols);
        Self {
            store,
            symbols: tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Tracked symbols in insertion order.
    pub fn symbols(&self) -> Vec<String> {
        self.symbols.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.borrow().is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.borrow().iter().any(|s| s == symbol)
    }

    /// Receiver notified after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.symbols.subscribe()
    }

    /// Append a symbol. Returns `false` when the input was blank or already tracked.
    pub fn add_symbol(&self, raw: &str) -> DeckResult<bool> {
        let Some(symbol) = normalize_symbol(raw) else {
            return Ok(false);
        };
        let _guard = self.write_lock.lock().map_err(|_| DeckError::Poisoned)?;
        if self.contains(&symbol) {
            debug!(symbol = %symbol, "Symbol already tracked");
            return Ok(false);
        }
        let mut next = self.symbols();
        next.push(symbol.clone());
        self.commit(next)?;
        info!(symbol = %symbol, "Symbol added to watchlist");
        Ok(true)
    }

    /// Remove by exact match. Returns `false` when the symbol was not tracked.
    pub fn remove_symbol(&self, symbol: &str) -> DeckResult<bool> {
        let _guard = self.write_lock.lock().map_err(|_| DeckError::Poisoned)?;
        if !self.contains(symbol) {
            return Ok(false);
        }
        let next: Vec<String> = self
            .symbols()
            .into_iter()
            .filter(|s| s != symbol)
            .collect();
        self.commit(next)?;
        info!(symbol, "Symbol removed from watchlist");
        Ok(true)
    }

    fn commit(&self, next: Vec<String>) -> DeckResult<()> {
        let json = serde_json::to_string(&next)?;
        self.store.set(WATCHLIST_KEY, &json).map_err(|e| {
            warn!(error = %e, key = WATCHLIST_KEY, "Failed to persist watchlist");
            e
        })?;
        self.symbols.send_replace(next);
        Ok(())
    }
}
