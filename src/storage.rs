use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::DbPool;
use crate::error::{DeckError, DeckResult};

pub const WATCHLIST_KEY: &str = "watchlist.symbols";
pub const SETTINGS_KEY: &str = "dashboard.settings";

/// Durable string-valued storage, one JSON record per key.
///
/// Single writer per key; the last write wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DeckResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> DeckResult<()>;
    fn remove(&self, key: &str) -> DeckResult<()>;
}

/// Store backed by the `kv` table.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> DeckResult<Option<String>> {
        let conn = self.pool.get()?;
        match conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0)) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> DeckResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> DeckResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Non-durable store, used when no data directory is available and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DeckResult<Option<String>> {
        let map = self.entries.lock().map_err(|_| DeckError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DeckResult<()> {
        let mut map = self.entries.lock().map_err(|_| DeckError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DeckResult<()> {
        let mut map = self.entries.lock().map_err(|_| DeckError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}
