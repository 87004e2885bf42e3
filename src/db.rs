use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

use crate::error::{DeckError, DeckResult};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Default data directory, `~/.tickerdeck`. `None` when no home directory can be resolved.
pub fn tickerdeck_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tickerdeck"))
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("state").join("tickerdeck.sqlite")
}

pub fn create_pool(db_path: &Path) -> DeckResult<DbPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DeckError::Precondition(format!(
                "cannot create data directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder().max_size(4).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    Ok(pool)
}

pub fn init_db(pool: &DbPool) -> DeckResult<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    Ok(())
}
