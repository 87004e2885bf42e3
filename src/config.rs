use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::db;
use crate::error::{DeckError, DeckResult};
use crate::keychain;

pub const DATA_DIR_VAR: &str = "TICKERDECK_DATA_DIR";
pub const QUOTES_URL_VAR: &str = "TICKERDECK_QUOTES_URL";
pub const ADMIN_URL_VAR: &str = "TICKERDECK_ADMIN_URL";
pub const API_TOKEN_VAR: &str = "TICKERDECK_API_TOKEN";
pub const HTTP_TIMEOUT_VAR: &str = "TICKERDECK_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Process configuration. Endpoints left unset make the matching component
/// run on its built-in fallback data.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub data_dir: PathBuf,
    pub quotes_url: Option<String>,
    pub admin_url: Option<String>,
    pub api_token: Option<String>,
    pub http_timeout: Duration,
}

impl DeckConfig {
    /// Read the environment after loading `.env` from the working directory.
    /// The API token falls back to the OS keychain.
    pub fn from_env() -> DeckResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        let mut config = Self::from_lookup(|name| std::env::var(name).ok())?;
        if config.api_token.is_none() {
            config.api_token = keychain_token();
        }
        Ok(config)
    }

    /// Build from an arbitrary variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> DeckResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = match var(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => db::tickerdeck_data_dir().ok_or_else(|| {
                DeckError::Precondition(format!(
                    "no home directory; set {} to choose a data directory",
                    DATA_DIR_VAR
                ))
            })?,
        };

        let http_timeout = match var(HTTP_TIMEOUT_VAR) {
            None => DEFAULT_HTTP_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(value = %raw, "Invalid {}, using default", HTTP_TIMEOUT_VAR);
                    DEFAULT_HTTP_TIMEOUT_SECS
                }
            },
        };

        Ok(Self {
            data_dir,
            quotes_url: var(QUOTES_URL_VAR),
            admin_url: var(ADMIN_URL_VAR),
            api_token: var(API_TOKEN_VAR),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        db::db_path(&self.data_dir)
    }
}

fn keychain_token() -> Option<String> {
    match keychain::token_get() {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "Could not read API token from keychain");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = DeckConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/tmp/deck"),
            (QUOTES_URL_VAR, "https://quotes.example.com"),
            (ADMIN_URL_VAR, "https://admin.example.com"),
            (API_TOKEN_VAR, "tok"),
            (HTTP_TIMEOUT_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/deck"));
        assert_eq!(config.quotes_url.as_deref(), Some("https://quotes.example.com"));
        assert_eq!(config.admin_url.as_deref(), Some("https://admin.example.com"));
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(
            config.db_path(),
            PathBuf::from("/tmp/deck/state/tickerdeck.sqlite")
        );
    }

    #[test]
    fn blank_values_are_unset() {
        let config = DeckConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/tmp/deck"),
            (ADMIN_URL_VAR, "   "),
        ]))
        .unwrap();
        assert!(config.admin_url.is_none());
        assert!(config.quotes_url.is_none());
        assert!(config.api_token.is_none());
    }

    #[test]
    fn bad_timeout_uses_default() {
        for raw in ["abc", "0", "-5"] {
            let config =
                DeckConfig::from_lookup(lookup(&[(DATA_DIR_VAR, "/tmp/deck"), (HTTP_TIMEOUT_VAR, raw)]))
                    .unwrap();
            assert_eq!(config.http_timeout, Duration::from_secs(10));
        }
    }

    #[test]
    fn data_dir_defaults_to_home() {
        if let Some(expected) = db::tickerdeck_data_dir() {
            let config = DeckConfig::from_lookup(lookup(&[])).unwrap();
            assert_eq!(config.data_dir, expected);
        }
    }
}
