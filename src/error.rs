use thiserror::Error;

/// Errors raised by the watchlist, cache and admin layers.
///
/// Read paths (settings, admin config, monitoring) swallow most of these and
/// substitute defaults; write paths hand them back to the caller.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// No base URL is configured for the named endpoint group.
    #[error("Endpoint not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl DeckError {
    /// True when the failure came from talking to a remote backend.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DeckError::Network(_) | DeckError::Http { .. } | DeckError::NotConfigured(_)
        )
    }
}

pub type DeckResult<T> = Result<T, DeckError>;
