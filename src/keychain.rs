use tracing::debug;

use crate::error::{DeckError, DeckResult};

const SERVICE: &str = "dev.tickerdeck";
const TOKEN_ACCOUNT: &str = "api_token";

fn entry() -> DeckResult<keyring::Entry> {
    keyring::Entry::new(SERVICE, TOKEN_ACCOUNT)
        .map_err(|e| DeckError::Keychain(format!("Failed to create keychain entry: {}", e)))
}

/// The credential is opaque, but it travels in an `Authorization` header.
fn validate_token(token: &str) -> DeckResult<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DeckError::Precondition("API token must not be empty".into()));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(DeckError::Precondition(
            "API token must not contain whitespace".into(),
        ));
    }
    Ok(token)
}

/// Store the API token in the OS keychain.
pub fn token_set(token: &str) -> DeckResult<()> {
    let token = validate_token(token)?;
    entry()?
        .set_password(token)
        .map_err(|e| DeckError::Keychain(format!("Failed to store in keychain: {}", e)))?;
    debug!("API token stored in keychain");
    Ok(())
}

/// Retrieve the API token. Returns None if not set.
pub fn token_get() -> DeckResult<Option<String>> {
    match entry()?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(DeckError::Keychain(format!(
            "Failed to read from keychain: {}",
            e
        ))),
    }
}

pub fn token_delete() -> DeckResult<()> {
    match entry()?.delete_credential() {
        Ok(()) => {
            debug!("API token deleted from keychain");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(DeckError::Keychain(format!(
            "Failed to delete from keychain: {}",
            e
        ))),
    }
}

pub fn token_exists() -> DeckResult<bool> {
    Ok(token_get()?.is_some())
}
