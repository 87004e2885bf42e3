use crate::keychain;

/// Store the API token. Takes effect on the next start.
pub fn credentials_set(token: &str) -> Result<(), String> {
    keychain::token_set(token).map_err(|e| e.to_string())
}

pub fn credentials_exists() -> Result<bool, String> {
    keychain::token_exists().map_err(|e| e.to_string())
}

pub fn credentials_delete() -> Result<(), String> {
    keychain::token_delete().map_err(|e| e.to_string())
}
