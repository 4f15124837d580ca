//! Secret storage in the system keyring.
//!
//! The Gmail OAuth token and the Gemini API key never live in the config
//! file. They are kept by the platform's credential store:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

use sentinel_gmail::Token;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "inbox-sentinel";

/// Keyring entry for the Gmail token (JSON).
const GMAIL_TOKEN: &str = "gmail_oauth_token";

/// Keyring entry for the Gemini API key.
const GEMINI_API_KEY: &str = "gemini_api_key";

/// Environment variable that overrides the stored Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Stored token could not be (de)serialized.
    #[error("Stored token is invalid: {0}")]
    Token(#[from] serde_json::Error),
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

fn read(key: &str) -> CredentialResult<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, key)?;
    match entry.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => {
            debug!("No {key} in keyring");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn write(key: &str, secret: &str) -> CredentialResult<()> {
    let entry = Entry::new(SERVICE_NAME, key)?;
    entry.set_password(secret)?;
    debug!("Stored {key} in keyring");
    Ok(())
}

/// Stores the Gmail OAuth token, serialized as JSON.
///
/// # Errors
///
/// Returns an error if serialization or the keyring operation fails.
pub fn store_gmail_token(token: &Token) -> CredentialResult<()> {
    write(GMAIL_TOKEN, &serde_json::to_string(token)?)
}

/// Retrieves the Gmail OAuth token.
///
/// # Errors
///
/// Returns an error if the keyring operation or deserialization fails.
pub fn load_gmail_token() -> CredentialResult<Option<Token>> {
    read(GMAIL_TOKEN)?
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Into::into)
}

/// Stores the Gemini API key.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_gemini_api_key(api_key: &str) -> CredentialResult<()> {
    write(GEMINI_API_KEY, api_key)
}

/// Gemini API key from the environment, falling back to the keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn gemini_api_key() -> CredentialResult<Option<String>> {
    resolve_api_key(std::env::var(GEMINI_API_KEY_ENV).ok(), || read(GEMINI_API_KEY))
}

fn resolve_api_key<F>(from_env: Option<String>, from_keyring: F) -> CredentialResult<Option<String>>
where
    F: FnOnce() -> CredentialResult<Option<String>>,
{
    match from_env.filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(Some(key.trim().to_string())),
        None => from_keyring(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_wins() {
        let key = resolve_api_key(Some(" env-key ".into()), || {
            Ok(Some("stored".to_string()))
        })
        .unwrap();
        assert_eq!(key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_blank_env_falls_back() {
        let key = resolve_api_key(Some("  ".into()), || Ok(Some("stored".to_string()))).unwrap();
        assert_eq!(key.as_deref(), Some("stored"));

        let key = resolve_api_key(None, || Ok(None)).unwrap();
        assert!(key.is_none());
    }

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn test_gmail_token_roundtrip() {
        let token = Token::new("access").with_refresh_token("refresh");
        store_gmail_token(&token).unwrap();
        assert_eq!(load_gmail_token().unwrap(), Some(token));
    }
}
