//! Stored Gmail credential and the token endpoint's wire format.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Seconds before expiry at which a token is treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Gmail credential as kept in the keyring. Always sent as a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer token for Gmail API calls.
    pub access_token: String,
    /// When the access token stops working, if the server said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Long-lived token used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Token {
    /// Creates a token with no expiry and no refresh token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
            refresh_token: None,
        }
    }

    /// True once the access token is within a minute of expiring.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= exp)
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRefreshToken`] if none was issued.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)
    }
}

/// Successful token endpoint response. Google also sends `token_type`,
/// `scope` and `id_token`, none of which the mailbox needs.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u32>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// Builds the stored token. Google omits the refresh token on
    /// refresh grants, so `previous_refresh` is carried over in that case.
    pub(crate) fn into_token(self, previous_refresh: Option<&str>) -> Token {
        Token {
            access_token: self.access_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(i64::from(secs))),
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
        }
    }
}

/// Error body from the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

impl From<ErrorResponse> for Error {
    fn from(response: ErrorResponse) -> Self {
        Self::oauth_error(response.error, response.error_description)
    }
}
