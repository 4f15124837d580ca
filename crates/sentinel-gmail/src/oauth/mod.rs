//! Google `OAuth2`: consent URL, code exchange and token refresh.

mod flow;
mod pkce;
mod token;

pub use flow::{AuthorizationFlow, extract_code};
pub use pkce::PkceChallenge;
pub use token::Token;

use token::{ErrorResponse, TokenResponse};

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::Result;

/// Scope needed to read, label, draft, send and trash messages.
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Authorization server endpoints.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
}

impl Provider {
    /// Creates a provider from its endpoint URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid.
    pub fn new(auth_url: impl AsRef<str>, token_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            scopes: Vec::new(),
        })
    }

    /// Google endpoints with the Gmail modify scope.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        let mut provider = Self::new(
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )?;
        provider.scopes = vec![GMAIL_MODIFY_SCOPE.to_string()];
        Ok(provider)
    }
}

/// `OAuth2` client registration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI registered for the client.
    pub redirect_uri: Option<String>,
    /// Provider endpoints.
    pub provider: Provider,
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Obtains a new access token with the refresh-token grant.
    ///
    /// The returned token keeps the old refresh token when the server does
    /// not issue a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no refresh token or the grant fails.
    pub async fn refresh(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let new_token = self.request_token(&params).await?.into_token(Some(refresh_token));
        debug!("Access token refreshed");
        Ok(new_token)
    }

    /// Exchanges an authorization code for tokens.
    pub(crate) async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Token> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(uri) = &self.redirect_uri {
            params.push(("redirect_uri", uri.as_str()));
        }
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        Ok(self.request_token(&params).await?.into_token(None))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into());
        }

        Ok(response.json().await?)
    }
}
