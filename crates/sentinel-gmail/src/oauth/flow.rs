//! Authorization code flow with PKCE.

use url::Url;

use super::{OAuthClient, PkceChallenge, Token};
use crate::error::{Error, Result};

/// Authorization code flow for an installed application.
///
/// The user opens [`authorization_url`](Self::authorization_url), consents,
/// and pastes back the redirect URL (or just the code).
#[derive(Debug)]
pub struct AuthorizationFlow {
    client: OAuthClient,
    pkce: PkceChallenge,
}

impl AuthorizationFlow {
    /// Creates a flow with a fresh PKCE challenge.
    #[must_use]
    pub fn new(client: OAuthClient) -> Self {
        Self {
            client,
            pkce: PkceChallenge::generate(),
        }
    }

    /// Builds the consent URL.
    ///
    /// Offline access is requested so the token endpoint issues a refresh
    /// token, and consent is forced so it does so on every login.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let mut url = self.client.provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope = self.client.provider.scopes.join(" ");
            if !scope.is_empty() {
                pairs.append_pair("scope", &scope);
            }

            pairs
                .append_pair("state", state)
                .append_pair("code_challenge", self.pkce.challenge())
                .append_pair("code_challenge_method", PkceChallenge::METHOD)
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
        }

        Ok(url)
    }

    /// Exchanges the authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str) -> Result<Token> {
        self.client.exchange_code(code, self.pkce.verifier()).await
    }
}

/// Extracts the authorization code from what the user pasted.
///
/// Accepts the full redirect URL or the bare code. When a redirect URL is
/// given, its `state` must equal `expected_state`.
///
/// # Errors
///
/// Returns an error if the redirect carries an `error`, the state does not
/// match, or no code is present.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();

    let Ok(url) = Url::parse(input) else {
        if input.is_empty() {
            return Err(Error::oauth_error("missing_code", "No authorization code given"));
        }
        return Ok(input.to_string());
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(Error::oauth_error(error, "Authorization was not granted"));
    }
    if param("state").as_deref() != Some(expected_state) {
        return Err(Error::oauth_error("state_mismatch", "Redirect state does not match"));
    }
    param("code").ok_or_else(|| Error::oauth_error("missing_code", "Redirect URL has no code"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::oauth::{GMAIL_MODIFY_SCOPE, Provider};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn google_flow() -> AuthorizationFlow {
        let client = OAuthClient::new("test_client", Provider::google().unwrap())
            .with_redirect_uri("http://localhost");
        AuthorizationFlow::new(client)
    }

    #[test]
    fn test_authorization_url() {
        let flow = google_flow();
        let url = flow.authorization_url("xyz").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("client_id"), Some("test_client"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("redirect_uri"), Some("http://localhost"));
        assert_eq!(get("scope"), Some(GMAIL_MODIFY_SCOPE));
        assert_eq!(get("state"), Some("xyz"));
        assert_eq!(get("code_challenge"), Some(flow.pkce.challenge()));
        assert_eq!(get("code_challenge_method"), Some("S256"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("prompt"), Some("consent"));
    }

    #[test]
    fn test_extract_code_from_redirect() {
        let code =
            extract_code("http://localhost/?state=xyz&code=4%2F0Abc&scope=x", "xyz").unwrap();
        assert_eq!(code, "4/0Abc");
    }

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_code("  4/0Abc \n", "xyz").unwrap(), "4/0Abc");
        assert!(extract_code("   ", "xyz").is_err());
    }

    #[test]
    fn test_extract_code_rejects_bad_redirects() {
        assert!(matches!(
            extract_code("http://localhost/?state=other&code=c", "xyz"),
            Err(Error::OAuth { error, .. }) if error == "state_mismatch"
        ));
        assert!(matches!(
            extract_code("http://localhost/?error=access_denied&state=xyz", "xyz"),
            Err(Error::OAuth { error, .. }) if error == "access_denied"
        ));
    }

    #[tokio::test]
    async fn test_exchange_sends_verifier() {
        let server = MockServer::start().await;
        let provider = Provider::new(
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
        )
        .unwrap();
        let flow = AuthorizationFlow::new(OAuthClient::new("c", provider));

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains(format!(
                "code_verifier={}",
                flow.pkce.verifier()
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a",
                "token_type": "Bearer",
                "expires_in": 3599,
                "refresh_token": "r"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = flow.exchange_code("the-code").await.unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
    }
}
