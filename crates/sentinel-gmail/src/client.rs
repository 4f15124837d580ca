//! Gmail REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use sentinel_core::{Mailbox, MailboxError, Message};

use crate::error::{Error, Result};
use crate::mime::{PlainMessage, decode_snippet, reply_subject};
use crate::oauth::{OAuthClient, Token};

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UNKNOWN_SENDER: &str = "Unknown";
const NO_SUBJECT: &str = "No Subject";

/// Gmail mailbox for the authorized user.
#[derive(Debug)]
pub struct GmailClient {
    http_client: Client,
    api_base: String,
    oauth: OAuthClient,
    token: Mutex<Token>,
    own_address: OnceCell<String>,
}

impl GmailClient {
    /// Creates a client from an OAuth registration and a stored token.
    #[must_use]
    pub fn new(oauth: OAuthClient, token: Token) -> Self {
        Self {
            http_client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            oauth,
            token: Mutex::new(token),
            own_address: OnceCell::new(),
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// The token currently in use, including any refresh done so far.
    pub async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/gmail/v1/users/me/{path}", self.api_base)
    }

    /// Returns a usable access token, refreshing it when expired or forced.
    async fn access_token(&self, force_refresh: bool) -> Result<String> {
        let mut token = self.token.lock().await;
        if force_refresh || token.is_expired() {
            *token = self.oauth.refresh(&token).await?;
        }
        Ok(token.access_token.clone())
    }

    /// Sends an authorized request.
    ///
    /// A 401 triggers one forced token refresh and a single retry. A 404 is
    /// reported as [`Error::NotFound`] for `what`.
    async fn send<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let access_token = self.access_token(false).await?;
        let mut response = build()
            .bearer_auth(&access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Access token rejected, refreshing");
            let access_token = self.access_token(true).await?;
            response = build()
                .bearer_auth(&access_token)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;
        }

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(Error::NotFound(what.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map_or(body, |envelope| envelope.error.message);
                Err(Error::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Lists up to `limit` unread message ids, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_unread(&self, limit: u32) -> Result<Vec<String>> {
        let url = self.url("messages");
        let limit = limit.to_string();
        let list: MessageList = self
            .send("message list", || {
                self.http_client
                    .get(&url)
                    .query(&[("q", "is:unread"), ("maxResults", limit.as_str())])
            })
            .await?
            .json()
            .await?;

        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    /// Fetches sender, subject and snippet of one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the message is gone.
    pub async fn get_message(&self, id: &str) -> Result<Message> {
        let url = self.url(&format!("messages/{id}"));
        let metadata: MessageMetadata = self
            .send(id, || {
                self.http_client.get(&url).query(&[
                    ("format", "metadata"),
                    ("metadataHeaders", "From"),
                    ("metadataHeaders", "Subject"),
                ])
            })
            .await?
            .json()
            .await?;

        Ok(metadata.into_message())
    }

    /// Address of the authorized account, fetched once.
    async fn own_address(&self) -> Result<&str> {
        let address = self
            .own_address
            .get_or_try_init(|| async {
                let url = self.url("profile");
                let profile: Profile = self
                    .send("profile", || self.http_client.get(&url))
                    .await?
                    .json()
                    .await?;
                debug!(address = %profile.email_address, "Resolved own address");
                Ok::<_, Error>(profile.email_address)
            })
            .await?;
        Ok(address)
    }

    async fn post_json(&self, what: &str, path: &str, body: serde_json::Value) -> Result<()> {
        let url = self.url(path);
        self.send(what, || self.http_client.post(&url).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn fetch_unread(&self, limit: u32) -> std::result::Result<Vec<Message>, MailboxError> {
        let ids = self.list_unread(limit).await?;
        let mut messages = Vec::with_capacity(ids.len());

        for id in ids {
            match self.get_message(&id).await {
                Ok(message) => messages.push(message),
                // Deleted between list and get
                Err(Error::NotFound(_)) => warn!(id = %id, "Listed message vanished"),
                Err(e) => return Err(e.into()),
            }
        }

        debug!(count = messages.len(), "Fetched unread messages");
        Ok(messages)
    }

    async fn create_draft_reply(
        &self,
        to: &str,
        original_subject: &str,
        body: &str,
    ) -> std::result::Result<(), MailboxError> {
        let raw = PlainMessage::new(to, reply_subject(original_subject), body).to_raw();
        self.post_json("draft", "drafts", json!({ "message": { "raw": raw } }))
            .await?;
        debug!(to = %to, "Draft reply created");
        Ok(())
    }

    async fn send_to_self(&self, subject: &str, body: &str) -> std::result::Result<(), MailboxError> {
        let me = self.own_address().await?.to_string();
        let raw = PlainMessage::new(me, subject, body).to_raw();
        self.post_json("send", "messages/send", json!({ "raw": raw }))
            .await?;
        Ok(())
    }

    async fn archive(&self, id: &str) -> std::result::Result<(), MailboxError> {
        self.post_json(
            id,
            &format!("messages/{id}/modify"),
            json!({ "removeLabelIds": ["INBOX"] }),
        )
        .await?;
        Ok(())
    }

    async fn trash(&self, id: &str) -> std::result::Result<(), MailboxError> {
        let url = self.url(&format!("messages/{id}/trash"));
        self.send(id, || self.http_client.post(&url)).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageMetadata {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

impl MessageMetadata {
    fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn into_message(self) -> Message {
        let sender = self.header("From").unwrap_or(UNKNOWN_SENDER).to_string();
        let subject = self.header("Subject").unwrap_or(NO_SUBJECT).to_string();
        Message::new(self.id, sender, subject, decode_snippet(&self.snippet))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
