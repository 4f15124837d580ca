//! # sentinel-gmail
//!
//! Gmail REST implementation of the [`sentinel_core::Mailbox`] port, plus the
//! Google `OAuth2` pieces needed to obtain and refresh its access token.
//!
//! ## Authorizing
//!
//! ```ignore
//! use sentinel_gmail::{AuthorizationFlow, OAuthClient, Provider};
//!
//! let client = OAuthClient::new("client_id", Provider::google()?)
//!     .with_client_secret("secret")
//!     .with_redirect_uri("http://localhost");
//! let flow = AuthorizationFlow::new(client);
//!
//! println!("Visit: {}", flow.authorization_url("state")?);
//! let token = flow.exchange_code("code_from_redirect").await?;
//! ```
//!
//! ## Using the mailbox
//!
//! ```ignore
//! use sentinel_core::Mailbox;
//! use sentinel_gmail::GmailClient;
//!
//! let gmail = GmailClient::new(oauth_client, token);
//! for message in gmail.fetch_unread(5).await? {
//!     println!("{}: {}", message.sender, message.subject);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod mime;
pub mod oauth;

pub use client::{DEFAULT_API_BASE, GmailClient};
pub use error::{Error, Result};
pub use oauth::{
    AuthorizationFlow, GMAIL_MODIFY_SCOPE, OAuthClient, PkceChallenge, Provider, Token, extract_code,
};
