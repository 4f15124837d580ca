//! Gmail mailbox against a mock API server.

#![allow(clippy::unwrap_used)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sentinel_core::{Mailbox, MailboxError};
use sentinel_gmail::{GmailClient, OAuthClient, Provider, Token};

const BASE: &str = "/gmail/v1/users/me";

fn fresh_token() -> Token {
    Token::new("good-token")
        .with_refresh_token("refresh-1")
        .with_expires_at(Utc::now() + Duration::hours(1))
}

fn gmail(server: &MockServer, token: Token) -> GmailClient {
    let provider = Provider::new(
        format!("{}/auth", server.uri()),
        format!("{}/token", server.uri()),
    )
    .unwrap();
    GmailClient::new(OAuthClient::new("client", provider), token).with_api_base(server.uri())
}

async fn mount_token_endpoint(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn decoded_raw(body: &[u8], pointer: &str) -> String {
    let body: Value = serde_json::from_slice(body).unwrap();
    let raw = body.pointer(pointer).unwrap().as_str().unwrap();
    String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap()
}

#[tokio::test]
async fn fetch_unread_lists_then_gets_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/messages")))
        .and(query_param("q", "is:unread"))
        .and(query_param("maxResults", "5"))
        .and(header("authorization", "Bearer good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "m2", "threadId": "t2" }, { "id": "m1", "threadId": "t1" }],
            "resultSizeEstimate": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/messages/m2")))
        .and(query_param("format", "metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2",
            "snippet": "Your statement &amp; rewards",
            "payload": { "headers": [
                { "name": "From", "value": "Bank <billing@bank.com>" },
                { "name": "Subject", "value": "Statement ready" }
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/messages/m1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1",
            "snippet": "",
            "payload": { "headers": [] }
        })))
        .mount(&server)
        .await;

    let messages = gmail(&server, fresh_token()).fetch_unread(5).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "m2");
    assert_eq!(messages[0].sender, "Bank <billing@bank.com>");
    assert_eq!(messages[0].subject, "Statement ready");
    assert_eq!(messages[0].body, "Your statement & rewards");
    assert_eq!(messages[1].sender, "Unknown");
    assert_eq!(messages[1].subject, "No Subject");
}

#[tokio::test]
async fn empty_inbox_has_no_messages_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/messages")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resultSizeEstimate": 0 })))
        .mount(&server)
        .await;

    let messages = gmail(&server, fresh_token()).fetch_unread(5).await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn expired_token_is_refreshed_first() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "refreshed-token").await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/m1/modify")))
        .and(header("authorization", "Bearer refreshed-token"))
        .and(body_json(json!({ "removeLabelIds": ["INBOX"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let expired = Token::new("stale")
        .with_refresh_token("refresh-1")
        .with_expires_at(Utc::now() - Duration::minutes(5));
    let client = gmail(&server, expired);
    client.archive("m1").await.unwrap();

    let token = client.token().await;
    assert_eq!(token.access_token, "refreshed-token");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn unauthorized_retries_once_after_refresh() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "second-token").await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/m1/trash")))
        .and(header("authorization", "Bearer good-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/m1/trash")))
        .and(header("authorization", "Bearer second-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    gmail(&server, fresh_token()).trash("m1").await.unwrap();
}

#[tokio::test]
async fn trash_of_missing_message_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/gone/trash")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found." }
        })))
        .mount(&server)
        .await;

    let err = gmail(&server, fresh_token()).trash("gone").await.unwrap_err();
    assert!(matches!(err, MailboxError::NotFound(id) if id == "gone"));
}

#[tokio::test]
async fn api_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/m1/modify")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Backend Error" }
        })))
        .mount(&server)
        .await;

    let err = gmail(&server, fresh_token()).archive("m1").await.unwrap_err();
    assert!(
        matches!(err, MailboxError::Api { status: 500, ref message } if message == "Backend Error")
    );
}

#[tokio::test]
async fn draft_reply_is_encoded_rfc5322() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/drafts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d1" })))
        .expect(1)
        .mount(&server)
        .await;

    gmail(&server, fresh_token())
        .create_draft_reply("boss@company.com", "Server down", "Looking into it now.")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let text = decoded_raw(&requests[0].body, "/message/raw");
    assert!(text.contains("To: boss@company.com\r\n"));
    assert!(text.contains("Subject: Re: Server down\r\n"));
    assert!(text.ends_with("Looking into it now."));
}

#[tokio::test]
async fn send_to_self_resolves_address_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BASE}/profile")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "emailAddress": "me@example.com",
            "messagesTotal": 10
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{BASE}/messages/send")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s1" })))
        .expect(2)
        .mount(&server)
        .await;

    let client = gmail(&server, fresh_token());
    client.send_to_self("Digest: 1 update", "one").await.unwrap();
    client.send_to_self("Digest: 2 updates", "two").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent = requests
        .iter()
        .find(|r| r.url.path().ends_with("/messages/send"))
        .unwrap();
    let text = decoded_raw(&sent.body, "/raw");
    assert!(text.starts_with("To: me@example.com\r\n"));
    assert!(text.contains("Subject: Digest: 1 update\r\n"));
}

#[tokio::test]
async fn refresh_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let expired = Token::new("stale")
        .with_refresh_token("revoked")
        .with_expires_at(Utc::now() - Duration::minutes(5));
    let err = gmail(&server, expired).fetch_unread(5).await.unwrap_err();

    assert!(matches!(err, MailboxError::Auth(_)));
}
