//! Minimal RFC 5322 messages for the Gmail `raw` field.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

/// Subject for a reply: `Re: ` is added unless already present.
#[must_use]
pub fn reply_subject(subject: &str) -> String {
    let subject = subject.trim();
    let already = subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));

    if already {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    }
}

/// A plain-text message ready to be handed to Gmail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMessage {
    /// Recipient (`To` header).
    pub to: String,
    /// Subject header.
    pub subject: String,
    /// UTF-8 body.
    pub body: String,
}

impl PlainMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders the message as RFC 5322 text with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let body = self.body.replace("\r\n", "\n").replace('\n', "\r\n");
        format!(
            "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=\"UTF-8\"\r\n\
             Content-Transfer-Encoding: 8bit\r\n\r\n{body}",
            header_value(&self.to),
            encode_word(&header_value(&self.subject)),
        )
    }

    /// Base64url encoding of [`to_rfc5322`](Self::to_rfc5322), as the
    /// Gmail API expects in `raw`.
    #[must_use]
    pub fn to_raw(&self) -> String {
        URL_SAFE.encode(self.to_rfc5322())
    }
}

/// Folds line breaks out of a header value.
fn header_value(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// RFC 2047 encoded-word for non-ASCII header text.
fn encode_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

/// Decodes the HTML entities Gmail leaves in message snippets.
#[must_use]
pub fn decode_snippet(snippet: &str) -> String {
    snippet
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_subject() {
        assert_eq!(reply_subject("Lunch?"), "Re: Lunch?");
        assert_eq!(reply_subject("Re: Lunch?"), "Re: Lunch?");
        assert_eq!(reply_subject("RE: Lunch?"), "RE: Lunch?");
        assert_eq!(reply_subject(""), "Re: ");
        assert_eq!(reply_subject("Ré"), "Re: Ré");
    }

    #[test]
    fn test_rfc5322_layout() {
        let text = PlainMessage::new("boss@company.com", "Re: Server", "On it.\nBack soon.")
            .to_rfc5322();

        assert!(text.starts_with("To: boss@company.com\r\nSubject: Re: Server\r\n"));
        assert!(text.ends_with("\r\n\r\nOn it.\r\nBack soon."));
    }

    #[test]
    fn test_header_injection_folded() {
        let text = PlainMessage::new("a@b.c", "Hi\r\nBcc: evil@x.y", "").to_rfc5322();
        assert!(text.contains("Subject: Hi Bcc: evil@x.y\r\n"));
    }

    #[test]
    fn test_non_ascii_subject_encoded() {
        let text = PlainMessage::new("a@b.c", "Café", "").to_rfc5322();
        assert!(text.contains("Subject: =?UTF-8?B?Q2Fmw6k=?=\r\n"));
    }

    #[test]
    fn test_raw_is_url_safe() {
        let raw = PlainMessage::new("a@b.c", "??>>", "ÿÿÿ").to_raw();
        assert!(!raw.contains('+') && !raw.contains('/'));
        let decoded = URL_SAFE.decode(raw).unwrap();
        assert!(String::from_utf8(decoded).unwrap().ends_with("ÿÿÿ"));
    }

    #[test]
    fn test_decode_snippet() {
        assert_eq!(
            decode_snippet("Tom &amp; Jerry&#39;s &quot;deal&quot; &lt;3"),
            "Tom & Jerry's \"deal\" <3"
        );
    }
}
