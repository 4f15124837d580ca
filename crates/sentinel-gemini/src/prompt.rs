//! Triage prompt.

/// Build the classification prompt for one message.
///
/// The model is asked for a bare JSON object whose fields match
/// [`sentinel_core::Classification`].
#[must_use]
pub fn build_prompt(sender: &str, subject: &str, body: &str) -> String {
    format!(
        r#"You are an executive assistant named "Inbox Sentinel".
Analyze the following incoming email and return a strictly valid JSON object.

Sender: {sender}
Subject: {subject}
Body: {body}

Output JSON format:
{{
    "category": "Work" | "Personal" | "Spam" | "Newsletter" | "Finance" | "Informational" | "OTP",
    "urgency_score": (integer 1-10, where 10 is an immediate crisis),
    "is_actionable": (boolean),
    "summary": (string, max 15 words),
    "suggested_action": "Archive" | "Reply" | "Mark as Read" | "Flag" | "Digest" | "Trash",
    "draft_reply": (string, null if no reply is needed. Be professional and concise.)
}}

Guidance:
- One-time passwords, login codes and verification codes: category "OTP", action "Trash".
- Newsletters, announcements and routine statements: action "Digest".
- Only suggest "Reply" when a human answer is expected, and always include draft_reply then.

Return ONLY the JSON. No markdown formatting."#
    )
}
