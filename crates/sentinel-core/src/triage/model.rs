//! Classification data models.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::port::ClassificationError;

/// Longest summary kept, in words.
pub const SUMMARY_MAX_WORDS: usize = 15;

/// Lowest and highest urgency score.
pub const URGENCY_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// What kind of message this is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Work correspondence.
    Work,
    /// Personal correspondence.
    Personal,
    /// Unsolicited junk.
    Spam,
    /// Newsletters and subscriptions.
    Newsletter,
    /// Receipts, statements, invoices.
    Finance,
    /// Notifications and announcements with nothing to do.
    Informational,
    /// One-time passwords and verification codes.
    Otp,
    /// Any label the classifier invented that we don't know.
    Other(String),
}

impl Category {
    /// Parse a category label, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "work" => Self::Work,
            "personal" => Self::Personal,
            "spam" => Self::Spam,
            "newsletter" => Self::Newsletter,
            "finance" => Self::Finance,
            "informational" => Self::Informational,
            "otp" => Self::Otp,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Spam => "Spam",
            Self::Newsletter => "Newsletter",
            Self::Finance => "Finance",
            Self::Informational => "Informational",
            Self::Otp => "OTP",
            Self::Other(label) => label,
        }
    }

    /// Low-priority categories that are rolled into the digest.
    #[must_use]
    pub const fn is_digest_worthy(&self) -> bool {
        matches!(self, Self::Newsletter | Self::Informational | Self::Finance)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// The action the classifier recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestedAction {
    /// Move out of the inbox.
    Archive,
    /// Answer the sender.
    Reply,
    /// Leave it, just mark it read.
    MarkAsRead,
    /// Flag for attention.
    Flag,
    /// Roll into the digest.
    Digest,
    /// Throw away.
    Trash,
}

impl SuggestedAction {
    /// All actions, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Archive,
        Self::Reply,
        Self::MarkAsRead,
        Self::Flag,
        Self::Digest,
        Self::Trash,
    ];

    /// Parse an action label.
    ///
    /// Case, spaces, hyphens and underscores are ignored, so `"Mark as Read"`
    /// and `"mark_as_read"` both give [`SuggestedAction::MarkAsRead`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "archive" => Some(Self::Archive),
            "reply" => Some(Self::Reply),
            "markasread" => Some(Self::MarkAsRead),
            "flag" => Some(Self::Flag),
            "digest" => Some(Self::Digest),
            "trash" => Some(Self::Trash),
            _ => None,
        }
    }

    /// Canonical label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "Archive",
            Self::Reply => "Reply",
            Self::MarkAsRead => "Mark as Read",
            Self::Flag => "Flag",
            Self::Digest => "Digest",
            Self::Trash => "Trash",
        }
    }
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SuggestedAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SuggestedAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown suggested action: {s}")))
    }
}

/// A structured verdict about one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Message category.
    pub category: Category,
    /// 1 (ignore) to 10 (crisis).
    pub urgency_score: u8,
    /// Whether the recipient has something to do.
    pub is_actionable: bool,
    /// Short summary, at most [`SUMMARY_MAX_WORDS`] words.
    pub summary: String,
    /// Recommended action.
    pub suggested_action: SuggestedAction,
    /// Proposed reply text, if a reply makes sense.
    pub draft_reply: Option<String>,
}

impl Classification {
    /// Creates a classification with the given category and action.
    ///
    /// Urgency defaults to 1, the summary is empty and there is no draft.
    #[must_use]
    pub const fn new(category: Category, suggested_action: SuggestedAction) -> Self {
        Self {
            category,
            urgency_score: 1,
            is_actionable: false,
            summary: String::new(),
            suggested_action,
            draft_reply: None,
        }
    }

    /// Sets the summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the draft reply.
    #[must_use]
    pub fn with_draft_reply(mut self, draft: impl Into<String>) -> Self {
        self.draft_reply = Some(draft.into());
        self
    }

    /// The draft reply, if one is present and not blank.
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.draft_reply
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Parse raw language-model output into a classification.
    ///
    /// Markdown code fences are stripped and the outermost JSON object is
    /// taken, so chatty replies around the object are tolerated. Each field
    /// is then checked on its own.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassificationError`] describing the first problem found.
    pub fn from_model_output(text: &str) -> Result<Self, ClassificationError> {
        let cleaned = text.replace("```json", "").replace("```", "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(ClassificationError::Empty);
        }

        let object = outermost_object(cleaned)
            .ok_or_else(|| ClassificationError::Malformed("no JSON object found".into()))?;
        let value: Value = serde_json::from_str(object)
            .map_err(|e| ClassificationError::Malformed(e.to_string()))?;

        Self::from_value(&value)
    }

    /// Build a classification from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassificationError`] if the value is not an object or a
    /// field is missing or invalid.
    pub fn from_value(value: &Value) -> Result<Self, ClassificationError> {
        let fields = value
            .as_object()
            .ok_or_else(|| ClassificationError::Malformed("expected a JSON object".into()))?;

        let category = Category::parse(required_str(fields, "category")?);
        let urgency_score = urgency(fields)?;
        let is_actionable = actionable(fields)?;
        let summary = truncate_words(required_str(fields, "summary")?, SUMMARY_MAX_WORDS);

        let action_label = required_str(fields, "suggested_action")?;
        let suggested_action =
            SuggestedAction::parse(action_label).ok_or_else(|| invalid("suggested_action", action_label))?;

        let draft_reply = match fields.get("draft_reply") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(other) => return Err(invalid("draft_reply", &other.to_string())),
        };

        Ok(Self {
            category,
            urgency_score,
            is_actionable,
            summary,
            suggested_action,
            draft_reply,
        })
    }
}

fn invalid(field: &'static str, value: &str) -> ClassificationError {
    ClassificationError::InvalidValue {
        field,
        value: value.to_string(),
    }
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ClassificationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ClassificationError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ClassificationError> {
    let value = required(fields, field)?;
    value
        .as_str()
        .ok_or_else(|| invalid(field, &value.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn urgency(fields: &Map<String, Value>) -> Result<u8, ClassificationError> {
    let value = required(fields, "urgency_score")?;
    let score = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid("urgency_score", &value.to_string()))?;

    let (low, high) = (i64::from(*URGENCY_RANGE.start()), i64::from(*URGENCY_RANGE.end()));
    Ok(score.clamp(low, high) as u8)
}

fn actionable(fields: &Map<String, Value>) -> Result<bool, ClassificationError> {
    let value = required(fields, "is_actionable")?;
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(invalid("is_actionable", &other.to_string())),
    }
}

/// Slice from the first `{` to the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
