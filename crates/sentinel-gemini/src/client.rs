//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::{Classification, ClassificationError, Classifier};

use crate::error::{Error, Result};
use crate::prompt::build_prompt;

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Classifier that asks a Gemini model for a verdict.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    api_key: String,
    model: String,
    api_base: String,
    http_client: Client,
}

impl GeminiClassifier {
    /// Creates a classifier using the default model and endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            http_client: Client::new(),
        }
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error
    /// status, the prompt is blocked, or the response carries no text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or(body, |envelope| envelope.error.message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: GenerateResponse = response.json().await?;
        response.into_text()
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<Classification, ClassificationError> {
        let text = self.generate(&build_prompt(sender, subject, body)).await?;
        debug!(model = %self.model, "Gemini answered {} bytes", text.len());
        Classification::from_model_output(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Blocked(reason));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Err(Error::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}
