//! Gemini client for advice generation
//!
//! Thin wrapper around the `generateContent` REST endpoint. Builds the
//! prompt, sends it, and extracts the first candidate's text.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::advice::parse::{parse_reply, AdviceReply};
use crate::advice::prompt::build_prompt;

/// Default generative model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Advice generator errors
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned no candidates")]
    EmptyReply,
}

impl From<reqwest::Error> for AdviceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AdviceError::Timeout
        } else {
            AdviceError::Request(e)
        }
    }
}

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key (never logged)
    pub api_key: String,
    /// Model name, e.g. "gemini-2.5-flash"
    pub model: String,
    /// API base URL
    pub api_base: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Create a config with default model, endpoint, and timeouts
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Override the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Client for the Gemini generateContent API
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(config: GeminiConfig) -> Result<Self, AdviceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(AdviceError::ClientBuild)?;

        Ok(Self { client, config })
    }

    /// The configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a prompt and return the first candidate's raw text
    pub async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, self.config.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!("Requesting advice from model {}", self.config.model);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(AdviceError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(AdviceError::from)?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AdviceError::EmptyReply)
    }

    /// Generate advice for a detected disease and reported symptoms
    pub async fn advise(
        &self,
        disease: &str,
        symptoms: Option<&str>,
    ) -> Result<AdviceReply, AdviceError> {
        let prompt = build_prompt(disease, symptoms);
        let raw = self.generate(&prompt).await?;
        Ok(parse_reply(&raw))
    }
}
