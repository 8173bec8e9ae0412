use log::{debug, info};
use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

use crate::utils::config::{Credentials, LLMConfig};

/// Model every prompt is sent to.
pub const MODEL: &str = "llama-3.1-70b-versatile";

/// Greedy decoding; the same page should yield the same postings.
pub const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request to language model failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("language model API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid language model response structure")]
    InvalidResponse,
    #[error("failed to encode prompt input: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single-shot text completion backend.
pub trait LanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Client for Groq's OpenAI-compatible chat completions API.
pub struct GroqClient {
    client: reqwest::Client,
    credentials: Credentials,
    endpoint: String,
}

impl GroqClient {
    pub fn new(credentials: Credentials, config: &LLMConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            endpoint: config.endpoint.clone(),
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

impl LanguageModel for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        info!("calling language model (model: {})", MODEL);
        debug!("prompt length: {} characters", prompt.len());

        let request_body = json!({
            "model": MODEL,
            "temperature": TEMPERATURE,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.credentials.api_key())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ModelError::Status { status, body });
        }

        let body: Value = response.json().await?;
        let content = completion_text(&body).ok_or(ModelError::InvalidResponse)?;

        debug!("completion length: {} characters", content.len());
        Ok(content.to_string())
    }
}

fn completion_text(body: &Value) -> Option<&str> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
}
