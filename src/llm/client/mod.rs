//! LLM client for invoice structuring.
//!
//! Supports the Ollama chat API for local inference and any
//! OpenAI-compatible chat completions endpoint.

mod config;
mod prompts;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{extraction_prompt, repair_prompt};

/// A chat model that turns a single user prompt into a text completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` as one user message to `model` and return the reply text.
    async fn chat(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

/// HTTP chat client for the configured provider.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Option<Vec<OpenAiChoice>>,
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

impl LlmClient {
    /// Every completion is bounded by `config.timeout_secs`.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let timeout = std::time::Duration::from_secs(config.timeout_secs);
        Client::builder()
            .timeout(timeout)
            .build()
            .map(|client| Self { config, client })
            .map_err(|e| LlmError::Connection(format!("HTTP client setup: {}", e)))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn call_ollama(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let (temperature, num_predict) = (self.config.temperature, self.config.max_tokens);
        let request = OllamaRequest {
            model,
            messages: user_message(prompt),
            stream: false,
            options: (temperature.is_some() || num_predict.is_some()).then_some(OllamaOptions {
                temperature,
                num_predict,
            }),
        };

        let resp = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, detail.trim())));
        }

        resp.json::<OllamaResponse>()
            .await
            .map(|reply| reply.message.content)
            .map_err(|e| LlmError::Parse(e.to_string()))
    }

    async fn call_openai(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = OpenAiRequest {
            model,
            messages: user_message(prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self
            .client
            .post(self.endpoint("/v1/chat/completions"))
            .json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        let body: OpenAiResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("HTTP {}: {}", status, e)))?;

        if let Some(error) = body.error {
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error.message)));
        }
        if !status.is_success() {
            return Err(LlmError::Api(format!("HTTP {}", status)));
        }

        body.choices
            .and_then(|choices| choices.into_iter().next())
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "Calling {:?} model {} ({} prompt chars)",
            self.config.provider,
            model,
            prompt.len()
        );
        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(model, prompt).await,
            LlmProvider::OpenAI => self.call_openai(model, prompt).await,
        }
    }
}

fn user_message(prompt: &str) -> Vec<ChatMessage<'_>> {
    vec![ChatMessage {
        role: "user",
        content: prompt,
    }]
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// The service could not be reached or timed out.
    #[error("LLM connection failed: {0}")]
    Connection(String),
    /// Non-success status or an error object in the body.
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Unexpected LLM response: {0}")]
    Parse(String),
}
