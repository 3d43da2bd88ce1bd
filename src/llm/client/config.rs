//! Chat service settings: which API to talk to and which models to use.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Hosted OpenAI-compatible services selectable by name in `LLM_PROVIDER`.
const HOSTED_ENDPOINTS: [(&str, &str); 3] = [
    ("openai", "https://api.openai.com"),
    ("groq", "https://api.groq.com/openai"),
    ("together", "https://api.together.xyz"),
];

/// Wire protocol spoken by the chat service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama `/api/chat`.
    #[default]
    Ollama,
    /// OpenAI-style `/v1/chat/completions` (also Groq, Together).
    #[serde(alias = "groq", alias = "together")]
    OpenAI,
}

impl LlmProvider {
    /// Resolve a provider or hosted-service name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name == "ollama" {
            Some(Self::Ollama)
        } else if HOSTED_ENDPOINTS.iter().any(|(hosted, _)| *hosted == name) {
            Some(Self::OpenAI)
        } else {
            None
        }
    }
}

fn hosted_endpoint(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    HOSTED_ENDPOINTS
        .iter()
        .find(|(hosted, _)| *hosted == name)
        .map(|(_, url)| *url)
}

/// `[llm]` section. Missing keys take the values from [`LlmConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Base URL; API paths are appended to it.
    pub endpoint: String,
    /// Bearer token, only sent to OpenAI-compatible services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Structures OCR text into invoice JSON.
    pub model: String,
    /// Fixes malformed JSON from `model`.
    pub repair_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Per-completion HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            model: "llama3.1".to_string(),
            repair_model: "phi3".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 300,
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'", key, raw);
            None
        }
    }
}

impl LlmConfig {
    /// Apply `LLM_*` environment overrides.
    ///
    /// Naming a hosted service in `LLM_PROVIDER` (openai, groq, together)
    /// also points `endpoint` at it unless `LLM_ENDPOINT` is set. The API key
    /// falls back to `OPENAI_API_KEY` for OpenAI-compatible providers.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(name) = env("LLM_PROVIDER") {
            match LlmProvider::from_name(&name) {
                Some(provider) => {
                    self.provider = provider;
                    if let Some(url) = hosted_endpoint(&name) {
                        self.endpoint = url.to_string();
                    }
                }
                None => tracing::warn!("Ignoring unknown LLM_PROVIDER '{}'", name),
            }
        }
        if let Some(endpoint) = env("LLM_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(key) = env("LLM_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() && self.provider == LlmProvider::OpenAI {
            self.api_key = env("OPENAI_API_KEY");
        }

        if let Some(model) = env("LLM_MODEL") {
            self.model = model;
        }
        if let Some(model) = env("LLM_REPAIR_MODEL") {
            self.repair_model = model;
        }
        if let Some(temperature) = env_parsed("LLM_TEMPERATURE") {
            self.temperature = Some(temperature);
        }
        if let Some(max_tokens) = env_parsed("LLM_MAX_TOKENS") {
            self.max_tokens = Some(max_tokens);
        }
        if let Some(timeout) = env_parsed("LLM_TIMEOUT_SECS") {
            self.timeout_secs = timeout;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert_eq!(LlmProvider::from_name("Groq"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_name("ollama"), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::from_name("bard"), None);
    }

    #[test]
    fn test_hosted_endpoint() {
        assert_eq!(hosted_endpoint("GROQ"), Some("https://api.groq.com/openai"));
        assert_eq!(hosted_endpoint("ollama"), None);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{"provider": "together"}"#).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.repair_model, "phi3");
        assert_eq!(config.timeout_secs, 300);
    }
}
