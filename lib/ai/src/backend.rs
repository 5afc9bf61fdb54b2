//! Model gateway abstraction.
//!
//! A gateway turns a transcript into the model's next assistant message. It
//! remembers nothing between calls except the tools it was told to
//! advertise; conversational memory is the transcript the caller passes in.

use crate::error::LlmError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use toolchat_conversation::{Message, ToolDescriptor, Transcript};

/// Connection and sampling settings for an OpenAI-compatible model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the API, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub name: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Bound on a single request, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ModelConfig {
    /// Points the configuration at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// The language-model service as seen by the chat loop.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sets the tools the model may request. Replaces any earlier set.
    fn advertise(&mut self, tools: &[ToolDescriptor]);

    /// Sends the whole transcript and returns the next assistant message.
    ///
    /// The message carries text (possibly empty) and zero or more tool-call
    /// requests in the order the model issued them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply cannot be parsed.
    /// Nothing is retried.
    async fn infer(&self, transcript: &Transcript) -> Result<Message, Report<LlmError>>;

    /// Returns the model name.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_config_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.name, "llama3-8b-8192");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn model_config_fills_missing_fields() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"name": "llama-3.1-8b-instant"}"#).expect("deserialize");
        assert_eq!(config.name, "llama-3.1-8b-instant");
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn model_config_builder() {
        let config = ModelConfig::default()
            .with_base_url("http://localhost:8080/v1");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.name, "llama3-8b-8192");
    }
}
