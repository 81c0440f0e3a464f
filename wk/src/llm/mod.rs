//! LLM Client module for WikiChat
//!
//! Provides completion requests with tool calling against Gemini or any
//! OpenAI-compatible endpoint.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
pub(crate) mod http;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, Role, StopReason, TokenUsage,
    ToolCall, ToolDefinition,
};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "gemini" and "openai" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}

/// Creates clients for a named model
///
/// The session asks for a fresh client whenever the user switches models.
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, model: &str) -> Result<Arc<dyn LlmClient>, LlmError>;
}

impl ClientFactory for LlmConfig {
    fn client_for(&self, model: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
        create_client(&self.with_model(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::UnknownProvider(p)) if p == "mystery"));
    }

    #[test]
    fn test_openai_client_without_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            model: "llama3".to_string(),
            api_key_env: "WIKICHAT_TEST_UNSET_KEY".to_string(),
            base_url: "http://localhost:11434".to_string(),
            ..LlmConfig::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_gemini_client_requires_key() {
        let config = LlmConfig {
            api_key_env: "WIKICHAT_TEST_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    fn test_factory_uses_requested_model() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key_env: "WIKICHAT_TEST_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        };
        let client = config.client_for("gemini-1.5-pro").unwrap();
        assert_eq!(client.model(), "gemini-1.5-pro");
    }
}
