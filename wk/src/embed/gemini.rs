//! Gemini `batchEmbedContents` embedder

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::llm::LlmError;
use crate::llm::http::post_json;

pub struct GeminiEmbedder {
    model: String,
    api_key: String,
    base_url: String,
    batch_size: usize,
    http: Client,
}

impl GeminiEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "GeminiEmbedder::from_config: called");
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:batchEmbedContents?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn build_request_body(&self, texts: &[String]) -> serde_json::Value {
        let model = format!("models/{}", self.model);
        serde_json::json!({
            "requests": texts.iter().map(|text| serde_json::json!({
                "model": model,
                "content": { "parts": [{ "text": text }] },
            })).collect::<Vec<_>>(),
        })
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        debug!(count = texts.len(), %self.model, "GeminiEmbedder::embed_batch: called");
        let body = self.build_request_body(texts);
        let response: BatchEmbedResponse = post_json(&self.http, &self.endpoint(), None, &body).await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> GeminiEmbedder {
        GeminiEmbedder {
            model: "text-embedding-004".to_string(),
            api_key: "k".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            batch_size: 32,
            http: Client::new(),
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            embedder().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:batchEmbedContents?key=k"
        );
    }

    #[test]
    fn test_request_body() {
        let body = embedder().build_request_body(&["a".to_string(), "b".to_string()]);
        assert_eq!(body["requests"].as_array().unwrap().len(), 2);
        assert_eq!(body["requests"][0]["model"], "models/text-embedding-004");
        assert_eq!(body["requests"][1]["content"]["parts"][0]["text"], "b");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let response: BatchEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }
}
