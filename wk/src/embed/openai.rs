//! OpenAI-compatible `/v1/embeddings` embedder
//!
//! Also covers local servers (Ollama, LM Studio, text-embeddings-inference),
//! which is why the API key is optional.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::llm::LlmError;
use crate::llm::http::post_json;

pub struct OpenAIEmbedder {
    model: String,
    api_key: Option<String>,
    base_url: String,
    batch_size: usize,
    http: Client,
}

impl OpenAIEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "OpenAIEmbedder::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size,
            http,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        debug!(count = texts.len(), %self.model, "OpenAIEmbedder::embed_batch: called");
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({ "model": self.model, "input": texts });
        let response: EmbeddingsResponse = post_json(&self.http, &url, self.api_key.as_deref(), &body).await?;
        Ok(into_vectors(response))
    }
}

/// Vectors in input order; the API tags each with its input index
fn into_vectors(response: EmbeddingsResponse) -> Vec<Vec<f32>> {
    let mut data = response.data;
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
