//! Text embedding
//!
//! [`Embedder`] turns chunks and questions into vectors. Requests are split
//! into batches of [`Embedder::batch_size`] and every batch must come back
//! with exactly one vector per input.

mod gemini;
mod openai;

pub use gemini::GeminiEmbedder;
pub use openai::OpenAIEmbedder;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::llm::LlmError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding model identifier
    fn model(&self) -> &str;

    /// Maximum texts per provider request
    fn batch_size(&self) -> usize {
        32
    }

    /// Embed one provider-sized batch
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embed any number of texts, one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        debug!(count = texts.len(), "Embedder::embed: called");
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size().max(1)) {
            let embedded = self.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(LlmError::InvalidResponse(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| LlmError::InvalidResponse("No embedding returned".to_string()))
    }
}

/// Create an embedder based on the provider specified in config
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_embedder: called");
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiEmbedder::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::from_config(config)?)),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Number of dimensions the mock produces
    pub const MOCK_DIMENSIONS: usize = 16;

    /// Deterministic bag-of-words embedder for tests
    ///
    /// Each lower-cased word increments one bucket picked by a simple hash,
    /// so texts sharing words are more similar.
    pub struct MockEmbedder {
        batch_size: usize,
        batches: AtomicUsize,
        fail: bool,
    }

    impl MockEmbedder {
        pub fn new() -> Self {
            Self {
                batch_size: 32,
                batches: AtomicUsize::new(0),
                fail: false,
            }
        }

        pub fn with_batch_size(batch_size: usize) -> Self {
            Self {
                batch_size,
                ..Self::new()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        pub fn batches(&self) -> usize {
            self.batches.load(Ordering::SeqCst)
        }
    }

    pub fn bag_of_words(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; MOCK_DIMENSIONS];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % MOCK_DIMENSIONS;
            v[bucket] += 1.0;
        }
        v
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        fn model(&self) -> &str {
            "mock-embedding"
        }

        fn batch_size(&self) -> usize {
            self.batch_size
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LlmError::InvalidResponse("mock embedder failure".to_string()));
            }
            Ok(texts.iter().map(|t| bag_of_words(t)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MOCK_DIMENSIONS, MockEmbedder};
    use super::*;

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model(&self) -> &str {
            "short"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text number {}", i)).collect()
    }

    #[tokio::test]
    async fn test_embed_batches_inputs() {
        let embedder = MockEmbedder::with_batch_size(4);
        let vectors = embedder.embed(&texts(10)).await.unwrap();
        assert_eq!(vectors.len(), 10);
        assert_eq!(embedder.batches(), 3);
        assert!(vectors.iter().all(|v| v.len() == MOCK_DIMENSIONS));
    }

    #[tokio::test]
    async fn test_embed_empty_input_makes_no_requests() {
        let embedder = MockEmbedder::new();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
        assert_eq!(embedder.batches(), 0);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let result = ShortEmbedder.embed(&texts(3)).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_embed_query() {
        let vector = MockEmbedder::new().embed_query("paris france").await.unwrap();
        assert_eq!(vector.len(), MOCK_DIMENSIONS);
        assert_eq!(vector.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "mystery".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(create_embedder(&config), Err(LlmError::UnknownProvider(_))));
    }
}
