//! Retrieval-augmented question answering over a [`WikiIndex`]
//!
//! A query embeds the question, retrieves the most similar chunks and
//! synthesizes an answer: the first batch of context is answered with the QA
//! prompt, every further batch refines that answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use vectorstore::{ScoredNode, StoreError};

use crate::config::IndexConfig;
use crate::embed::Embedder;
use crate::index::WikiIndex;
use crate::llm::{LlmClient, LlmError};
use crate::prompts::{PromptError, Prompts};

/// Answer returned when retrieval finds nothing
pub const NO_CONTEXT_ANSWER: &str = "No relevant information was found in the indexed Wikipedia pages.";

/// Max tokens per synthesis call
const SYNTHESIS_MAX_TOKENS: u32 = 1024;

/// How retrieved chunks become an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Pack as many chunks as fit into each prompt
    #[default]
    Compact,
    /// One chunk per prompt
    Refine,
}

impl std::fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Refine => write!(f, "refine"),
        }
    }
}

/// Retrieval and synthesis options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub similarity_top_k: usize,
    pub response_mode: ResponseMode,
    /// Characters of context per synthesis prompt
    pub context_window_chars: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            similarity_top_k: 10,
            response_mode: ResponseMode::Compact,
            context_window_chars: 12_000,
        }
    }
}

impl From<&IndexConfig> for QueryOptions {
    fn from(config: &IndexConfig) -> Self {
        Self {
            similarity_top_k: config.similarity_top_k,
            response_mode: config.response_mode,
            context_window_chars: config.context_window_chars,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// A synthesized answer and the chunks it was drawn from
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub response: String,
    pub source_nodes: Vec<ScoredNode>,
}

pub struct QueryEngine {
    index: Arc<WikiIndex>,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    options: QueryOptions,
    prompts: Prompts,
}

impl QueryEngine {
    pub fn new(
        index: Arc<WikiIndex>,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
        options: QueryOptions,
    ) -> Result<Self, QueryError> {
        debug!(?options, model = %llm.model(), "QueryEngine::new: called");
        Ok(Self {
            index,
            llm,
            embedder,
            options,
            prompts: Prompts::new()?,
        })
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// The top-k chunks most similar to `question`
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredNode>, QueryError> {
        debug!(%question, top_k = self.options.similarity_top_k, "QueryEngine::retrieve: called");
        if self.index.vector_index().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_query(question).await?;
        Ok(self
            .index
            .vector_index()
            .top_k(&embedding, self.options.similarity_top_k)?)
    }

    /// Answer `question` from the index
    pub async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        debug!(%question, "QueryEngine::query: called");
        let source_nodes = self.retrieve(question).await?;
        if source_nodes.is_empty() {
            debug!("query: no nodes retrieved");
            return Ok(QueryResponse {
                response: NO_CONTEXT_ANSWER.to_string(),
                source_nodes,
            });
        }

        let texts: Vec<String> = source_nodes.iter().map(|s| format_node(&s.node)).collect();
        let windows = match self.options.response_mode {
            ResponseMode::Compact => pack_windows(&texts, self.options.context_window_chars),
            ResponseMode::Refine => texts,
        };

        let response = self.synthesize(question, &windows).await?;
        info!(
            source_count = source_nodes.len(),
            window_count = windows.len(),
            mode = %self.options.response_mode,
            "Query answered"
        );
        Ok(QueryResponse { response, source_nodes })
    }

    async fn synthesize(&self, question: &str, windows: &[String]) -> Result<String, QueryError> {
        let mut answer: Option<String> = None;

        for (i, context) in windows.iter().enumerate() {
            debug!(window = i, chars = context.len(), "synthesize: window");
            let prompt = match &answer {
                None => self
                    .prompts
                    .render("qa", &serde_json::json!({ "context": context, "query": question }))?,
                Some(existing) => self.prompts.render(
                    "refine",
                    &serde_json::json!({ "context": context, "query": question, "existing_answer": existing }),
                )?,
            };
            let text = self.llm.complete_text(&prompt, SYNTHESIS_MAX_TOKENS).await?;
            answer = Some(text.trim().to_string());
        }

        Ok(answer.unwrap_or_else(|| NO_CONTEXT_ANSWER.to_string()))
    }
}

fn format_node(node: &vectorstore::Node) -> String {
    format!("[{}]\n{}", node.title, node.text)
}

/// Pack texts into as few windows of at most `max_chars` as possible
///
/// Order is preserved; a text longer than `max_chars` gets a window of its own.
fn pack_windows(texts: &[String], max_chars: usize) -> Vec<String> {
    const SEPARATOR: &str = "\n\n";
    let mut windows = Vec::new();
    let mut current = String::new();

    for text in texts {
        if !current.is_empty() && current.len() + SEPARATOR.len() + text.len() > max_chars {
            windows.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str(SEPARATOR);
        }
        current.push_str(text);
    }
    if !current.is_empty() {
        windows.push(current);
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::mock::MockEmbedder;
    use crate::llm::client::mock::MockLlmClient;
    use vectorstore::{ChunkOptions, Node, VectorIndex};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pack_windows_fills_greedily() {
        let texts = strings(&["aaaa", "bbbb", "cccc"]);
        assert_eq!(pack_windows(&texts, 10), vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(pack_windows(&texts, 100), vec!["aaaa\n\nbbbb\n\ncccc"]);
    }

    #[test]
    fn test_pack_windows_oversized_text_alone() {
        let texts = strings(&["a", "0123456789abcdef", "b"]);
        assert_eq!(pack_windows(&texts, 8), vec!["a", "0123456789abcdef", "b"]);
    }

    #[test]
    fn test_response_mode_serde() {
        assert_eq!(serde_yaml::from_str::<ResponseMode>("compact").unwrap(), ResponseMode::Compact);
        assert_eq!(serde_yaml::from_str::<ResponseMode>("refine").unwrap(), ResponseMode::Refine);
    }

    async fn engine(llm: Arc<MockLlmClient>, options: QueryOptions) -> QueryEngine {
        let embedder = Arc::new(MockEmbedder::new());
        let docs = vec![
            crate::wikipedia::Document {
                id: "1".to_string(),
                title: "Paris".to_string(),
                url: String::new(),
                text: "Paris is the capital of France. The Louvre is in Paris.".to_string(),
            },
            crate::wikipedia::Document {
                id: "2".to_string(),
                title: "Lagos".to_string(),
                url: String::new(),
                text: "Lagos is a city in Nigeria.".to_string(),
            },
        ];
        let chunking = ChunkOptions {
            chunk_size: 8,
            chunk_overlap: 0,
        };
        let index = crate::index::build_index(&docs, embedder.as_ref(), &chunking)
            .await
            .unwrap();
        Arc::new(index).as_query_engine(llm, embedder, options).unwrap()
    }

    #[tokio::test]
    async fn test_compact_uses_single_prompt() {
        let llm = Arc::new(MockLlmClient::with_texts(&["Paris is the capital."]));
        let engine = engine(llm.clone(), QueryOptions::default()).await;

        let response = engine.query("What is the capital of France?").await.unwrap();
        assert_eq!(response.response, "Paris is the capital.");
        assert_eq!(response.source_nodes.len(), 3);
        assert_eq!(llm.call_count(), 1);

        let prompt = llm.requests()[0].messages[0].content.as_text().unwrap().to_string();
        assert!(prompt.contains("Query: What is the capital of France?"));
        assert!(prompt.contains("[Paris]"));
    }

    #[tokio::test]
    async fn test_refine_mode_refines_per_chunk() {
        let llm = Arc::new(MockLlmClient::with_texts(&["first", "second", "third"]));
        let options = QueryOptions {
            response_mode: ResponseMode::Refine,
            ..QueryOptions::default()
        };
        let engine = engine(llm.clone(), options).await;

        let response = engine.query("capital?").await.unwrap();
        assert_eq!(response.response, "third");
        assert_eq!(llm.call_count(), 3);

        let refine_prompt = llm.requests()[1].messages[0].content.as_text().unwrap().to_string();
        assert!(refine_prompt.contains("We have provided an existing answer: first"));
    }

    #[tokio::test]
    async fn test_top_k_limits_sources() {
        let llm = Arc::new(MockLlmClient::with_texts(&["answer"]));
        let options = QueryOptions {
            similarity_top_k: 1,
            ..QueryOptions::default()
        };
        let engine = engine(llm, options).await;

        let response = engine.query("Nigeria").await.unwrap();
        assert_eq!(response.source_nodes.len(), 1);
        assert_eq!(response.source_nodes[0].node.title, "Lagos");
    }

    #[tokio::test]
    async fn test_empty_index_answers_without_llm() {
        let llm = Arc::new(MockLlmClient::failing());
        let index = Arc::new(WikiIndex::new(VectorIndex::new()));
        let engine = index
            .as_query_engine(llm.clone(), Arc::new(MockEmbedder::new()), QueryOptions::default())
            .unwrap();

        let response = engine.query("anything").await.unwrap();
        assert_eq!(response.response, NO_CONTEXT_ANSWER);
        assert!(response.source_nodes.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_is_error() {
        let llm = Arc::new(MockLlmClient::failing());
        let engine = engine(llm, QueryOptions::default()).await;
        assert!(matches!(engine.query("capital?").await, Err(QueryError::Llm(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_retrieval_error() {
        let index = VectorIndex::from_nodes(vec![Node::new("1", "Paris", 0, "Paris.", vec![1.0, 0.0])]).unwrap();
        let engine = Arc::new(WikiIndex::new(index))
            .as_query_engine(
                Arc::new(MockLlmClient::failing()),
                Arc::new(MockEmbedder::new()),
                QueryOptions::default(),
            )
            .unwrap();
        assert!(matches!(engine.query("paris").await, Err(QueryError::Retrieval(_))));
    }
}
