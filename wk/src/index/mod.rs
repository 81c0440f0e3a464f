//! Building, saving and loading the Wikipedia vector index

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use vectorstore::{ChunkOptions, IndexManifest, IndexStore, Node, StoreError, VectorIndex, split_text};

use crate::config::IndexConfig;
use crate::embed::Embedder;
use crate::llm::{LlmClient, LlmError};
use crate::query::{QueryEngine, QueryError, QueryOptions};
use crate::wikipedia::Document;

/// Errors from building or persisting an index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Nothing to index: no documents or no text")]
    Empty,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("Index store error: {0}")]
    Store(#[from] StoreError),
}

/// Chunking options from configuration
impl From<&IndexConfig> for ChunkOptions {
    fn from(config: &IndexConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// A searchable index over loaded Wikipedia pages
#[derive(Debug, Clone)]
pub struct WikiIndex {
    index: VectorIndex,
    /// Store ID once saved or when loaded from a store
    id: Option<String>,
}

impl WikiIndex {
    pub fn new(index: VectorIndex) -> Self {
        Self { index, id: None }
    }

    /// Number of indexed nodes (chunks)
    ///
    /// This is the count reported to users after indexing.
    pub fn document_count(&self) -> usize {
        self.index.len()
    }

    /// Number of source pages
    pub fn page_count(&self) -> usize {
        self.index.document_ids().len()
    }

    /// Titles of the source pages in indexing order
    pub fn page_titles(&self) -> Vec<String> {
        self.index.document_titles()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn vector_index(&self) -> &VectorIndex {
        &self.index
    }

    /// A query engine answering questions over this index
    pub fn as_query_engine(
        self: Arc<Self>,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
        options: QueryOptions,
    ) -> Result<QueryEngine, QueryError> {
        QueryEngine::new(self, llm, embedder, options)
    }

    /// Save to `store`, remembering the assigned ID
    pub fn save(&mut self, store: &IndexStore, label: Option<&str>) -> Result<IndexManifest, IndexError> {
        debug!(?label, node_count = self.index.len(), "WikiIndex::save: called");
        let manifest = store.save(&self.index, label)?;
        self.id = Some(manifest.id.clone());
        Ok(manifest)
    }

    /// Load a saved index by ID
    pub fn load(store: &IndexStore, id: &str) -> Result<(IndexManifest, Self), IndexError> {
        debug!(%id, "WikiIndex::load: called");
        let (manifest, index) = store.load(id)?;
        if index.is_empty() {
            return Err(IndexError::Empty);
        }
        Ok((
            manifest,
            Self {
                index,
                id: Some(id.to_string()),
            },
        ))
    }
}

/// Chunk, embed and index `documents`
pub async fn build_index(
    documents: &[Document],
    embedder: &dyn Embedder,
    options: &ChunkOptions,
) -> Result<WikiIndex, IndexError> {
    debug!(document_count = documents.len(), ?options, "build_index: called");
    if documents.is_empty() {
        return Err(IndexError::Empty);
    }

    // (document, chunk position, chunk text)
    let mut chunks: Vec<(&Document, u32, String)> = Vec::new();
    for doc in documents {
        let pieces = split_text(&doc.text, options);
        debug!(title = %doc.title, chunk_count = pieces.len(), "build_index: split document");
        chunks.extend(pieces.into_iter().enumerate().map(|(i, text)| (doc, i as u32, text)));
    }
    if chunks.is_empty() {
        return Err(IndexError::Empty);
    }

    let texts: Vec<String> = chunks.iter().map(|(_, _, text)| text.clone()).collect();
    let embeddings = embedder.embed(&texts).await?;

    let nodes = chunks
        .into_iter()
        .zip(embeddings)
        .map(|((doc, position, text), embedding)| Node::new(&doc.id, &doc.title, position, text, embedding));
    let index = VectorIndex::from_nodes(nodes)?;

    info!(
        node_count = index.len(),
        page_count = documents.len(),
        "Index created with {} nodes",
        index.len()
    );
    Ok(WikiIndex::new(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::mock::{MOCK_DIMENSIONS, MockEmbedder};
    use tempfile::TempDir;

    fn doc(id: &str, title: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://en.wikipedia.org/wiki/{}", title),
            text: text.to_string(),
        }
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {} talks about the city and its long history.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_build_index_counts_nodes() {
        let docs = vec![
            doc("1", "Paris", &long_text(40)),
            doc("2", "Lagos", "Lagos is the largest city in Nigeria."),
        ];
        let embedder = MockEmbedder::new();
        let index = build_index(&docs, &embedder, &ChunkOptions::default()).await.unwrap();

        assert!(index.document_count() > 2);
        assert_eq!(index.page_count(), 2);
        assert_eq!(index.page_titles(), vec!["Paris", "Lagos"]);
        assert_eq!(index.vector_index().dimensions(), Some(MOCK_DIMENSIONS));
        assert!(index.id().is_none());
    }

    #[tokio::test]
    async fn test_chunk_positions_restart_per_document() {
        let docs = vec![doc("1", "Paris", &long_text(30)), doc("2", "Lagos", &long_text(30))];
        let index = build_index(&docs, &MockEmbedder::new(), &ChunkOptions::default())
            .await
            .unwrap();

        let lagos_first = index
            .vector_index()
            .nodes()
            .iter()
            .find(|n| n.doc_id == "2")
            .unwrap();
        assert_eq!(lagos_first.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_build_index_rejects_empty_input() {
        let embedder = MockEmbedder::new();
        assert!(matches!(
            build_index(&[], &embedder, &ChunkOptions::default()).await,
            Err(IndexError::Empty)
        ));
        assert!(matches!(
            build_index(&[doc("1", "Blank", "   ")], &embedder, &ChunkOptions::default()).await,
            Err(IndexError::Empty)
        ));
        assert_eq!(embedder.batches(), 0);
    }

    #[tokio::test]
    async fn test_build_index_propagates_embedding_failure() {
        let result = build_index(
            &[doc("1", "Paris", "Paris is in France.")],
            &MockEmbedder::failing(),
            &ChunkOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::open(temp.path()).unwrap();
        let mut index = build_index(
            &[doc("1", "Paris", &long_text(10))],
            &MockEmbedder::new(),
            &ChunkOptions::default(),
        )
        .await
        .unwrap();

        let manifest = index.save(&store, Some("please index: paris")).unwrap();
        assert_eq!(index.id(), Some(manifest.id.as_str()));

        let (loaded_manifest, loaded) = WikiIndex::load(&store, &manifest.id).unwrap();
        assert_eq!(loaded_manifest.label.as_deref(), Some("please index: paris"));
        assert_eq!(loaded.document_count(), index.document_count());
        assert_eq!(loaded.id(), Some(manifest.id.as_str()));
    }

    #[test]
    fn test_chunk_options_from_config() {
        let config = IndexConfig {
            chunk_size: 64,
            chunk_overlap: 8,
            ..IndexConfig::default()
        };
        let options = ChunkOptions::from(&config);
        assert_eq!(options.chunk_size, 64);
        assert_eq!(options.chunk_overlap, 8);
    }
}
