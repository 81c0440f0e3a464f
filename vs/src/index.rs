//! In-memory vector index with cosine-similarity search

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};

/// A chunk of a source document together with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node ID
    pub id: String,
    /// ID of the source document
    pub doc_id: String,
    /// Title of the source document
    pub title: String,
    /// Position of this chunk within its document
    pub chunk_index: u32,
    /// Chunk text
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl Node {
    /// Create a node with a generated ID
    pub fn new(
        doc_id: impl Into<String>,
        title: impl Into<String>,
        chunk_index: u32,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            doc_id: doc_id.into(),
            title: title.into(),
            chunk_index,
            text: text.into(),
            embedding,
        }
    }
}

/// A search hit
#[derive(Debug, Clone)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f32,
}

/// Vector index over nodes of a single embedding dimension
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    nodes: Vec<Node>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from existing nodes
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        let mut index = Self::new();
        for node in nodes {
            index.insert(node)?;
        }
        Ok(index)
    }

    /// Add a node; its embedding must match the dimension of earlier nodes
    pub fn insert(&mut self, node: Node) -> Result<()> {
        if node.embedding.is_empty() {
            return Err(StoreError::EmptyEmbedding(node.id));
        }
        match self.dimensions {
            Some(expected) if expected != node.embedding.len() => {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: node.embedding.len(),
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(node.embedding.len()),
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Number of nodes in the index
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Embedding dimension, if any node has been inserted
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Distinct document IDs in insertion order
    pub fn document_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .filter(|n| seen.insert(n.doc_id.as_str()))
            .map(|n| n.doc_id.as_str())
            .collect()
    }

    /// Distinct document titles in insertion order
    pub fn document_titles(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .filter(|n| seen.insert(n.doc_id.as_str()))
            .map(|n| n.title.clone())
            .collect()
    }

    /// The `k` nodes most similar to `query`, best first
    ///
    /// Ties keep insertion order.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredNode>> {
        debug!(query_dims = query.len(), k, node_count = self.nodes.len(), "top_k: called");
        if let Some(expected) = self.dimensions
            && expected != query.len()
        {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, cosine_similarity(query, &n.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredNode {
                node: self.nodes[i].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity of two vectors; 0.0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
