//! VectorStore - chunking, similarity search and persistence for embedded text
//!
//! Holds the retrieval side of a RAG pipeline: text is split into
//! sentence-aware overlapping chunks, each chunk is stored with its embedding
//! in a [`VectorIndex`], and whole indexes can be saved to an [`IndexStore`].
//!
//! # Architecture
//!
//! ```text
//! {store}/
//! └── {index_id}/
//!     ├── manifest.json   # id, label, dimensions, node count, document titles
//!     └── nodes.jsonl     # one node (text + embedding) per line
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vectorstore::{ChunkOptions, IndexStore, Node, VectorIndex, split_text};
//!
//! let chunks = split_text(&article, &ChunkOptions::default());
//! let mut index = VectorIndex::new();
//! index.insert(Node::new("paris", "Paris", 0, chunks[0].clone(), embedding))?;
//! let hits = index.top_k(&query_embedding, 10)?;
//!
//! let store = IndexStore::open(".wikichat/indexes")?;
//! let manifest = store.save(&index, Some("paris"))?;
//! ```

pub mod chunker;
mod error;
mod index;
mod store;

pub use chunker::{ChunkOptions, count_tokens, split_text};
pub use error::{Result, StoreError};
pub use index::{Node, ScoredNode, VectorIndex, cosine_similarity};
pub use store::{IndexId, IndexManifest, IndexStats, IndexStore};

/// Default chunk size in approximate tokens
pub const DEFAULT_CHUNK_SIZE: usize = 150;

/// Default overlap between adjacent chunks in approximate tokens
pub const DEFAULT_CHUNK_OVERLAP: usize = 45;
