//! VectorStore error types

use thiserror::Error;

/// Errors raised by the vector index and the index store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Index not found: {0}")]
    NotFound(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty embedding for node {0}")]
    EmptyEmbedding(String),

    #[error("Corrupt index {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = StoreError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };

        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }
}
