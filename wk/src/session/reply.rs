//! Replies shown to the user

use std::fmt::Display;

/// Author of every session reply
pub const REPLY_AUTHOR: &str = "Agent";

/// A message from the assistant to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub author: String,
    pub content: String,
    /// Whether this reply reports a failure
    pub is_error: bool,
}

impl Reply {
    fn new(content: impl Into<String>, is_error: bool) -> Self {
        Self {
            author: REPLY_AUTHOR.to_string(),
            content: content.into(),
            is_error,
        }
    }

    /// A normal message
    pub fn message(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    pub fn index_failed(query: &str) -> Self {
        Self::new(
            format!(
                "❌ Failed to create index for '{}'. Please check if the Wikipedia pages exist and try again.",
                query
            ),
            true,
        )
    }

    pub fn agent_failed() -> Self {
        Self::new("❌ Failed to create agent. Please try again.", true)
    }

    pub fn indexed(query: &str, document_count: usize) -> Self {
        Self::new(
            format!(
                "✅ Wikipage(s) '{}' successfully indexed with {} documents. You can now ask questions!",
                query, document_count
            ),
            false,
        )
    }

    pub fn loaded(id: &str, document_count: usize) -> Self {
        Self::new(
            format!(
                "✅ Saved index '{}' loaded with {} documents. You can now ask questions!",
                id, document_count
            ),
            false,
        )
    }

    pub fn setup_error(err: impl Display) -> Self {
        Self::new(format!("❌ Error setting up agent: {}", err), true)
    }

    pub fn agent_unavailable() -> Self {
        Self::new(
            "❌ Agent is not available. Please configure the settings first (select a model and enter Wikipedia pages to index).",
            true,
        )
    }

    pub fn chat_error(err: impl Display) -> Self {
        Self::new(format!("❌ Error processing your message: {}", err), true)
    }
}
