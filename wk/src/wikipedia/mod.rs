//! Document loading from Wikipedia
//!
//! [`DocumentLoader`] is the seam the session loads pages through;
//! [`WikipediaReader`] implements it against the MediaWiki Action API.

mod reader;

pub use reader::WikipediaReader;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One loaded Wikipedia page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (the MediaWiki page id)
    pub id: String,
    /// Canonical page title
    pub title: String,
    pub url: String,
    /// Plain-text page content
    pub text: String,
}

/// Errors from fetching pages
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Wikipedia API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Wikipedia API error {code}: {info}")]
    Query { code: String, info: String },

    #[error("Invalid Wikipedia response: {0}")]
    InvalidResponse(String),
}

/// Loads documents for a list of page names
///
/// Pages that cannot be resolved are skipped; the returned documents keep
/// the order of `pages`.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, pages: &[String]) -> Result<Vec<Document>, LoaderError>;
}
