//! Page-List Extractor
//!
//! Turns a free-text request such as `"please index: paris, lagos, lao"` into
//! an ordered list of Wikipedia page titles. The model is asked for a list
//! literal first; its reply is then parsed by an ordered chain of strategies
//! (see [`Strategy`]), and when every reply-based strategy misses the request
//! itself is split after the trigger phrase.
//!
//! Extraction never fails outward: a failed model call or an unparseable
//! reply only advances the chain, and the worst case is an empty list.

mod literal;
mod strategy;

pub use literal::{LiteralError, parse_list_literal};
pub use strategy::{Miss, Outcome, Strategy, TRIGGER_PHRASE, run_chain};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::llm::LlmClient;
use crate::prompts::Prompts;

/// Max tokens requested for the extraction reply
const EXTRACT_MAX_TOKENS: u32 = 512;

/// Ordered page titles requested by the user
///
/// Every element is trimmed and non-empty. Duplicates and order are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageList(Vec<String>);

impl PageList {
    /// Build a list, trimming each title and dropping empty ones
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            pages
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PageList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extracts page lists with a model, falling back to plain text parsing
pub struct PageListExtractor {
    prompts: Option<Prompts>,
}

impl PageListExtractor {
    pub fn new() -> Self {
        debug!("PageListExtractor::new: called");
        let prompts = match Prompts::new() {
            Ok(p) => Some(p),
            Err(e) => {
                // Without a prompt the model tier always misses
                warn!(error = %e, "PageListExtractor::new: prompt templates unavailable");
                None
            }
        };
        Self { prompts }
    }

    /// Extract the requested pages from `request`
    pub async fn extract(&self, llm: &dyn LlmClient, request: &str) -> PageList {
        debug!(request_len = request.len(), model = %llm.model(), "PageListExtractor::extract: called");
        let lowered = request.to_lowercase();

        let reply = self.ask_model(llm, &lowered).await;
        let (strategy, pages) = run_chain(&lowered, reply.as_deref());

        match strategy {
            Some(s) => info!(strategy = %s, pages = ?pages.as_slice(), "Extracted page list"),
            None => info!("No pages found in request"),
        }
        pages
    }

    async fn ask_model(&self, llm: &dyn LlmClient, lowered: &str) -> Option<String> {
        let prompts = self.prompts.as_ref()?;
        let prompt = match prompts.render("extract", &serde_json::json!({ "query": lowered })) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "ask_model: failed to render extraction prompt");
                return None;
            }
        };

        match llm.complete_text(&prompt, EXTRACT_MAX_TOKENS).await {
            Ok(text) => {
                debug!(reply = %text, "ask_model: model replied");
                Some(text)
            }
            Err(e) => {
                warn!(error = %e, "ask_model: model call failed, falling back to text parsing");
                None
            }
        }
    }
}

impl Default for PageListExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the requested pages from `request` with `llm`
pub async fn extract_page_list(llm: &dyn LlmClient, request: &str) -> PageList {
    PageListExtractor::new().extract(llm, request).await
}
