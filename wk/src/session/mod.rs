//! Session controller
//!
//! Owns the state of one chat session: the current settings and, once a
//! request has been indexed, the index with its agent. A settings update runs
//! extraction, loading, indexing and agent creation; the active index is only
//! replaced when every step succeeds.

mod reply;

pub use reply::{REPLY_AUTHOR, Reply};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vectorstore::ChunkOptions;

use crate::agent::{Agent, AgentError, AgentOptions, create_agent};
use crate::config::Config;
use crate::embed::{Embedder, create_embedder};
use crate::extract::PageListExtractor;
use crate::index::{WikiIndex, build_index};
use crate::llm::{ClientFactory, LlmClient, create_client};
use crate::query::QueryOptions;
use crate::wikipedia::{DocumentLoader, WikipediaReader};

/// User-chosen settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Model driving the chat agent
    pub model: String,
    /// Free-text request naming the pages to index
    pub page_request: String,
}

/// The index the session is currently chatting over
pub struct ActiveIndex {
    pub index: Arc<WikiIndex>,
    pub agent: Agent,
    /// Request or saved index ID this index came from
    pub source: String,
}

/// Why a setup attempt failed
enum SetupFailure {
    Index(String),
    Agent(String),
    Unexpected(String),
}

/// Collaborators a session is built from
pub struct SessionParts {
    /// Model used for extraction and answer synthesis
    pub default_llm: Arc<dyn LlmClient>,
    /// Creates the agent's client for the selected model
    pub clients: Arc<dyn ClientFactory>,
    pub loader: Arc<dyn DocumentLoader>,
    pub embedder: Arc<dyn Embedder>,
}

pub struct Session {
    parts: SessionParts,
    extractor: PageListExtractor,
    models: Vec<String>,
    model: String,
    page_request: Option<String>,
    chunking: ChunkOptions,
    query_options: QueryOptions,
    agent_options: AgentOptions,
    active: Option<ActiveIndex>,
}

impl Session {
    pub fn new(parts: SessionParts, config: &Config) -> Self {
        debug!(models = ?config.llm.models, "Session::new: called");
        Self {
            parts,
            extractor: PageListExtractor::new(),
            models: config.llm.models.clone(),
            model: config.llm.initial_model().to_string(),
            page_request: None,
            chunking: ChunkOptions::from(&config.index),
            query_options: QueryOptions::from(&config.index),
            agent_options: AgentOptions::from(&config.agent),
            active: None,
        }
    }

    /// Build a session with the configured providers
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        let default_llm = create_client(&config.llm)?;
        let embedder = create_embedder(&config.embedding)?;
        let loader = WikipediaReader::from_config(&config.wikipedia)?;

        let parts = SessionParts {
            default_llm,
            clients: Arc::new(config.llm.clone()),
            loader: Arc::new(loader),
            embedder,
        };
        Ok(Self::new(parts, config))
    }

    /// Selectable models
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Currently selected model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Last page request, if any
    pub fn page_request(&self) -> Option<&str> {
        self.page_request.as_deref()
    }

    pub fn active(&self) -> Option<&ActiveIndex> {
        self.active.as_ref()
    }

    /// Apply new settings: extract, load, index and create the agent
    pub async fn update_settings(&mut self, settings: Settings) -> Reply {
        info!(model = %settings.model, request = %settings.page_request, "Updating settings");
        if !self.models.contains(&settings.model) {
            return Reply::setup_error(format!(
                "unknown model '{}' (available: {})",
                settings.model,
                self.models.join(", ")
            ));
        }
        let Settings { model, page_request: query } = settings;
        match self.setup(&query, &model).await {
            Ok(active) => {
                let count = active.index.document_count();
                self.model = model;
                self.page_request = Some(query.clone());
                self.active = Some(active);
                Reply::indexed(&query, count)
            }
            Err(SetupFailure::Index(reason)) => {
                warn!(%query, %reason, "Failed to create index");
                Reply::index_failed(&query)
            }
            Err(SetupFailure::Agent(reason)) => {
                warn!(%reason, "Failed to create agent");
                Reply::agent_failed()
            }
            Err(SetupFailure::Unexpected(reason)) => {
                warn!(%reason, "Error setting up agent");
                Reply::setup_error(reason)
            }
        }
    }

    /// Switch the agent model, re-running setup when pages were requested
    pub async fn select_model(&mut self, model: &str) -> Reply {
        debug!(%model, "Session::select_model: called");
        match self.page_request.clone() {
            Some(page_request) => {
                self.update_settings(Settings {
                    model: model.to_string(),
                    page_request,
                })
                .await
            }
            None if self.models.iter().any(|m| m == model) => {
                self.model = model.to_string();
                Reply::message(format!("Model set to {}.", model))
            }
            None => Reply::setup_error(format!(
                "unknown model '{}' (available: {})",
                model,
                self.models.join(", ")
            )),
        }
    }

    /// Chat over a previously saved index
    pub async fn load_index(&mut self, index: WikiIndex) -> Reply {
        let index = Arc::new(index);
        let source = index.id().unwrap_or("unsaved").to_string();
        info!(%source, node_count = index.document_count(), "Loading saved index");

        match self.agent_for(index.clone(), &self.model).await {
            Ok(agent) => {
                let count = index.document_count();
                self.active = Some(ActiveIndex {
                    index,
                    agent,
                    source: source.clone(),
                });
                Reply::loaded(&source, count)
            }
            Err(SetupFailure::Agent(reason)) | Err(SetupFailure::Index(reason)) => {
                warn!(%reason, "Failed to create agent");
                Reply::agent_failed()
            }
            Err(SetupFailure::Unexpected(reason)) => Reply::setup_error(reason),
        }
    }

    /// Relay a chat message to the agent
    pub async fn handle_message(&mut self, text: &str) -> Reply {
        debug!(message_len = text.len(), "Session::handle_message: called");
        let Some(active) = self.active.as_mut() else {
            debug!("handle_message: agent is not available");
            return Reply::agent_unavailable();
        };

        match active.agent.chat(text).await {
            Ok(response) => Reply::message(response.response),
            Err(e) => {
                warn!(error = %e, "Error in agent chat");
                Reply::chat_error(e)
            }
        }
    }

    /// Clear the agent's conversation memory; false when there is no agent
    pub fn reset_memory(&mut self) -> bool {
        match self.active.as_mut() {
            Some(active) => {
                active.agent.reset();
                true
            }
            None => false,
        }
    }

    async fn setup(&self, query: &str, model: &str) -> Result<ActiveIndex, SetupFailure> {
        let pages = self.extractor.extract(self.parts.default_llm.as_ref(), query).await;
        if pages.is_empty() {
            return Err(SetupFailure::Index("no Wikipedia pages found in request".to_string()));
        }

        let documents = self
            .parts
            .loader
            .load(pages.as_slice())
            .await
            .map_err(|e| SetupFailure::Index(format!("loading documents: {}", e)))?;
        if documents.is_empty() {
            return Err(SetupFailure::Index("no documents loaded".to_string()));
        }

        let index = build_index(&documents, self.parts.embedder.as_ref(), &self.chunking)
            .await
            .map_err(|e| SetupFailure::Index(e.to_string()))?;
        let index = Arc::new(index);

        let agent = self.agent_for(index.clone(), model).await?;
        Ok(ActiveIndex {
            index,
            agent,
            source: query.to_string(),
        })
    }

    async fn agent_for(&self, index: Arc<WikiIndex>, model: &str) -> Result<Agent, SetupFailure> {
        let agent_llm = self
            .parts
            .clients
            .client_for(model)
            .map_err(|e| SetupFailure::Agent(e.to_string()))?;

        create_agent(
            index,
            agent_llm,
            self.parts.default_llm.clone(),
            self.parts.embedder.clone(),
            self.query_options,
            self.agent_options,
        )
        .await
        .map_err(|e| match e {
            AgentError::ModelCheck(_) | AgentError::Llm(_) => SetupFailure::Agent(e.to_string()),
            other => SetupFailure::Unexpected(other.to_string()),
        })
    }
}
