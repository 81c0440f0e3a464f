//! WikiChat - retrieval-augmented chat over Wikipedia pages
//!
//! The user names Wikipedia pages in free text ("please index: Paris,
//! Lagos"). WikiChat extracts the page names, fetches the articles, chunks and
//! embeds them into a vector index, and hands a tool-calling agent a
//! `Wikipedia` tool that answers questions from that index.
//!
//! # Flow
//!
//! ```text
//! request ──► extract ──► wikipedia ──► index ──► query ──► tools ──► agent
//!                                         │
//!                                  vectorstore (save/load)
//! ```
//!
//! # Modules
//!
//! - [`extract`] - Page-list extraction with a three-step fallback chain
//! - [`wikipedia`] - Document loader backed by the MediaWiki API
//! - [`embed`] - Embedding clients
//! - [`index`] - Building and persisting the vector index
//! - [`query`] - Retrieval and answer synthesis
//! - [`agent`] - Tool-calling chat agent
//! - [`session`] - Settings updates and chat replies
//! - [`repl`] - Interactive terminal chat
//! - [`llm`] - LLM client trait and provider implementations
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod embed;
pub mod extract;
pub mod index;
pub mod llm;
pub mod prompts;
pub mod query;
pub mod repl;
pub mod session;
pub mod tools;
pub mod wikipedia;

// Re-export commonly used types
pub use agent::{Agent, AgentError, AgentOptions, AgentResponse, create_agent};
pub use config::{Config, LlmConfig};
pub use embed::{Embedder, create_embedder};
pub use extract::{PageList, PageListExtractor, extract_page_list};
pub use index::{IndexError, WikiIndex, build_index};
pub use llm::{ClientFactory, CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use query::{QueryEngine, QueryOptions, QueryResponse, ResponseMode};
pub use session::{Reply, Session, SessionParts, Settings};
pub use tools::{QueryEngineTool, Tool, ToolExecutor, ToolResult};
pub use wikipedia::{Document, DocumentLoader, LoaderError, WikipediaReader};
