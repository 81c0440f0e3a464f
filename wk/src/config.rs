//! WikiChat configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::query::ResponseMode;

/// Main WikiChat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Chat model configuration
    pub llm: LlmConfig,

    /// Embedding model configuration
    pub embedding: EmbeddingConfig,

    /// Wikipedia reader configuration
    pub wikipedia: WikipediaConfig,

    /// Chunking, retrieval and index storage
    pub index: IndexConfig,

    /// Chat agent configuration
    pub agent: AgentConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider == "gemini" && self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.embedding.provider == "gemini" && self.embedding.api_key().is_none() {
            return Err(eyre::eyre!(
                "Embedding API key not found. Set the {} environment variable.",
                self.embedding.api_key_env
            ));
        }
        if self.llm.models.is_empty() {
            return Err(eyre::eyre!("llm.models must list at least one model"));
        }
        if !self.llm.models.contains(&self.llm.model) {
            return Err(eyre::eyre!(
                "Default model '{}' is not one of the configured models: {}",
                self.llm.model,
                self.llm.models.join(", ")
            ));
        }
        if self.index.chunk_size == 0 || self.index.chunk_overlap >= self.index.chunk_size {
            return Err(eyre::eyre!(
                "index.chunk-overlap ({}) must be smaller than index.chunk-size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            ));
        }
        if self.index.similarity_top_k == 0 {
            return Err(eyre::eyre!("index.similarity-top-k must be at least 1"));
        }
        if self.embedding.batch_size == 0 {
            return Err(eyre::eyre!("embedding.batch-size must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .wikichat.yml
        let local_config = PathBuf::from(".wikichat.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/wikichat/wikichat.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Follows the same lookup chain as [`Config::load`] but never logs.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".wikichat.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wikichat").join("wikichat.yml"))
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gemini" or "openai")
    pub provider: String,

    /// Default model, used for page extraction and answer synthesis
    pub model: String,

    /// Models the user may pick for the chat agent; the first is the initial choice
    pub models: Vec<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-1.0-pro".to_string(),
            ],
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 2048,
            temperature: 0.1,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// The API key from the environment, if set
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.api_key_env)
    }

    /// The same configuration targeting another model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// The model the settings surface starts with
    pub fn initial_model(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or(&self.model)
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name ("gemini" or "openai")
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Environment variable containing the API key (optional for local servers)
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Texts per embedding request
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "text-embedding-004".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            batch_size: 32,
            timeout_ms: 60_000,
        }
    }
}

impl EmbeddingConfig {
    /// The API key from the environment, if set
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.api_key_env)
    }
}

/// Wikipedia reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    /// Wikipedia language edition
    pub language: String,

    /// Override for the wiki base URL (defaults to https://{language}.wikipedia.org)
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            base_url: None,
            user_agent: format!("wikichat/{} (Wikipedia RAG chat)", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30_000,
        }
    }
}

impl WikipediaConfig {
    /// MediaWiki Action API endpoint
    pub fn api_url(&self) -> String {
        let base = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.wikipedia.org", self.language),
        };
        format!("{}/w/api.php", base)
    }
}

/// Chunking, retrieval and index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Chunk size in approximate tokens
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Overlap between chunks in approximate tokens
    #[serde(rename = "chunk-overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    #[serde(rename = "similarity-top-k")]
    pub similarity_top_k: usize,

    /// How retrieved chunks are turned into an answer
    #[serde(rename = "response-mode")]
    pub response_mode: ResponseMode,

    /// Characters of retrieved context per synthesis prompt
    #[serde(rename = "context-window-chars")]
    pub context_window_chars: usize,

    /// Directory for saved indexes
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/wikichat/indexes on Linux)
        let store_dir = dirs::data_dir()
            .map(|d| d.join("wikichat").join("indexes"))
            .unwrap_or_else(|| PathBuf::from(".wikichat/indexes"));

        Self {
            chunk_size: vectorstore::DEFAULT_CHUNK_SIZE,
            chunk_overlap: vectorstore::DEFAULT_CHUNK_OVERLAP,
            similarity_top_k: 10,
            response_mode: ResponseMode::Compact,
            context_window_chars: 12_000,
            store_dir,
        }
    }
}

/// Chat agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model calls per user message
    #[serde(rename = "max-iterations")]
    pub max_iterations: u32,

    /// Completed turns kept in conversation memory
    #[serde(rename = "memory-turns")]
    pub memory_turns: usize,

    /// Max tokens per agent response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            memory_turns: 20,
            max_tokens: 2048,
        }
    }
}
