use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_VOYAGE_URL: &str = "https://api.voyageai.com";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "voyage-3-lite";
pub const DEFAULT_RERANK_MODEL: &str = "rerank-2-lite";
pub const DEFAULT_GENERATION_MODEL: &str = "claude-3-5-sonnet-20240620";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub reranking: RerankingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mirror").join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingestion.max_chunk_chars == 0 {
            return Err(ConfigError::ValidationError(
                "ingestion.max_chunk_chars must be at least 1".to_string(),
            ));
        }
        if self.chat.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "chat.top_k must be at least 1".to_string(),
            ));
        }
        if self.chat.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_context_chars must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_voyage_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector length produced by `model`; every stored chunk must match.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Overrides the VOYAGE_API_KEY environment variable when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("VOYAGE_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_voyage_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankingConfig {
    #[serde(default = "default_voyage_url")]
    pub url: String,

    #[serde(default = "default_rerank_model")]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Overrides the VOYAGE_API_KEY environment variable when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl RerankingConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("VOYAGE_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

impl Default for RerankingConfig {
    fn default() -> Self {
        Self {
            url: default_voyage_url(),
            model: default_rerank_model(),
            timeout_secs: default_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_anthropic_url")]
    pub url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Overrides the ANTHROPIC_API_KEY environment variable when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl GenerationConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_anthropic_url(),
            model: default_generation_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            api_key: None,
        }
    }
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreDriver {
    #[default]
    Sqlite,
    /// Process-local store; nothing survives exit. Used by tests and as a
    /// scratch mode.
    Memory,
}

impl std::fmt::Display for StoreDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreDriver::Sqlite => write!(f, "sqlite"),
            StoreDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StoreDriver,

    /// Database file for the sqlite driver; defaults to the platform data
    /// directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|p| p.join("mirror").join("mirror.db"))
            .ok_or_else(|| {
                ConfigError::PathError("could not determine data directory".to_string())
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum characters per chunk, bounded by the embedding model's
    /// context window.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many ranked chunks ground an answer.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Character budget for the assembled context block.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_voyage_url() -> String {
    DEFAULT_VOYAGE_URL.to_string()
}

fn default_anthropic_url() -> String {
    DEFAULT_ANTHROPIC_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_rerank_model() -> String {
    DEFAULT_RERANK_MODEL.to_string()
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_dimension() -> usize {
    512
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout() -> u64 {
    30
}

fn default_generation_timeout() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_chunk_chars() -> usize {
    4000
}

fn default_top_k() -> usize {
    5
}

fn default_max_context_chars() -> usize {
    20_000
}
