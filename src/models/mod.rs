mod candidate;
mod config;
mod document;
mod source;

pub use candidate::{Candidate, RankedCandidate};
pub use config::{
    ChatConfig, Config, DEFAULT_ANTHROPIC_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
    DEFAULT_RERANK_MODEL, DEFAULT_VOYAGE_URL, EmbeddingConfig, GenerationConfig, IngestionConfig,
    RerankingConfig, StorageConfig, StoreDriver,
};
pub use document::{Document, DocumentText, NewChunk, StoredChunk};
pub use source::ContentSource;
