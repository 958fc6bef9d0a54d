//! Error types for the mirror pipeline.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors from the embedding capability.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("no embedding API key configured (set VOYAGE_API_KEY)")]
    MissingApiKey,

    #[error("failed to reach embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding request timed out")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError(msg) => is_transient_status(msg),
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::MissingApiKey | EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors from the reranking capability.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("no rerank API key configured (set VOYAGE_API_KEY)")]
    MissingApiKey,

    #[error("invalid rerank request: {0}")]
    InvalidRequest(String),

    #[error("failed to reach rerank service: {0}")]
    ConnectionError(String),

    #[error("rerank service error: {0}")]
    ServerError(String),

    #[error("rerank request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid rerank response: {0}")]
    InvalidResponse(String),

    #[error("rerank request timed out")]
    Timeout,
}

impl Retryable for RankingError {
    fn is_retryable(&self) -> bool {
        match self {
            RankingError::ConnectionError(_) | RankingError::Timeout => true,
            RankingError::ServerError(msg) => is_transient_status(msg),
            RankingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            RankingError::MissingApiKey
            | RankingError::InvalidRequest(_)
            | RankingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors from the answer-generation capability.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no generation API key configured (set ANTHROPIC_API_KEY)")]
    MissingApiKey,

    #[error("failed to reach generation service: {0}")]
    ConnectionError(String),

    #[error("generation service error: {0}")]
    ServerError(String),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation request timed out")]
    Timeout,
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ConnectionError(_) | GenerationError::Timeout => true,
            GenerationError::ServerError(msg) => is_transient_status(msg),
            GenerationError::RequestError(e) => e.is_timeout() || e.is_connect(),
            GenerationError::MissingApiKey | GenerationError::InvalidResponse(_) => false,
        }
    }
}

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("store query failed: {0}")]
    QueryError(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("partial chunk write for document {document_id}; document rolled back")]
    PartialWrite { document_id: String },
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            StorageError::ConnectionError(_) => true,
            // A partial write means the document must be treated as failed,
            // never blindly re-attempted on top of whatever landed.
            StorageError::QueryError(_)
            | StorageError::DimensionMismatch { .. }
            | StorageError::PartialWrite { .. } => false,
        }
    }
}

/// Errors surfaced by `Pipeline::ingest`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors surfaced by `Pipeline::respond`.
///
/// Retrieval-side failures never appear here; they degrade the answer to
/// ungrounded generation instead.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Other(String),
}

/// Status-sniffing shared by the capability errors: the service clients
/// report HTTP failures as formatted "status NNN: body" strings.
fn is_transient_status(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("502")
        || msg.contains("503")
        || msg.contains("504")
        || msg.contains("429")
        || msg.contains("unavailable")
        || msg.contains("overloaded")
        || msg.contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(EmbeddingError::ConnectionError("refused".into()).is_retryable());
        assert!(RankingError::Timeout.is_retryable());
        assert!(StorageError::ConnectionError("refused".into()).is_retryable());
    }

    #[test]
    fn test_rejections_are_not_retryable() {
        assert!(!EmbeddingError::MissingApiKey.is_retryable());
        assert!(!EmbeddingError::InvalidResponse("bad json".into()).is_retryable());
        assert!(
            !StorageError::PartialWrite {
                document_id: "d1".into()
            }
            .is_retryable()
        );
        assert!(
            !StorageError::DimensionMismatch {
                expected: 512,
                actual: 3
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_transient_server_errors() {
        assert!(EmbeddingError::ServerError("status 503: unavailable".into()).is_retryable());
        assert!(
            GenerationError::ServerError("status 429: too many requests".into()).is_retryable()
        );
        assert!(!EmbeddingError::ServerError("status 400: bad request".into()).is_retryable());
    }
}
