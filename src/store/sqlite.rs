//! SQLite [`DocumentStore`] backend.
//!
//! Single-file database in WAL mode. Chunk writes run in one transaction,
//! and every reader query joins through `chunks`, so a document only
//! becomes visible once its full chunk batch has committed.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::StorageError;
use crate::models::{
    ContentSource, Document, DocumentText, NewChunk, StorageConfig, StoredChunk,
};

use super::{DocumentStore, StoreStats};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        source TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chunks (
        document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        PRIMARY KEY (document_id, chunk_index)
    )",
    "CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id, created_at)",
];

pub struct SqliteStore {
    pool: SqlitePool,
    dim: usize,
}

impl SqliteStore {
    pub async fn open(config: &StorageConfig, embedding_dim: usize) -> Result<Self, StorageError> {
        let path = config
            .resolve_path()
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        Self::open_path(&path, embedding_dim).await
    }

    pub async fn open_path(path: &Path, embedding_dim: usize) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(storage_err)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(storage_err)?;
        }

        Ok(Self {
            pool,
            dim: embedding_dim,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn health_check(&self) -> Result<bool, StorageError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(storage_err)
    }

    async fn create_document(
        &self,
        owner_id: &str,
        source: ContentSource,
    ) -> Result<Document, StorageError> {
        let document = Document::new(owner_id, source);
        sqlx::query("INSERT INTO documents (id, owner_id, source, created_at) VALUES (?, ?, ?, ?)")
            .bind(&document.id)
            .bind(&document.owner_id)
            .bind(document.source.to_string())
            .bind(&document.created_at)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(document)
    }

    async fn put_chunks(
        &self,
        document_id: &str,
        chunks: Vec<NewChunk>,
    ) -> Result<(), StorageError> {
        if chunks.is_empty() {
            return Err(StorageError::QueryError(
                "refusing to write an empty chunk list".to_string(),
            ));
        }
        for chunk in &chunks {
            if chunk.embedding.len() != self.dim {
                return Err(StorageError::DimensionMismatch {
                    expected: self.dim,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let exists = sqlx::query("SELECT 1 FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;
        if exists.is_none() {
            return Err(StorageError::QueryError(format!(
                "unknown document {document_id}"
            )));
        }

        for (index, chunk) in chunks.into_iter().enumerate() {
            let inserted = sqlx::query(
                "INSERT INTO chunks (document_id, chunk_index, content, embedding) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(document_id)
            .bind(index as i64)
            .bind(&chunk.content)
            .bind(embedding_to_bytes(&chunk.embedding))
            .execute(&mut *tx)
            .await;

            // The dropped transaction rolls back, so nothing of the batch
            // remains visible.
            if inserted.is_err() {
                return Err(StorageError::PartialWrite {
                    document_id: document_id.to_string(),
                });
            }
        }

        tx.commit().await.map_err(|_| StorageError::PartialWrite {
            document_id: document_id.to_string(),
        })?;
        Ok(())
    }

    async fn remove_document(&self, document_id: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)
    }

    async fn chunks_for_owner(&self, owner_id: &str) -> Result<Vec<StoredChunk>, StorageError> {
        let rows = sqlx::query(
            "SELECT c.document_id, c.chunk_index, c.content \
             FROM chunks c JOIN documents d ON d.id = c.document_id \
             WHERE d.owner_id = ? \
             ORDER BY d.created_at ASC, d.id ASC, c.chunk_index ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let document_id: String = row.try_get("document_id").map_err(storage_err)?;
                let chunk_index: i64 = row.try_get("chunk_index").map_err(storage_err)?;
                let content: String = row.try_get("content").map_err(storage_err)?;
                let chunk_index = chunk_index as u32;
                Ok(StoredChunk {
                    id: StoredChunk::chunk_id(&document_id, chunk_index),
                    document_id,
                    chunk_index,
                    content,
                })
            })
            .collect()
    }

    async fn documents_text(
        &self,
        owner_id: &str,
        source: Option<ContentSource>,
    ) -> Result<Vec<DocumentText>, StorageError> {
        let source_filter = source.map(|s| s.to_string());
        let rows = sqlx::query(
            "SELECT d.id, d.source, d.created_at \
             FROM documents d \
             WHERE d.owner_id = ?1 \
               AND (?2 IS NULL OR d.source = ?2) \
               AND EXISTS (SELECT 1 FROM chunks c WHERE c.document_id = d.id) \
             ORDER BY d.created_at ASC, d.id ASC",
        )
        .bind(owner_id)
        .bind(source_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let document_id: String = row.try_get("id").map_err(storage_err)?;
            let source_text: String = row.try_get("source").map_err(storage_err)?;
            let created_at: String = row.try_get("created_at").map_err(storage_err)?;
            let source = source_text
                .parse::<ContentSource>()
                .map_err(StorageError::QueryError)?;

            let chunk_rows = sqlx::query(
                "SELECT content FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC",
            )
            .bind(&document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

            let content = chunk_rows
                .into_iter()
                .map(|r| r.try_get::<String, _>("content").map_err(storage_err))
                .collect::<Result<Vec<_>, _>>()?
                .join("\n");

            out.push(DocumentText {
                document_id,
                source,
                content,
                created_at,
            });
        }
        Ok(out)
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let row = sqlx::query(
            "SELECT COUNT(DISTINCT document_id) AS documents, COUNT(*) AS chunks FROM chunks",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let documents: i64 = row.try_get("documents").map_err(storage_err)?;
        let chunks: i64 = row.try_get("chunks").map_err(storage_err)?;
        Ok(StoreStats {
            documents: documents as u64,
            chunks: chunks as u64,
        })
    }
}

fn storage_err(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StorageError::ConnectionError(err.to_string())
        }
        other => StorageError::QueryError(other.to_string()),
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
fn embedding_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
