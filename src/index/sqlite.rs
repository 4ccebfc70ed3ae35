//! SQLite-backed [`VectorIndex`] implementation.
//!
//! Each document is one row of `profile_vectors` holding the rendered text,
//! the metadata columns, and the embedding as a little-endian `f32` BLOB.
//! Queries load every vector and rank by cosine similarity in Rust, the same
//! brute-force approach as the in-memory backend.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::embedding::{
    blob_to_vec, cosine_similarity, embed_batched, embed_query, vec_to_blob, Embedder,
};
use crate::migrate;
use crate::models::{DocumentMetadata, IndexedDocument, VectorDocument};

use super::{rank, VectorIndex};

pub struct SqliteIndex {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl SqliteIndex {
    /// Open (creating if needed) the index database at `path`.
    pub async fn open(path: &Path, embedder: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        // WAL lets `get`/`query` read while a rebuild transaction is open.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open index database: {}", path.display()))?;
        migrate::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            embedder,
            batch_size,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow, score: Option<f64>) -> IndexedDocument {
    IndexedDocument {
        id: row.get("id"),
        text: row.get("document"),
        metadata: DocumentMetadata {
            name: row.get("name"),
            email: row.get("email"),
        },
        score,
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn add(&self, docs: &[VectorDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let vectors = embed_batched(self.embedder.as_ref(), &texts, self.batch_size).await?;
        let model = self.embedder.model_name().to_string();

        let mut tx = self.pool.begin().await?;
        for (doc, vector) in docs.iter().zip(vectors.iter()) {
            sqlx::query(
                r#"
                INSERT INTO profile_vectors (id, document, name, email, vector, model, dims)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    document = excluded.document,
                    name = excluded.name,
                    email = excluded.email,
                    vector = excluded.vector,
                    model = excluded.model,
                    dims = excluded.dims
                "#,
            )
            .bind(&doc.id)
            .bind(&doc.text)
            .bind(&doc.metadata.name)
            .bind(&doc.metadata.email)
            .bind(vec_to_blob(vector))
            .bind(&model)
            .bind(vector.len() as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM profile_vectors WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self) -> Result<Vec<IndexedDocument>> {
        let rows = sqlx::query("SELECT id, document, name, email FROM profile_vectors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row_to_document(row, None)).collect())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<IndexedDocument>> {
        if n_results == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }
        let query_vec = embed_query(self.embedder.as_ref(), text).await?;

        let rows = sqlx::query("SELECT id, document, name, email, vector FROM profile_vectors")
            .fetch_all(&self.pool)
            .await?;

        let mut hits: Vec<IndexedDocument> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("vector");
                let sim = cosine_similarity(&query_vec, &blob_to_vec(&blob)) as f64;
                row_to_document(row, Some(sim))
            })
            .collect();
        rank(&mut hits, n_results);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile_vectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}
