//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the only way the rest of the crate talks to
//! similarity search. Backends own their [`Embedder`](crate::embedding::Embedder)
//! so callers add and query plain text.
//!
//! | Backend | Module | Persistence |
//! |---------|--------|-------------|
//! | `memory` | [`memory`] | none, rebuilt from the profile table at startup |
//! | `sqlite` | [`sqlite`] | `profile_vectors` table via sqlx |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::models::{IndexedDocument, VectorDocument};

pub use memory::InMemoryIndex;
pub use sqlite::SqliteIndex;

/// Similarity-search store keyed by document id.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add`](VectorIndex::add) | Embed and store documents, replacing any with the same id |
/// | [`delete`](VectorIndex::delete) | Remove documents by id; unknown ids are ignored |
/// | [`get`](VectorIndex::get) | Every stored document, ordered by id |
/// | [`query`](VectorIndex::query) | The `n_results` nearest documents to a text |
/// | [`count`](VectorIndex::count) | Number of stored documents |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add(&self, docs: &[VectorDocument]) -> Result<()>;

    async fn delete(&self, ids: &[String]) -> Result<()>;

    async fn get(&self) -> Result<Vec<IndexedDocument>>;

    /// Returns at most `n_results` documents, best match first. Asking for
    /// more than are stored returns all of them.
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<IndexedDocument>>;

    async fn count(&self) -> Result<usize>;

    /// Ids of every stored document, ordered.
    async fn ids(&self) -> Result<Vec<String>> {
        Ok(self.get().await?.into_iter().map(|d| d.id).collect())
    }
}

/// Sort query hits best first, breaking score ties by id so results are
/// deterministic.
pub(crate) fn rank(hits: &mut Vec<IndexedDocument>, n_results: usize) {
    hits.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.partial_cmp(&sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(n_results);
}

/// Open the index backend named in `[index]`.
pub async fn open_index(
    config: &Config,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorIndex>> {
    match config.index.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryIndex::new(
            embedder,
            config.embedding.batch_size,
        ))),
        "sqlite" => {
            let path = config
                .index
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("index.path required for sqlite backend"))?;
            let index = SqliteIndex::open(path, embedder, config.embedding.batch_size).await?;
            Ok(Arc::new(index))
        }
        other => anyhow::bail!("Unknown index backend: {}", other),
    }
}
