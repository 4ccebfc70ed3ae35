//! In-memory [`VectorIndex`] implementation.
//!
//! Documents live in a `BTreeMap` behind `std::sync::RwLock`. Vector search
//! is brute-force cosine similarity over all stored vectors, which is fine
//! for the size of a staff directory.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::{cosine_similarity, embed_batched, embed_query, Embedder};
use crate::models::{IndexedDocument, VectorDocument};

use super::{rank, VectorIndex};

struct StoredVector {
    doc: VectorDocument,
    vector: Vec<f32>,
}

impl StoredVector {
    fn to_indexed(&self, score: Option<f64>) -> IndexedDocument {
        IndexedDocument {
            id: self.doc.id.clone(),
            text: self.doc.text.clone(),
            metadata: self.doc.metadata.clone(),
            score,
        }
    }
}

/// In-memory index, keyed and ordered by document id.
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    docs: RwLock<BTreeMap<String, StoredVector>>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size,
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, StoredVector>>> {
        self.docs
            .read()
            .map_err(|_| anyhow::anyhow!("in-memory index lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoredVector>>> {
        self.docs
            .write()
            .map_err(|_| anyhow::anyhow!("in-memory index lock poisoned"))
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(&self, docs: &[VectorDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        // Embed before taking the lock so a slow provider never blocks readers.
        let vectors = embed_batched(self.embedder.as_ref(), &texts, self.batch_size).await?;

        let mut stored = self.write()?;
        for (doc, vector) in docs.iter().zip(vectors) {
            stored.insert(
                doc.id.clone(),
                StoredVector {
                    doc: doc.clone(),
                    vector,
                },
            );
        }
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut stored = self.write()?;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    async fn get(&self) -> Result<Vec<IndexedDocument>> {
        Ok(self.read()?.values().map(|sv| sv.to_indexed(None)).collect())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<IndexedDocument>> {
        if n_results == 0 || self.read()?.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = embed_query(self.embedder.as_ref(), text).await?;

        let mut hits: Vec<IndexedDocument> = self
            .read()?
            .values()
            .map(|sv| {
                let sim = cosine_similarity(&query_vec, &sv.vector) as f64;
                sv.to_indexed(Some(sim))
            })
            .collect();
        rank(&mut hits, n_results);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
