//! Keeps the vector index a mirror of the profile table.
//!
//! Every rebuild deletes every indexed id and re-adds one
//! [`VectorDocument`] per table row. There is no diffing: the cost is O(N)
//! per edit and in exchange the index can never drift from the table once
//! a rebuild has succeeded.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::VectorIndex;
use crate::models::VectorDocument;
use crate::profiles::ProfileTable;

pub struct ProfileSynchronizer {
    index: Arc<dyn VectorIndex>,
}

impl ProfileSynchronizer {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Replace the whole index contents with the image of `table`.
    ///
    /// Returns the number of documents indexed.
    pub async fn rebuild(&self, table: &ProfileTable) -> Result<usize> {
        let existing = self
            .index
            .ids()
            .await
            .context("listing indexed documents")?;
        if !existing.is_empty() {
            self.index
                .delete(&existing)
                .await
                .context("clearing indexed documents")?;
        }

        let docs: Vec<VectorDocument> = table
            .rows()
            .iter()
            .map(VectorDocument::from_record)
            .collect();
        self.index
            .add(&docs)
            .await
            .context("indexing profile documents")?;

        tracing::info!(
            removed = existing.len(),
            indexed = docs.len(),
            "rebuilt profile index"
        );
        Ok(docs.len())
    }

    /// Whether the indexed id set equals the table's email set.
    pub async fn is_in_sync(&self, table: &ProfileTable) -> Result<bool> {
        let indexed: Vec<String> = self.index.ids().await?;
        let indexed_set: BTreeSet<&str> = indexed.iter().map(String::as_str).collect();
        let emails: BTreeSet<&str> = table.rows().iter().map(|r| r.email.as_str()).collect();
        Ok(indexed.len() == indexed_set.len() && indexed_set == emails)
    }
}
