//! The synchronized people-finder store.
//!
//! [`PeopleFinder`] owns the profile table, its CSV file, the vector index,
//! and the search pipeline. All access goes through one
//! `tokio::sync::RwLock`:
//!
//! - [`upsert`](PeopleFinder::upsert) and [`reindex`](PeopleFinder::reindex)
//!   take the write lock, so only one mutation is in flight and no search
//!   ever sees a half-rebuilt index.
//! - [`search`](PeopleFinder::search) and the listing methods take the read
//!   lock and run concurrently with each other.
//!
//! Consistency is best-effort: the CSV write is the commit point. If the
//! index rebuild that follows fails, the failure is logged and reported in
//! [`UpsertOutcome::index_synced`], and the next successful mutation (or an
//! explicit reindex) brings the index back in line.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::error::FinderError;
use crate::explain::RelevanceExplainer;
use crate::index::{open_index, VectorIndex};
use crate::models::{IndexedDocument, ProfileInput, ProfileRecord};
use crate::profiles::{load_table, save_table, ProfileTable};
use crate::reasoning::create_reasoner;
use crate::search::{SearchOutcome, SearchService};
use crate::sync::ProfileSynchronizer;

/// Result of a successful upsert.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub message: String,
    pub profile: ProfileRecord,
    /// `false` when the table was saved but the index rebuild failed.
    pub index_synced: bool,
}

pub struct PeopleFinder {
    profiles_path: PathBuf,
    table: RwLock<ProfileTable>,
    index: Arc<dyn VectorIndex>,
    sync: ProfileSynchronizer,
    search: SearchService,
}

impl PeopleFinder {
    /// Build a finder from configuration: embedder, index backend, and
    /// reasoner are all chosen from the config file.
    pub async fn open(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let index = open_index(config, embedder).await?;
        let reasoner = create_reasoner(&config.reasoning)?;
        let explainer = RelevanceExplainer::new(reasoner, &config.reasoning);
        Self::with_components(&config.profiles.path, index, explainer).await
    }

    /// Build a finder from already-constructed capabilities.
    ///
    /// Loads the table (creating the CSV if needed) and rebuilds the index
    /// from it. A failed rebuild is logged and does not prevent startup.
    pub async fn with_components(
        profiles_path: &Path,
        index: Arc<dyn VectorIndex>,
        explainer: RelevanceExplainer,
    ) -> Result<Self> {
        let table = load_table(profiles_path)?;
        tracing::info!(
            path = %profiles_path.display(),
            profiles = table.len(),
            "loaded profile table"
        );

        let sync = ProfileSynchronizer::new(index.clone());
        if let Err(e) = sync.rebuild(&table).await {
            tracing::warn!(error = %format!("{:#}", e), "initial index build failed");
        }

        Ok(Self {
            profiles_path: profiles_path.to_path_buf(),
            table: RwLock::new(table),
            search: SearchService::new(index.clone(), explainer),
            index,
            sync,
        })
    }

    /// Create or update a profile, persist the table, and rebuild the index.
    pub async fn upsert(&self, input: &ProfileInput) -> Result<UpsertOutcome, FinderError> {
        let mut table = self.table.write().await;

        let previous = table.clone();
        let upserted = table.upsert(input)?;

        if let Err(e) = save_table(&self.profiles_path, &table) {
            *table = previous;
            return Err(FinderError::Persistence(e));
        }

        let index_synced = match self.sync.rebuild(&table).await {
            Ok(_) => true,
            Err(e) => {
                let err = FinderError::SyncFailure(e);
                tracing::warn!(
                    email = %upserted.record.email,
                    error = %err,
                    "profile saved but index is stale"
                );
                false
            }
        };

        tracing::info!(email = %upserted.record.email, kind = ?upserted.kind, "profile upserted");

        Ok(UpsertOutcome {
            message: upserted.message(),
            profile: upserted.record,
            index_synced,
        })
    }

    /// Explained search over the indexed profiles.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome, FinderError> {
        let _table = self.table.read().await;
        self.search.search(query, top_k).await
    }

    /// Rebuild the index from the current table. Returns the document count.
    pub async fn reindex(&self) -> Result<usize, FinderError> {
        let table = self.table.write().await;
        self.sync
            .rebuild(&table)
            .await
            .map_err(FinderError::SyncFailure)
    }

    /// Table rows in insertion order.
    pub async fn profiles(&self) -> Vec<ProfileRecord> {
        self.table.read().await.rows().to_vec()
    }

    /// Every document currently in the index, ordered by id.
    pub async fn indexed(&self) -> Result<Vec<IndexedDocument>, FinderError> {
        let _table = self.table.read().await;
        self.index.get().await.map_err(|e| {
            FinderError::SearchUnavailable(format!("index unavailable: {:#}", e))
        })
    }

    /// Number of documents in the index.
    pub async fn count(&self) -> Result<usize, FinderError> {
        let _table = self.table.read().await;
        self.index.count().await.map_err(|e| {
            FinderError::SearchUnavailable(format!("index unavailable: {:#}", e))
        })
    }

    /// Whether the index currently mirrors the table.
    pub async fn is_in_sync(&self) -> Result<bool, FinderError> {
        let table = self.table.read().await;
        self.sync
            .is_in_sync(&table)
            .await
            .map_err(FinderError::SyncFailure)
    }
}
