//! Error taxonomy for finder operations.
//!
//! Internals work in [`anyhow::Result`] and attach context as they go. At
//! the boundary of an operation (upsert, search, reindex) failures are
//! classified into a [`FinderError`] so the HTTP layer and the CLI can turn
//! them into a user-facing message without string matching.

use thiserror::Error;

/// Errors surfaced by [`PeopleFinder`](crate::finder::PeopleFinder) operations.
#[derive(Debug, Error)]
pub enum FinderError {
    /// A required input was missing or invalid. Nothing was mutated.
    #[error("{0}")]
    Validation(String),

    /// The backing CSV file could not be read or written.
    #[error("profile store error: {0:#}")]
    Persistence(anyhow::Error),

    /// The vector index could not be rebuilt from the profile table.
    #[error("index synchronization failed: {0:#}")]
    SyncFailure(anyhow::Error),

    /// The index query or the reasoning call failed or timed out.
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    /// The reasoning capability answered with something other than the
    /// expected `{"matches": [...]}` document.
    #[error("malformed explanation: {0}")]
    MalformedExplanation(String),
}

impl FinderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Persistence(_) => "persistence",
            Self::SyncFailure(_) => "sync_failure",
            Self::SearchUnavailable(_) => "search_unavailable",
            Self::MalformedExplanation(_) => "malformed_explanation",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
