//! Query → retrieve → explain → format.

use serde::Serialize;
use std::sync::Arc;

use crate::error::FinderError;
use crate::explain::RelevanceExplainer;
use crate::index::VectorIndex;
use crate::models::{IndexedDocument, Match};

/// The explained result of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Matches in the order the explainer returned them.
    pub matches: Vec<Match>,
    /// Markdown rendering of `matches`.
    pub formatted: String,
}

pub struct SearchService {
    index: Arc<dyn VectorIndex>,
    explainer: RelevanceExplainer,
}

impl SearchService {
    pub fn new(index: Arc<dyn VectorIndex>, explainer: RelevanceExplainer) -> Self {
        Self { index, explainer }
    }

    /// Find up to `top_k` people matching `query`, with explanations.
    ///
    /// Never returns more than `top_k` matches. When the index holds fewer
    /// than `top_k` documents all of them are considered.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome, FinderError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FinderError::validation("query must not be empty"));
        }
        if top_k == 0 {
            return Err(FinderError::validation("top_k must be >= 1"));
        }

        let docs = self.index.query(query, top_k).await.map_err(|e| {
            FinderError::SearchUnavailable(format!("index query failed: {:#}", e))
        })?;

        if docs.is_empty() {
            tracing::debug!(query, "no indexed profiles, skipping explanation");
            return Ok(SearchOutcome {
                matches: Vec::new(),
                formatted: String::new(),
            });
        }

        let context = build_context(&docs);
        tracing::debug!(
            query,
            documents = docs.len(),
            context_chars = context.len(),
            "explaining search candidates"
        );

        let mut matches = self.explainer.explain(query, &context).await?;
        matches.truncate(top_k);

        Ok(SearchOutcome {
            formatted: format_matches(&matches),
            matches,
        })
    }
}

/// Join document texts with blank lines.
pub fn build_context(docs: &[IndexedDocument]) -> String {
    docs.iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render matches as Markdown blocks, preserving order.
pub fn format_matches(matches: &[Match]) -> String {
    let mut output = String::new();
    for m in matches {
        output.push_str(&format!("### {}\n", m.name));
        output.push_str(&format!("### {}\n", m.email));
        output.push_str(&format!("{}\n\n", m.relevance_explanation));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMetadata;

    #[test]
    fn test_format_matches_keeps_order() {
        let matches = vec![
            Match {
                name: "Zed".into(),
                email: "zed@x.com".into(),
                relevance_explanation: "Best fit".into(),
            },
            Match {
                name: "Ann".into(),
                email: "ann@x.com".into(),
                relevance_explanation: "Also good".into(),
            },
        ];
        assert_eq!(
            format_matches(&matches),
            "### Zed\n### zed@x.com\nBest fit\n\n### Ann\n### ann@x.com\nAlso good\n\n"
        );
    }

    #[test]
    fn test_build_context_joins_with_blank_line() {
        let doc = |id: &str, text: &str| IndexedDocument {
            id: id.into(),
            text: text.into(),
            metadata: DocumentMetadata {
                name: id.into(),
                email: id.into(),
            },
            score: Some(1.0),
        };
        assert_eq!(build_context(&[doc("a", "A"), doc("b", "B")]), "A\n\nB");
    }
}
