//! Relevance explanation via the reasoning capability.
//!
//! [`RelevanceExplainer`] renders a fixed instruction prompt around the
//! user's query and the retrieved profile texts, asks the [`Reasoner`] for
//! a reply, and insists that the reply is a single JSON document:
//!
//! ```json
//! { "matches": [ { "name": "...", "email": "...", "relevance_explanation": "..." } ] }
//! ```
//!
//! A reply wrapped in one Markdown code fence is accepted. Anything else is
//! a [`FinderError::MalformedExplanation`]; it is never turned into an empty
//! result.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReasoningConfig;
use crate::error::FinderError;
use crate::models::Match;
use crate::reasoning::{Reasoner, ReasoningRequest};

#[derive(Debug, Deserialize)]
struct ExplanationResponse {
    matches: Vec<Match>,
}

pub struct RelevanceExplainer {
    reasoner: Arc<dyn Reasoner>,
    max_tokens: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    timeout: Duration,
}

impl RelevanceExplainer {
    pub fn new(reasoner: Arc<dyn Reasoner>, config: &ReasoningConfig) -> Self {
        Self {
            reasoner,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the overall deadline for one explanation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the reasoner which of the profiles in `context` match `query`.
    pub async fn explain(&self, query: &str, context: &str) -> Result<Vec<Match>, FinderError> {
        let request = ReasoningRequest {
            prompt: build_prompt(query, context),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
        };

        tracing::debug!(
            model = self.reasoner.model_name(),
            prompt_chars = request.prompt.len(),
            "requesting relevance explanation"
        );

        let raw = match tokio::time::timeout(self.timeout, self.reasoner.complete(&request)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                return Err(FinderError::SearchUnavailable(format!(
                    "reasoning call failed: {:#}",
                    e
                )))
            }
            Err(_) => {
                return Err(FinderError::SearchUnavailable(format!(
                    "reasoning call timed out after {}s",
                    self.timeout.as_secs_f32()
                )))
            }
        };

        parse_matches(&raw)
    }
}

/// Render the instruction prompt sent to the reasoner.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        r#"Based on the following user query and provided employee profiles, identify the most relevant people and explain why they match the requirements.

Query: {query}

Relevant profiles:
{context}

Return your response as a JSON string with this structure:
{{
    "matches": [
        {{
            "name": "person's name",
            "email": "person's email",
            "relevance_explanation": "detailed explanation of why this person matches"
        }}
    ]
}}

Ensure your response contains only the JSON object - no introduction, no explanation, no additional text."#
    )
}

/// Strip one surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

/// Parse a reasoner reply into matches.
pub fn parse_matches(raw: &str) -> Result<Vec<Match>, FinderError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(FinderError::MalformedExplanation(
            "empty response from reasoning provider".to_string(),
        ));
    }
    serde_json::from_str::<ExplanationResponse>(body)
        .map(|r| r.matches)
        .map_err(|e| FinderError::MalformedExplanation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Scripted(String);

    #[async_trait]
    impl Reasoner for Scripted {
        fn model_name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, request: &ReasoningRequest) -> anyhow::Result<String> {
            assert!(request.prompt.contains("Query: who knows Go"));
            assert_eq!(request.max_tokens, 2000);
            Ok(self.0.clone())
        }
    }

    struct Slow;

    #[async_trait]
    impl Reasoner for Slow {
        fn model_name(&self) -> &str {
            "slow"
        }
        async fn complete(&self, _request: &ReasoningRequest) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{\"matches\": []}".to_string())
        }
    }

    #[test]
    fn test_prompt_embeds_query_and_context() {
        let prompt = build_prompt("need SQL", "Name: Ann\nSkills: SQL");
        assert!(prompt.contains("Query: need SQL"));
        assert!(prompt.contains("Relevant profiles:\nName: Ann\nSkills: SQL"));
        assert!(prompt.contains("\"relevance_explanation\""));
    }

    #[test]
    fn test_parse_plain_json() {
        let matches = parse_matches(
            r#"{"matches": [{"name": "Ann", "email": "ann@x.com", "relevance_explanation": "Knows SQL"}]}"#,
        )
        .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].email, "ann@x.com");
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"matches\": []}\n```\n";
        assert!(parse_matches(raw).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_matches("Here are the best people: Ann and Bob.").unwrap_err();
        assert!(matches!(err, FinderError::MalformedExplanation(_)));
    }

    #[test]
    fn test_parse_rejects_trailing_text() {
        let err = parse_matches("{\"matches\": []} Hope this helps!").unwrap_err();
        assert!(matches!(err, FinderError::MalformedExplanation(_)));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_matches(r#"{"matches": [{"name": "Ann", "email": "ann@x.com"}]}"#)
            .unwrap_err();
        assert!(matches!(err, FinderError::MalformedExplanation(_)));

        let err = parse_matches(r#"{"people": []}"#).unwrap_err();
        assert!(matches!(err, FinderError::MalformedExplanation(_)));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            parse_matches("  \n"),
            Err(FinderError::MalformedExplanation(_))
        ));
    }

    #[tokio::test]
    async fn test_explain_passes_sampling_parameters() {
        let explainer = RelevanceExplainer::new(
            Arc::new(Scripted(
                r#"{"matches": [{"name": "Jane", "email": "jane@x.com", "relevance_explanation": "Go"}]}"#
                    .to_string(),
            )),
            &ReasoningConfig::default(),
        );
        let matches = explainer.explain("who knows Go", "ctx").await.unwrap();
        assert_eq!(matches[0].name, "Jane");
    }

    #[tokio::test]
    async fn test_explain_times_out() {
        let explainer = RelevanceExplainer::new(Arc::new(Slow), &ReasoningConfig::default())
            .with_timeout(Duration::from_millis(20));
        let err = explainer.explain("q", "ctx").await.unwrap_err();
        assert!(matches!(err, FinderError::SearchUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
