//! Reasoning capability: a hosted LLM that turns a prompt into text.
//!
//! The [`Reasoner`] trait hides which API is called. Everything about
//! prompts and response shape lives in [`explain`](crate::explain); a
//! reasoner only moves a [`ReasoningRequest`] over the wire and hands back
//! the first text block of the reply.
//!
//! | Config Value | Provider | Credential |
//! |-------------|----------|------------|
//! | `"disabled"` | [`DisabledReasoner`] | none |
//! | `"anthropic"` | [`AnthropicReasoner`] (Messages API) | `ANTHROPIC_API_KEY` |
//! | `"openai"` | [`OpenAIReasoner`] (Chat Completions) | `OPENAI_API_KEY` |

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReasoningConfig;
use crate::http::post_with_retry;

/// A single-turn completion request with its sampling parameters.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    fn model_name(&self) -> &str;
    /// Returns the raw text of the model's reply.
    async fn complete(&self, request: &ReasoningRequest) -> Result<String>;
}

pub struct DisabledReasoner;

#[async_trait]
impl Reasoner for DisabledReasoner {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _request: &ReasoningRequest) -> Result<String> {
        bail!("Reasoning provider is disabled. Set [reasoning] provider in config.")
    }
}

// ============ Anthropic ============

pub struct AnthropicReasoner {
    model: String,
    api_key: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl AnthropicReasoner {
    pub fn new(config: &ReasoningConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "claude-3-5-sonnet-20240620".to_string()),
            api_key,
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl Reasoner for AnthropicReasoner {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ReasoningRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_k": request.top_k,
            "top_p": request.top_p,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        let endpoint = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let json = post_with_retry(self.max_retries, "Anthropic", || {
            self.client
                .post(&endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body)
        })
        .await?;

        parse_anthropic_response(&json)
    }
}

fn parse_anthropic_response(json: &serde_json::Value) -> Result<String> {
    json.get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        })
        .and_then(|b| b.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Anthropic response: no text content block"))
}

// ============ OpenAI ============

pub struct OpenAIReasoner {
    model: String,
    api_key: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIReasoner {
    pub fn new(config: &ReasoningConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            api_key,
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl Reasoner for OpenAIReasoner {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ReasoningRequest) -> Result<String> {
        // Chat Completions has no top_k.
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        let endpoint = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let json = post_with_retry(self.max_retries, "OpenAI", || {
            self.client
                .post(&endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
        })
        .await?;

        parse_openai_chat_response(&json)
    }
}

fn parse_openai_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content")
        })
}

pub fn create_reasoner(config: &ReasoningConfig) -> Result<Arc<dyn Reasoner>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledReasoner)),
        "anthropic" => Ok(Arc::new(AnthropicReasoner::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIReasoner::new(config)?)),
        other => bail!("Unknown reasoning provider: {}", other),
    }
}
