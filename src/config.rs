use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub org_chart: OrgChartConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfilesConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrgChartConfig {
    #[serde(default = "default_org_path")]
    pub path: PathBuf,
}

impl Default for OrgChartConfig {
    fn default() -> Self {
        Self {
            path: default_org_path(),
        }
    }
}

fn default_org_path() -> PathBuf {
    PathBuf::from("org.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_backend")]
    pub backend: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: default_index_backend(),
            path: None,
        }
    }
}

fn default_index_backend() -> String {
    "memory".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
            url: None,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReasoningConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_sampling_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_reasoning_retries")]
    pub max_retries: u32,
    /// Override the provider's API base URL.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_k: default_sampling_top_k(),
            top_p: default_top_p(),
            timeout_secs: default_reasoning_timeout_secs(),
            max_retries: default_reasoning_retries(),
            url: None,
        }
    }
}

fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.3
}
fn default_sampling_top_k() -> u32 {
    250
}
fn default_top_p() -> f32 {
    1.0
}
fn default_reasoning_timeout_secs() -> u64 {
    60
}
fn default_reasoning_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:7860".to_string()
}

impl Config {
    /// A config with every section at its default, backed by the given
    /// profile file. Used by tests and embedding callers.
    pub fn with_profiles(path: impl Into<PathBuf>) -> Self {
        Self {
            profiles: ProfilesConfig { path: path.into() },
            org_chart: OrgChartConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            reasoning: ReasoningConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    match config.index.backend.as_str() {
        "memory" => {}
        "sqlite" => {
            if config.index.path.is_none() {
                anyhow::bail!("index.path must be set when index.backend is 'sqlite'");
            }
        }
        other => anyhow::bail!(
            "Unknown index backend: '{}'. Must be memory or sqlite.",
            other
        ),
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "hash" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, hash, openai, ollama, or local.",
            other
        ),
    }
    if matches!(config.embedding.provider.as_str(), "openai" | "ollama") {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }
    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }

    // Validate reasoning
    match config.reasoning.provider.as_str() {
        "disabled" | "anthropic" | "openai" => {}
        other => anyhow::bail!(
            "Unknown reasoning provider: '{}'. Must be disabled, anthropic, or openai.",
            other
        ),
    }
    if !(0.0..=1.0).contains(&config.reasoning.temperature) {
        anyhow::bail!("reasoning.temperature must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.reasoning.top_p) {
        anyhow::bail!("reasoning.top_p must be in [0.0, 1.0]");
    }
    if config.reasoning.max_tokens == 0 {
        anyhow::bail!("reasoning.max_tokens must be > 0");
    }
    if config.reasoning.timeout_secs == 0 {
        anyhow::bail!("reasoning.timeout_secs must be > 0");
    }

    Ok(())
}
