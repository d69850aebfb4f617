//! TOML configuration.
//!
//! Every section is optional; missing sections and fields fall back to the
//! defaults below. [`load_config`] validates the parsed values so a bad
//! config fails at startup, before any file is uploaded.
//!
//! Secrets never live in the config file. `OPENAI_API_KEY` is read from the
//! environment when an OpenAI provider is constructed, and the server
//! password comes from the variable named by `server.password_env`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use logqa_core::answer::{AnswerOptions, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TOP_K};
use logqa_core::chunk::DEFAULT_CHUNK_LIMIT;
use logqa_core::sanitize::Sanitizer;
use logqa_core::session::SessionOptions;

pub const OPENAI_URL: &str = "https://api.openai.com";
pub const OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Soft chunk size in chars.
    #[serde(default = "default_chunk_limit")]
    pub limit: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            limit: default_chunk_limit(),
        }
    }
}

fn default_chunk_limit() -> usize {
    DEFAULT_CHUNK_LIMIT
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
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `openai`, `ollama`, `local`, or `disabled`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL; defaults per provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Configured model, or the provider's default.
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider.as_str() {
                "ollama" => "nomic-embed-text",
                "local" => "all-minilm-l6-v2",
                _ => "text-embedding-3-small",
            }
            .to_string()
        })
    }

    pub fn url_or_default(&self) -> String {
        url_or_default(&self.url, &self.provider)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// `openai` or `ollama`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn url_or_default(&self) -> String {
        url_or_default(&self.url, &self.provider)
    }
}

fn url_or_default(url: &Option<String>, provider: &str) -> String {
    let url = url.clone().unwrap_or_else(|| match provider {
        "ollama" => OLLAMA_URL.to_string(),
        _ => OPENAI_URL.to_string(),
    });
    url.trim_end_matches('/').to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// System message sent with every question. An empty string sends none.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SanitizeConfig {
    /// Phrases blocked in addition to the built-in denylist.
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Environment variable holding the shared password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Largest accepted upload body, in MiB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            password_env: default_password_env(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}
fn default_password_env() -> String {
    "LOGQA_PASSWORD".to_string()
}
fn default_max_upload_mb() -> usize {
    50
}

impl Config {
    /// Session tunables derived from this config.
    pub fn session_options(&self) -> SessionOptions {
        let system_prompt = Some(self.assistant.system_prompt.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        SessionOptions {
            chunk_limit: self.chunking.limit,
            batch_size: self.embedding.batch_size,
            answer: AnswerOptions {
                top_k: self.retrieval.top_k,
                model: self.completion.model.clone(),
            },
            system_prompt,
            sanitizer: Sanitizer::new(&self.sanitize.extra_patterns),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.limit == 0 {
            bail!("chunking.limit must be > 0");
        }
        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.embedding.batch_size < 1 {
            bail!("embedding.batch_size must be >= 1");
        }
        if self.embedding.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be > 0");
        }
        if self.completion.timeout_secs == 0 {
            bail!("completion.timeout_secs must be > 0");
        }
        if self.server.max_upload_mb == 0 {
            bail!("server.max_upload_mb must be > 0");
        }
        if self.completion.model.trim().is_empty() {
            bail!("completion.model must not be empty");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "openai" | "ollama" | "local" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be openai, ollama, local, or disabled.",
                other
            ),
        }
        match self.completion.provider.as_str() {
            "openai" | "ollama" => {}
            other => bail!(
                "Unknown completion provider: '{}'. Must be openai or ollama.",
                other
            ),
        }

        Ok(())
    }
}

/// Parse and validate a TOML config string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Read, parse, and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load `path` if given; otherwise use `./logqa.toml` when present, else
/// defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let fallback = Path::new("logqa.toml");
            if fallback.exists() {
                load_config(fallback)
            } else {
                Ok(Config::default())
            }
        }
    }
}
