//! Chat-completion provider implementations.
//!
//! - **[`OpenAIChat`]**: `POST {url}/v1/chat/completions`.
//! - **[`OllamaChat`]**: `POST {url}/api/chat` with `stream: false`.
//!
//! Both send the message list as-is and return the first choice's content.
//! A request is sent once; failures are returned without retry.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use logqa_core::completion::{ChatMessage, CompletionProvider};

use crate::config::CompletionConfig;
use crate::embedding::{error_for_status, http_client, openai_api_key};

// ============ OpenAI ============

pub struct OpenAIChat {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIChat {
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            url: config.url_or_default(),
            api_key: openai_api_key()?,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIChat {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI chat completion request failed")?;

        let json: serde_json::Value = error_for_status("OpenAI", response).await?.json().await?;
        parse_openai_choice(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_openai_choice(json: &serde_json::Value) -> Result<String> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices array"))?;

    let Some(first) = choices.first() else {
        bail!("OpenAI response contained no choices");
    };

    first
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: choice has no message content"))
}

// ============ Ollama ============

pub struct OllamaChat {
    url: String,
    client: reqwest::Client,
}

impl OllamaChat {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        Ok(Self {
            url: config.url_or_default(),
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": temperature },
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama connection error (is Ollama running at {}?)", self.url))?;

        let json: serde_json::Value = error_for_status("Ollama", response).await?.json().await?;
        json.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message content"))
    }
}

/// Create the [`CompletionProvider`] named by `config.provider`.
pub fn create_completion_provider(config: &CompletionConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIChat::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}
