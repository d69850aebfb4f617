//! Session setup and log upload.
//!
//! Wires configured providers into a [`Session`] and feeds uploaded log
//! text through it with progress reporting. Provider construction happens
//! here, at startup, so missing credentials fail before any file is read.

use anyhow::{Context, Result};
use std::path::Path;

use logqa_core::models::DocumentInfo;
use logqa_core::session::Session;

use crate::completion::create_completion_provider;
use crate::config::Config;
use crate::embedding::create_provider;
use crate::progress::{ProgressReporter, UploadProgressEvent};

/// Build a session from config, constructing both providers.
///
/// # Errors
///
/// Fails immediately when a provider cannot be created, e.g. when
/// `OPENAI_API_KEY` is unset for an OpenAI provider.
pub fn open_session(config: &Config) -> Result<Session> {
    let embedder = create_provider(&config.embedding)
        .context("Failed to initialize embedding provider")?;
    let model = create_completion_provider(&config.completion)
        .context("Failed to initialize completion provider")?;
    Ok(Session::new(embedder, model, config.session_options()))
}

/// Decode uploaded bytes as UTF-8.
pub fn decode_log(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        anyhow::anyhow!(
            "log file is not valid UTF-8 (first invalid byte at offset {})",
            e.utf8_error().valid_up_to()
        )
    })
}

/// Upload `text` under `name`, reporting embedding progress.
pub async fn upload_text(
    session: &mut Session,
    name: &str,
    text: &str,
    reporter: &dyn ProgressReporter,
) -> Result<DocumentInfo> {
    let info = session
        .upload(name, text, |n, total| {
            reporter.report(UploadProgressEvent::Embedding {
                name: name.to_string(),
                n: n as u64,
                total: total as u64,
            })
        })
        .await?
        .clone();

    reporter.report(UploadProgressEvent::Ready {
        name: info.name.clone(),
        chunks: info.chunks as u64,
        dims: info.dims as u64,
    });
    Ok(info)
}

/// Read a log file from disk and upload it.
pub async fn upload_file(
    session: &mut Session,
    path: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<DocumentInfo> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    let text = decode_log(bytes).with_context(|| format!("{}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    upload_text(session, &name, &text, reporter).await
}
