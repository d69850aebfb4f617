//! One interactive session: at most one active store plus an append-only
//! question/answer history.
//!
//! A [`Session`] is the handle every interactive layer passes around. It is
//! not shared: callers that need concurrent access (the HTTP server) wrap it
//! in a mutex so only one operation runs at a time.
//!
//! # Lifecycle
//!
//! 1. [`Session::upload`] chunks and embeds a log file. On success the new
//!    store replaces the previous one; on failure the previous store stays.
//! 2. [`Session::ask`] sanitises the question, answers it from the active
//!    store, and records the exchange. Failed questions are not recorded.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::answer::{answer, AnswerOptions, DEFAULT_SYSTEM_PROMPT};
use crate::chunk::{split_logs, DEFAULT_CHUNK_LIMIT};
use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::models::{content_hash, DocumentInfo, QaEntry};
use crate::sanitize::{Sanitized, Sanitizer};
use crate::store::{InMemoryStore, VectorIndex};

/// Tunables for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Soft chunk size in chars.
    pub chunk_limit: usize,
    /// Texts per embedding request while building a store.
    pub batch_size: usize,
    pub answer: AnswerOptions,
    /// Sent as the system message; `None` sends the user message alone.
    pub system_prompt: Option<String>,
    pub sanitizer: Sanitizer,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            batch_size: 64,
            answer: AnswerOptions::default(),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            sanitizer: Sanitizer::default(),
        }
    }
}

/// Result of [`Session::ask`].
#[derive(Debug, Clone, PartialEq)]
pub struct AskOutcome {
    /// The history entry that was appended.
    pub entry: QaEntry,
    /// The denylisted pattern that replaced the question, if any.
    pub blocked_pattern: Option<String>,
}

pub struct Session {
    id: Uuid,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn CompletionProvider>,
    options: SessionOptions,
    store: Option<InMemoryStore>,
    document: Option<DocumentInfo>,
    history: Vec<QaEntry>,
}

impl Session {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn CompletionProvider>,
        options: SessionOptions,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedder,
            model,
            options,
            store: None,
            document: None,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Info about the active upload, if any.
    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    /// The active store, if any.
    pub fn store(&self) -> Option<&InMemoryStore> {
        self.store.as_ref()
    }

    /// Answered questions, oldest first.
    pub fn history(&self) -> &[QaEntry] {
        &self.history
    }

    /// Chunk, embed, and index `text`, replacing the active store.
    ///
    /// `on_progress(done, total)` reports embedded chunk counts.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDocument`] when `text` holds no non-blank lines, and
    /// [`Error::Embedding`] when embedding fails. Either way the previous
    /// store and document stay active.
    pub async fn upload(
        &mut self,
        name: &str,
        text: &str,
        on_progress: impl FnMut(usize, usize) + Send,
    ) -> Result<&DocumentInfo> {
        let chunks = split_logs(text, self.options.chunk_limit);
        let chunk_count = chunks.len();

        let store = InMemoryStore::build(
            chunks,
            self.embedder.as_ref(),
            self.options.batch_size,
            on_progress,
        )
        .await?;

        let info = DocumentInfo {
            name: name.to_string(),
            sha256: content_hash(text),
            bytes: text.len(),
            lines: text.lines().count(),
            chunks: chunk_count,
            dims: store.dims(),
        };

        self.store = Some(store);
        Ok(self.document.insert(info))
    }

    /// Sanitise and answer `raw_question` from the active store.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyQuestion`] for blank input.
    /// - [`Error::NoDocument`] before the first successful upload.
    /// - [`Error::Embedding`] / [`Error::Model`] from the providers. History
    ///   is unchanged, so the same question can be retried.
    pub async fn ask(&mut self, raw_question: &str) -> Result<AskOutcome> {
        if raw_question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let store = self.store.as_ref().ok_or(Error::NoDocument)?;

        let sanitized = self.options.sanitizer.sanitize(raw_question);
        let blocked_pattern = match &sanitized {
            Sanitized::Blocked { pattern, .. } => Some(pattern.clone()),
            Sanitized::Clean(_) => None,
        };
        let question = sanitized.into_text();

        let reply = answer(
            store as &dyn VectorIndex,
            self.embedder.as_ref(),
            self.model.as_ref(),
            &question,
            self.options.system_prompt.as_deref(),
            &self.options.answer,
        )
        .await?;

        let entry = QaEntry {
            question,
            answer: reply,
            asked_at: Utc::now(),
        };
        self.history.push(entry.clone());

        Ok(AskOutcome {
            entry,
            blocked_pattern,
        })
    }
}
