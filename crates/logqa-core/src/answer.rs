//! Grounded question answering over a [`VectorIndex`].
//!
//! # Pipeline
//!
//! ```text
//! question ─▶ embed ─▶ index.nearest(top_k) ─┬─ none ─▶ NOT_FOUND_ANSWER
//!                                             └─ some ─▶ build_messages ─▶ complete ─▶ trim
//! ```
//!
//! Sanitisation happens before this module is called (see
//! [`crate::session::Session::ask`]); the question seen here may already be
//! the blocked-input warning.

use crate::completion::{ChatMessage, CompletionProvider};
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::store::{ScoredChunk, VectorIndex};

/// Returned verbatim when retrieval finds nothing. The model is not called.
pub const NOT_FOUND_ANSWER: &str = "Information not found in the logs.";

/// Default number of chunks placed in the prompt.
pub const DEFAULT_TOP_K: usize = 5;

/// Default chat model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Sampling temperature for every completion call. Answers are greedy.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Default system prompt for the log analysis assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a Log Analysis Assistant. Your role is to read and analyse log files provided by the user.

Rules:
1. Always base answers on the provided log data.
2. Cite the log lines or time ranges that support your answer.
3. If unsure, say 'Information not found in the logs.'
4. Provide clear, concise answers.";

/// Retrieval parameters for [`answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOptions {
    pub top_k: usize,
    pub model: String,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Join retrieved chunks, in ranked order, into one context block.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user-role message carrying the context block and question.
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using only the log excerpts below. \
         If the excerpts do not contain the answer, reply exactly \"{}\". \
         Cite the line numbers or timestamps that support your answer wherever they appear in the excerpts.\n\
         \n\
         Log excerpts:\n\
         {}\n\
         \n\
         Question: {}",
        NOT_FOUND_ANSWER, context, question
    )
}

/// Build the full message sequence: optional system message, then the user
/// message.
pub fn build_messages(
    chunks: &[ScoredChunk],
    question: &str,
    system_prompt: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    let context = build_context(chunks);
    messages.push(ChatMessage::user(build_user_prompt(&context, question)));
    messages
}

/// Answer `question` from the chunks in `index`.
///
/// # Errors
///
/// - [`Error::Embedding`] if the question cannot be embedded.
/// - [`Error::Model`] if the completion call fails. No retry is attempted.
pub async fn answer(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    model: &dyn CompletionProvider,
    question: &str,
    system_prompt: Option<&str>,
    options: &AnswerOptions,
) -> Result<String> {
    let query_vec = embed_query(embedder, question)
        .await
        .map_err(Error::Embedding)?;

    let hits = index.nearest(&query_vec, options.top_k).await;
    if hits.is_empty() {
        return Ok(NOT_FOUND_ANSWER.to_string());
    }

    let messages = build_messages(&hits, question, system_prompt);
    let reply = model
        .complete(&messages, &options.model, ANSWER_TEMPERATURE)
        .await
        .map_err(Error::Model)?;

    Ok(reply.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        fn model_name(&self) -> &str {
            "down"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("connection refused")
        }
    }

    /// Index returning a fixed hit list regardless of the query.
    struct FixedIndex(Vec<ScoredChunk>);

    #[async_trait]
    impl VectorIndex for FixedIndex {
        fn len(&self) -> usize {
            self.0.len()
        }
        async fn nearest(&self, _query: &[f32], k: usize) -> Vec<ScoredChunk> {
            self.0.iter().take(k).cloned().collect()
        }
    }

    #[derive(Default)]
    struct RecordingChat {
        calls: AtomicUsize,
        last: Mutex<Option<(Vec<ChatMessage>, String, f32)>>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionProvider for RecordingChat {
        fn name(&self) -> &str {
            "recording"
        }
        async fn complete(
            &self,
            messages: &[ChatMessage],
            model: &str,
            temperature: f32,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((messages.to_vec(), model.to_string(), temperature));
            if self.fail {
                anyhow::bail!("HTTP 503 from completion endpoint");
            }
            Ok("  The disk filled up at 12:03:44.\n".to_string())
        }
    }

    fn hit(index: usize, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            index,
            text: text.to_string(),
            score,
        }
    }

    fn two_hits() -> FixedIndex {
        FixedIndex(vec![
            hit(7, "12:03:44 ERROR disk full", 0.9),
            hit(2, "12:00:01 INFO service started", 0.4),
        ])
    }

    #[tokio::test]
    async fn test_empty_retrieval_returns_sentinel_without_model_call() {
        let chat = RecordingChat::default();
        let out = answer(
            &FixedIndex(Vec::new()),
            &UnitEmbedder,
            &chat,
            "why did it crash?",
            Some(DEFAULT_SYSTEM_PROMPT),
            &AnswerOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(out, "Information not found in the logs.");
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_k_zero_is_empty_retrieval() {
        let chat = RecordingChat::default();
        let options = AnswerOptions {
            top_k: 0,
            ..AnswerOptions::default()
        };
        let out = answer(&two_hits(), &UnitEmbedder, &chat, "q", None, &options)
            .await
            .unwrap();
        assert_eq!(out, NOT_FOUND_ANSWER);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_and_prompt_grounded() {
        let chat = RecordingChat::default();
        let out = answer(
            &two_hits(),
            &UnitEmbedder,
            &chat,
            "when did the disk fill?",
            Some("SYSTEM"),
            &AnswerOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(out, "The disk filled up at 12:03:44.");

        let (messages, model, temperature) = chat.last.lock().unwrap().clone().unwrap();
        assert_eq!(model, "gpt-4");
        assert_eq!(temperature, 0.0);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("SYSTEM"));
        assert_eq!(messages[1].role, Role::User);

        let user = &messages[1].content;
        assert!(user.contains("12:03:44 ERROR disk full\n\n12:00:01 INFO service started"));
        assert!(user.contains("Question: when did the disk fill?"));
        assert!(user.contains("using only the log excerpts"));
        assert!(user.contains("line numbers or timestamps"));
    }

    #[tokio::test]
    async fn test_model_always_called_greedily() {
        let chat = RecordingChat::default();
        let options = AnswerOptions {
            top_k: 1,
            model: "gpt-4o-mini".to_string(),
        };
        for q in ["first?", "second?"] {
            answer(&two_hits(), &UnitEmbedder, &chat, q, None, &options)
                .await
                .unwrap();
            let (_, model, temperature) = chat.last.lock().unwrap().clone().unwrap();
            assert_eq!(model, "gpt-4o-mini");
            assert_eq!(temperature, 0.0);
        }
        assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_system_prompt_sends_user_message_only() {
        let chat = RecordingChat::default();
        answer(&two_hits(), &UnitEmbedder, &chat, "q", None, &AnswerOptions::default())
            .await
            .unwrap();
        let (messages, _, _) = chat.last.lock().unwrap().clone().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_top_k_limits_context() {
        let chat = RecordingChat::default();
        let options = AnswerOptions {
            top_k: 1,
            ..AnswerOptions::default()
        };
        answer(&two_hits(), &UnitEmbedder, &chat, "q", None, &options)
            .await
            .unwrap();
        let (messages, _, _) = chat.last.lock().unwrap().clone().unwrap();
        assert!(messages[0].content.contains("disk full"));
        assert!(!messages[0].content.contains("service started"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let chat = RecordingChat {
            fail: true,
            ..RecordingChat::default()
        };
        let err = answer(&two_hits(), &UnitEmbedder, &chat, "q", None, &AnswerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert!(err.to_string().contains("HTTP 503"));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_skips_model() {
        let chat = RecordingChat::default();
        let err = answer(&two_hits(), &DownEmbedder, &chat, "q", None, &AnswerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_context_keeps_ranked_order() {
        let chunks = vec![hit(9, "late", 0.9), hit(1, "early", 0.5)];
        assert_eq!(build_context(&chunks), "late\n\nearly");
    }
}
