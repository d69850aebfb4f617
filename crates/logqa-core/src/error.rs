//! Error taxonomy for the retrieval pipeline.
//!
//! External-service failures carry the provider's `anyhow` chain so the
//! interactive layer can show the full cause. Empty retrieval and blocked
//! questions are not errors: they produce the not-found sentinel and the
//! substituted warning text respectively.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// An embedding call failed (network, auth, quota, or malformed response).
    #[error("embedding service error: {0:#}")]
    Embedding(anyhow::Error),

    /// The chat-completion call failed.
    #[error("model service error: {0:#}")]
    Model(anyhow::Error),

    /// The uploaded text produced no chunks.
    #[error("document contains no log lines")]
    EmptyDocument,

    /// A question was asked before any document was uploaded.
    #[error("no log file has been uploaded yet")]
    NoDocument,

    /// The question was empty or whitespace.
    #[error("question must not be empty")]
    EmptyQuestion,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Embedding(_) => "embedding_error",
            Error::Model(_) => "model_error",
            Error::EmptyDocument => "empty_document",
            Error::NoDocument => "no_document",
            Error::EmptyQuestion => "bad_request",
        }
    }
}
