//! Session-owned data types shared by the CLI and HTTP server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One answered question. `question` is the text that was actually sent
/// onward, which is the warning string when sanitisation blocked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Summary of the log file behind the active store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Display name (file name or the `name` given on upload).
    pub name: String,
    /// Hex SHA-256 of the uploaded text.
    pub sha256: String,
    pub bytes: usize,
    pub lines: usize,
    pub chunks: usize,
    /// Embedding dimensionality of the store.
    pub dims: usize,
}

/// Hex-encoded SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
