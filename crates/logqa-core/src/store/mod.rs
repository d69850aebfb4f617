//! Similarity-search abstraction over embedded log chunks.
//!
//! The [`VectorIndex`] trait is the only thing the query answerer needs
//! from a store: "give me the `k` chunks nearest to this vector". The
//! production implementation is the flat, immutable [`InMemoryStore`];
//! tests substitute their own indexes to drive edge cases.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde::Serialize;

/// A chunk returned from a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// Position of the chunk in upload order.
    pub index: usize,
    /// Original chunk text.
    pub text: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// Read-only nearest-neighbour lookup over embedded chunks.
///
/// Results are ranked by descending similarity. Implementations may return
/// fewer than `k` results, including none.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Number of chunks held by the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `k` chunks nearest to `query`.
    async fn nearest(&self, query: &[f32], k: usize) -> Vec<ScoredChunk>;
}
