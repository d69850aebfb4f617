//! Flat in-memory [`VectorIndex`] built once per uploaded log file.
//!
//! Vector search is brute-force cosine similarity over every stored vector,
//! which is plenty for the few thousand chunks a single log file produces.
//! The store is immutable after [`InMemoryStore::build`]; a new upload
//! builds a new store.

use async_trait::async_trait;

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::{Error, Result};

use super::{ScoredChunk, VectorIndex};

struct StoredChunk {
    text: String,
    vector: Vec<f32>,
}

/// In-memory document store pairing each log chunk with its embedding.
pub struct InMemoryStore {
    records: Vec<StoredChunk>,
    dims: usize,
    model: String,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("chunks", &self.records.len())
            .field("dims", &self.dims)
            .field("model", &self.model)
            .finish()
    }
}

impl InMemoryStore {
    /// Embed `chunks` and build a store from them.
    ///
    /// Texts are sent to the provider `batch_size` at a time, one batch
    /// after another. `on_progress(done, total)` is called after each
    /// batch.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDocument`] if `chunks` is empty.
    /// - [`Error::Embedding`] if any batch fails, returns the wrong number
    ///   of vectors, or returns vectors of inconsistent dimension. Nothing
    ///   is kept from a failed build.
    pub async fn build(
        chunks: Vec<String>,
        embedder: &dyn EmbeddingProvider,
        batch_size: usize,
        mut on_progress: impl FnMut(usize, usize) + Send,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let total = chunks.len();
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);

        for batch in chunks.chunks(batch_size) {
            let embedded = embedder.embed(batch).await.map_err(Error::Embedding)?;
            if embedded.len() != batch.len() {
                return Err(Error::Embedding(anyhow::anyhow!(
                    "provider returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
            on_progress(vectors.len(), total);
        }

        let dims = vectors[0].len();
        if dims == 0 {
            return Err(Error::Embedding(anyhow::anyhow!(
                "provider returned empty vectors"
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(Error::Embedding(anyhow::anyhow!(
                "inconsistent embedding dimensions: expected {}, got {}",
                dims,
                bad.len()
            )));
        }

        let records = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| StoredChunk { text, vector })
            .collect();

        Ok(Self {
            records,
            dims,
            model: embedder.model_name().to_string(),
        })
    }

    /// Dimensionality of the stored vectors.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Embedding model the store was built with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chunk texts in upload order.
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.text.as_str())
    }
}

#[async_trait]
impl VectorIndex for InMemoryStore {
    fn len(&self) -> usize {
        self.records.len()
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, r)| (index, cosine_similarity(query, &r.vector)))
            .collect();

        // Stable sort keeps upload order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(index, score)| ScoredChunk {
                index,
                text: self.records[index].text.clone(),
                score,
            })
            .collect()
    }
}
