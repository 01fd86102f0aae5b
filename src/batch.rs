//! Batched embedding with per-item failure recovery.
//!
//! [`BatchEmbedder`] embeds one batch of chunks at a time and drops items
//! whose embedding failed, keeping the surviving texts, metadata, ids, and
//! vectors as four aligned lists. A failed item never aborts its batch.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, warn};

use crate::embedding::{EmbeddingKind, EmbeddingProvider};

/// The surviving items of one embedded batch, as four aligned lists.
///
/// Index `i` in every list refers to the same logical chunk, and the lists
/// always have equal length. The batch is built in a single filtering pass
/// and never mutated afterwards, so the alignment holds by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedBatch {
    /// Surviving chunk texts, in original order.
    pub texts: Vec<String>,
    /// Surviving chunk metadata, aligned with `texts`.
    pub metadata: Vec<Value>,
    /// Surviving record ids, aligned with `texts`.
    pub ids: Vec<u64>,
    /// Embedding vectors, aligned with `texts`.
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddedBatch {
    /// Number of surviving items in the batch.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the batch has no surviving items.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Embeds chunk batches through an [`EmbeddingProvider`], dropping items
/// that fail to produce a non-empty vector.
#[derive(Clone)]
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl BatchEmbedder {
    /// Create an embedder that processes `batch_size` chunks per batch.
    ///
    /// `batch_size` must be non-zero; [`RagConfig`](crate::RagConfig)
    /// validation guarantees this for configured values.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self { provider, batch_size: batch_size.max(1) }
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches needed to cover `total` chunks.
    pub fn num_batches(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size)
    }

    /// Embed one batch of aligned `texts`/`metadata`/`ids`.
    ///
    /// Each item is embedded as a document. An item whose embedding errors
    /// or comes back empty is logged with its record id and dropped; the
    /// survivors are returned with their relative order preserved. An empty
    /// input or an all-fail batch yields an empty [`EmbeddedBatch`], never
    /// an error.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        metadata: &[Value],
        ids: &[u64],
    ) -> EmbeddedBatch {
        debug_assert!(texts.len() == metadata.len() && texts.len() == ids.len());

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        let mut surviving: Vec<usize> = Vec::with_capacity(texts.len());

        for (idx, text) in texts.iter().enumerate() {
            match self.provider.embed(text, EmbeddingKind::Document).await {
                Ok(vector) if !vector.is_empty() => {
                    vectors.push(vector);
                    surviving.push(idx);
                }
                Ok(_) => {
                    warn!(chunk_id = ids[idx], "embedding returned an empty vector, dropping chunk");
                }
                Err(e) => {
                    error!(chunk_id = ids[idx], error = %e, "embedding failed, dropping chunk");
                }
            }
        }

        // One filtering pass over the surviving indices keeps the three
        // input lists and the vectors aligned.
        let batch = EmbeddedBatch {
            texts: surviving.iter().map(|&i| texts[i].clone()).collect(),
            metadata: surviving.iter().map(|&i| metadata[i].clone()).collect(),
            ids: surviving.iter().map(|&i| ids[i]).collect(),
            vectors,
        };
        debug_assert_eq!(batch.texts.len(), batch.vectors.len());
        batch
    }
}
