//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// How a text will be used, allowing providers to prepare document and
/// query embeddings differently (instruction prefixing, input type flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    /// The text is a document being indexed.
    Document,
    /// The text is a search query.
    Query,
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified
/// async interface. Ordinary failures should be reported through the
/// `Result`; callers in this crate treat an error and an empty vector
/// identically.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::{EmbeddingKind, EmbeddingProvider};
///
/// let embedding = provider.embed("hello world", EmbeddingKind::Document).await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
