//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::batch::EmbeddedBatch;
use crate::document::{CollectionInfo, SearchResult};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of `(vector, text, metadata, id)`
/// records and support bulk insertion and searching by vector similarity.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("collection_p1", 384, false).await?;
/// store.insert_many("collection_p1", &batch).await?;
/// let results = store.search("collection_p1", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the given vector dimensionality.
    ///
    /// When `reset` is true any existing contents are discarded first;
    /// otherwise an existing collection is left untouched and later
    /// inserts are incremental.
    async fn create_collection(&self, name: &str, dimensions: usize, reset: bool) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Describe a collection's dimensionality and record count.
    async fn describe_collection(&self, name: &str) -> Result<CollectionInfo>;

    /// Bulk-insert an aligned batch of embedded records.
    ///
    /// Records with ids already present in the collection are overwritten.
    async fn insert_many(&self, collection: &str, batch: &EmbeddedBatch) -> Result<()>;

    /// Search for the `limit` most similar records to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;
}
