//! Query embedding and similarity search against a project's collection.

use std::sync::Arc;

use tracing::error;

use crate::document::{Project, SearchResult};
use crate::embedding::{EmbeddingKind, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Embeds a query and searches a project's vector collection.
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a retriever from an embedding provider and a vector store.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Embed `text` as a query and search the project's collection,
    /// returning up to `limit` results in the store's similarity order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the query embedding comes
    /// back empty, or the underlying provider/store error.
    pub async fn try_search(
        &self,
        project: &Project,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collection = project.collection_name();

        let vector = self.provider.embed(text, EmbeddingKind::Query).await?;
        if vector.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "query".to_string(),
                message: "embedding model returned an empty vector".to_string(),
            });
        }

        self.store.search(&collection, &vector, limit).await
    }

    /// Collapsed form of [`try_search`](Self::try_search): any failure is
    /// logged and reported as `None`, and an empty result list is also
    /// collapsed to `None`.
    pub async fn search(
        &self,
        project: &Project,
        text: &str,
        limit: usize,
    ) -> Option<Vec<SearchResult>> {
        match self.try_search(project, text, limit).await {
            Ok(results) if results.is_empty() => None,
            Ok(results) => Some(results),
            Err(e) => {
                error!(project_id = %project.project_id, error = %e, "search failed");
                None
            }
        }
    }
}
