//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector
//! store backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and small-scale use cases.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::batch::EmbeddedBatch;
use crate::document::{CollectionInfo, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

#[derive(Debug, Clone)]
struct Record {
    text: String,
    metadata: Value,
    vector: Vec<f32>,
}

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    records: BTreeMap<u64, Record>,
}

impl Collection {
    fn empty(dimensions: usize) -> Self {
        Self { dimensions, records: BTreeMap::new() }
    }
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as a map from collection name to id-keyed
/// records. All operations are async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("collection_p1", 384, false).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(name: &str) -> RagError {
        RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{name}' does not exist"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize, reset: bool) -> Result<()> {
        let mut collections = self.collections.write().await;
        if reset {
            collections.insert(name.to_string(), Collection::empty(dimensions));
        } else {
            collections.entry(name.to_string()).or_insert_with(|| Collection::empty(dimensions));
        }
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionInfo> {
        let collections = self.collections.read().await;
        let collection = collections.get(name).ok_or_else(|| Self::missing(name))?;
        Ok(CollectionInfo {
            name: name.to_string(),
            dimensions: collection.dimensions,
            points_count: collection.records.len(),
        })
    }

    async fn insert_many(&self, name: &str, batch: &EmbeddedBatch) -> Result<()> {
        let aligned = batch.texts.len() == batch.metadata.len()
            && batch.texts.len() == batch.ids.len()
            && batch.texts.len() == batch.vectors.len();
        if !aligned {
            return Err(RagError::VectorStoreError {
                backend: "InMemory".to_string(),
                message: "batch lists are not aligned".to_string(),
            });
        }

        let mut collections = self.collections.write().await;
        let collection = collections.get_mut(name).ok_or_else(|| Self::missing(name))?;

        for i in 0..batch.len() {
            if batch.vectors[i].len() != collection.dimensions {
                return Err(RagError::VectorStoreError {
                    backend: "InMemory".to_string(),
                    message: format!(
                        "vector for id {} has {} dimensions, collection '{name}' expects {}",
                        batch.ids[i],
                        batch.vectors[i].len(),
                        collection.dimensions
                    ),
                });
            }
            collection.records.insert(
                batch.ids[i],
                Record {
                    text: batch.texts[i].clone(),
                    metadata: batch.metadata[i].clone(),
                    vector: batch.vectors[i].clone(),
                },
            );
        }
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let collection = collections.get(name).ok_or_else(|| Self::missing(name))?;

        let mut scored: Vec<SearchResult> = collection
            .records
            .iter()
            .map(|(&id, record)| SearchResult {
                id,
                text: record.text.clone(),
                score: cosine_similarity(&record.vector, embedding),
                metadata: record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}
