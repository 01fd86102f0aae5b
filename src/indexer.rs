//! Per-project vector indexing: collection lifecycle, batched embedding,
//! bulk insertion, and the paged indexing run.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::batch::BatchEmbedder;
use crate::config::RagConfig;
use crate::document::{Chunk, CollectionInfo, Project};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A paged source of chunks for one project.
///
/// Pages are numbered from 1; an empty page signals the end of the source.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Fetch one page of chunks in their stored order.
    async fn get_page(&self, project: &Project, page_no: usize) -> Result<Vec<Chunk>>;
}

/// Indexes a project's chunks into its vector collection.
///
/// Owns the project-to-collection naming, drives collection creation and
/// reset, and feeds each batch's surviving embeddings into the store.
pub struct VectorIndexer {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    embedder: BatchEmbedder,
}

impl VectorIndexer {
    /// Create an indexer from an embedding provider, a vector store, and
    /// the pipeline configuration.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        let embedder = BatchEmbedder::new(Arc::clone(&provider), config.batch_size);
        Self { provider, store, embedder }
    }

    /// Index `chunks` with their externally assigned `ids` into the
    /// project's collection, returning the number of records inserted.
    ///
    /// The collection is created (reset first when `reset` is true) once
    /// per call, then the chunks are embedded in batches. A batch whose
    /// items all failed to embed is skipped; a store insert rejection
    /// aborts the call without rolling back earlier batches.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if `chunks` and `ids` have
    /// different lengths, or the underlying store/provider error when
    /// collection creation or insertion fails.
    pub async fn try_index(
        &self,
        project: &Project,
        chunks: &[Chunk],
        ids: &[u64],
        reset: bool,
    ) -> Result<usize> {
        if chunks.len() != ids.len() {
            return Err(RagError::PipelineError(format!(
                "chunks ({}) and ids ({}) must have the same length",
                chunks.len(),
                ids.len()
            )));
        }

        let collection = project.collection_name();
        self.store.create_collection(&collection, self.provider.dimensions(), reset).await?;

        let batch_size = self.embedder.batch_size();
        let num_batches = self.embedder.num_batches(chunks.len());
        info!(collection = %collection, total_chunks = chunks.len(), num_batches, "indexing chunks");

        let mut inserted = 0;
        for (batch_no, (chunk_batch, id_batch)) in
            chunks.chunks(batch_size).zip(ids.chunks(batch_size)).enumerate()
        {
            let texts: Vec<String> = chunk_batch.iter().map(|c| c.text.clone()).collect();
            let metadata: Vec<Value> = chunk_batch.iter().map(|c| c.metadata.clone()).collect();

            let embedded = self.embedder.embed_batch(&texts, &metadata, id_batch).await;
            if embedded.is_empty() {
                info!(batch = batch_no + 1, num_batches, "no surviving embeddings, skipping batch");
                continue;
            }

            self.store.insert_many(&collection, &embedded).await.inspect_err(|e| {
                error!(collection = %collection, batch = batch_no + 1, error = %e, "batch insert failed");
            })?;

            inserted += embedded.len();
            info!(batch = batch_no + 1, num_batches, count = embedded.len(), "inserted batch");
        }

        Ok(inserted)
    }

    /// Collapsed form of [`try_index`](Self::try_index): any failure is
    /// logged and reported as `false`.
    pub async fn index(
        &self,
        project: &Project,
        chunks: &[Chunk],
        ids: &[u64],
        reset: bool,
    ) -> bool {
        match self.try_index(project, chunks, ids, reset).await {
            Ok(_) => true,
            Err(e) => {
                error!(project_id = %project.project_id, error = %e, "indexing failed");
                false
            }
        }
    }

    /// Drop the project's collection and all its contents.
    pub async fn reset_collection(&self, project: &Project) -> Result<()> {
        self.store.delete_collection(&project.collection_name()).await
    }

    /// Describe the project's collection.
    pub async fn collection_info(&self, project: &Project) -> Result<CollectionInfo> {
        self.store.describe_collection(&project.collection_name()).await
    }

    /// Run a full paged indexing pass for the project.
    ///
    /// Convenience for [`IndexRun::new`] followed by [`IndexRun::run`].
    pub async fn index_paged(
        &self,
        project: &Project,
        source: &dyn ChunkSource,
        reset: bool,
    ) -> Result<IndexReport> {
        IndexRun::new(self, project, reset).run(source).await
    }
}

/// The state of a paged indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting to pull the next page from the chunk source.
    AwaitingPage,
    /// Indexing the current page.
    Indexing,
    /// The source returned an empty page; the run is complete.
    Done,
    /// A page failed to index; the run stopped.
    Failed,
}

/// Summary of a completed paged indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Number of non-empty pages indexed.
    pub pages: usize,
    /// Total records inserted across all pages.
    pub inserted: usize,
}

/// A paged indexing run over a [`ChunkSource`].
///
/// Pulls pages until an empty one, assigning record ids as one strictly
/// increasing sequence across pages. The caller's `reset` request applies
/// to the first page only; every later page is indexed with `reset =
/// false` so it never wipes earlier pages' inserts.
pub struct IndexRun<'a> {
    indexer: &'a VectorIndexer,
    project: &'a Project,
    reset_first_page: bool,
    state: RunState,
    next_id: u64,
}

impl<'a> IndexRun<'a> {
    /// Start a run for `project`; `reset` applies to the first page only.
    pub fn new(indexer: &'a VectorIndexer, project: &'a Project, reset: bool) -> Self {
        Self { indexer, project, reset_first_page: reset, state: RunState::AwaitingPage, next_id: 0 }
    }

    /// The run's current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the run to completion.
    ///
    /// # Errors
    ///
    /// Surfaces the first page-fetch or indexing error; the run is left in
    /// [`RunState::Failed`] and already-inserted pages are kept.
    pub async fn run(mut self, source: &dyn ChunkSource) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        let mut page_no = 1;

        while self.state == RunState::AwaitingPage {
            let page = match source.get_page(self.project, page_no).await {
                Ok(page) => page,
                Err(e) => {
                    self.state = RunState::Failed;
                    error!(project_id = %self.project.project_id, page_no, error = %e, "failed to fetch page");
                    return Err(e);
                }
            };

            if page.is_empty() {
                self.state = RunState::Done;
                break;
            }
            self.state = RunState::Indexing;

            let ids: Vec<u64> = (self.next_id..self.next_id + page.len() as u64).collect();
            let reset = self.reset_first_page && page_no == 1;

            match self.indexer.try_index(self.project, &page, &ids, reset).await {
                Ok(inserted) => {
                    report.pages += 1;
                    report.inserted += inserted;
                    self.next_id += page.len() as u64;
                    page_no += 1;
                    self.state = RunState::AwaitingPage;
                }
                Err(e) => {
                    self.state = RunState::Failed;
                    error!(project_id = %self.project.project_id, page_no, error = %e, "page indexing failed");
                    return Err(e);
                }
            }
        }

        info!(
            project_id = %self.project.project_id,
            pages = report.pages,
            inserted = report.inserted,
            "paged indexing run complete"
        );
        Ok(report)
    }
}
