//! Integration tests for the indexing and answering pipelines, using
//! scriptable mock gateways and the in-memory vector store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use ragkit::{
    ChatTurn, Chunk, ChunkSource, EmbeddedBatch, EmbeddingKind, EmbeddingProvider,
    GenerationProvider, InMemoryVectorStore, Project, RagAnswerAssembler, RagConfig, RagError,
    Result, Retriever, SearchResult, EnTemplates, VectorIndexer, VectorStore,
};

/// An embedding provider scripted per text: canned vectors, forced empty
/// results, forced errors, and a deterministic fallback for everything else.
#[derive(Default)]
struct ScriptedEmbeddings {
    dims: usize,
    vectors: HashMap<String, Vec<f32>>,
    empty: HashSet<String>,
    errors: HashSet<String>,
}

impl ScriptedEmbeddings {
    fn new(dims: usize) -> Self {
        Self { dims, ..Self::default() }
    }

    fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    fn with_empty(mut self, text: &str) -> Self {
        self.empty.insert(text.to_string());
        self
    }

    fn with_error(mut self, text: &str) -> Self {
        self.errors.insert(text.to_string());
        self
    }

    fn fallback(&self, text: &str) -> Vec<f32> {
        let seed = text.bytes().fold(1u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        (0..self.dims)
            .map(|i| ((seed.wrapping_add(i as u32) % 97) as f32) / 97.0 + 0.01)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbeddings {
    async fn embed(&self, text: &str, _kind: EmbeddingKind) -> Result<Vec<f32>> {
        if self.errors.contains(text) {
            return Err(RagError::EmbeddingError {
                provider: "scripted".to_string(),
                message: format!("forced failure for '{text}'"),
            });
        }
        if self.empty.contains(text) {
            return Ok(Vec::new());
        }
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.fallback(text)))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// A vector store wrapper that records calls and can reject inserts.
struct RecordingStore {
    inner: InMemoryVectorStore,
    creates: Mutex<Vec<(String, bool)>>,
    insert_sizes: Mutex<Vec<usize>>,
    fail_insert_after: Mutex<Option<usize>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            creates: Mutex::new(Vec::new()),
            insert_sizes: Mutex::new(Vec::new()),
            fail_insert_after: Mutex::new(None),
        }
    }

    /// Reject every insert after the first `n` have succeeded.
    async fn fail_inserts_after(&self, n: usize) {
        *self.fail_insert_after.lock().await = Some(n);
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn create_collection(&self, name: &str, dimensions: usize, reset: bool) -> Result<()> {
        self.creates.lock().await.push((name.to_string(), reset));
        self.inner.create_collection(name, dimensions, reset).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn describe_collection(&self, name: &str) -> Result<ragkit::CollectionInfo> {
        self.inner.describe_collection(name).await
    }

    async fn insert_many(&self, collection: &str, batch: &EmbeddedBatch) -> Result<()> {
        let mut sizes = self.insert_sizes.lock().await;
        if let Some(limit) = *self.fail_insert_after.lock().await {
            if sizes.len() >= limit {
                return Err(RagError::VectorStoreError {
                    backend: "recording".to_string(),
                    message: "insert rejected".to_string(),
                });
            }
        }
        sizes.push(batch.len());
        self.inner.insert_many(collection, batch).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.inner.search(collection, embedding, limit).await
    }
}

/// A generation provider that returns a canned reply or a forced error.
struct CannedGeneration {
    reply: std::result::Result<String, String>,
}

impl CannedGeneration {
    fn replying(reply: &str) -> Self {
        Self { reply: Ok(reply.to_string()) }
    }

    fn failing(message: &str) -> Self {
        Self { reply: Err(message.to_string()) }
    }
}

#[async_trait]
impl GenerationProvider for CannedGeneration {
    async fn generate(&self, _prompt: &str, _history: &[ChatTurn]) -> Result<String> {
        self.reply.clone().map_err(|message| RagError::GenerationError {
            provider: "canned".to_string(),
            message,
        })
    }
}

/// A chunk source serving a fixed list of pages.
struct PagedSource {
    pages: Vec<Vec<Chunk>>,
}

#[async_trait]
impl ChunkSource for PagedSource {
    async fn get_page(&self, _project: &Project, page_no: usize) -> Result<Vec<Chunk>> {
        Ok(self.pages.get(page_no - 1).cloned().unwrap_or_default())
    }
}

fn chunk(text: &str) -> Chunk {
    Chunk::new(text, json!({ "source": "test" }))
}

fn chunks(n: usize, prefix: &str) -> Vec<Chunk> {
    (0..n).map(|i| chunk(&format!("{prefix} {i}"))).collect()
}

fn ids(n: usize) -> Vec<u64> {
    (0..n as u64).collect()
}

const DIMS: usize = 4;

#[tokio::test]
async fn failed_items_are_dropped_and_lists_stay_aligned() {
    let provider = Arc::new(
        ScriptedEmbeddings::new(DIMS).with_empty("chunk 2").with_error("chunk 4"),
    );
    let embedder = ragkit::BatchEmbedder::new(provider, 50);

    let texts: Vec<String> = (0..6).map(|i| format!("chunk {i}")).collect();
    let metadata: Vec<serde_json::Value> = (0..6).map(|i| json!({ "idx": i })).collect();
    let chunk_ids: Vec<u64> = (10..16).collect();

    let batch = embedder.embed_batch(&texts, &metadata, &chunk_ids).await;

    assert_eq!(batch.texts.len(), 4);
    assert_eq!(batch.metadata.len(), 4);
    assert_eq!(batch.ids.len(), 4);
    assert_eq!(batch.vectors.len(), 4);
    // Survivors keep their original order and id correspondence.
    assert_eq!(batch.texts, vec!["chunk 0", "chunk 1", "chunk 3", "chunk 5"]);
    assert_eq!(batch.ids, vec![10, 11, 13, 15]);
    assert_eq!(batch.metadata[2], json!({ "idx": 3 }));
}

#[tokio::test]
async fn hundred_and_one_chunks_form_three_batches() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(RecordingStore::new());
    let indexer = VectorIndexer::new(provider, store.clone(), RagConfig::default());

    let project = Project::new("batching");
    let chunks = chunks(101, "chunk");
    let inserted = indexer.try_index(&project, &chunks, &ids(101), true).await.unwrap();

    assert_eq!(inserted, 101);
    assert_eq!(*store.insert_sizes.lock().await, vec![50, 50, 1]);
    // Collection created once per call, not per batch.
    assert_eq!(store.creates.lock().await.len(), 1);
}

#[tokio::test]
async fn paged_run_resets_only_on_first_page() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(RecordingStore::new());
    let indexer = VectorIndexer::new(provider, store.clone(), RagConfig::default());

    let project = Project::new("paged");
    let source = PagedSource {
        pages: vec![chunks(2, "page one"), chunks(2, "page two"), chunks(1, "page three")],
    };

    let report = indexer.index_paged(&project, &source, true).await.unwrap();
    assert_eq!(report.pages, 3);
    assert_eq!(report.inserted, 5);

    let creates = store.creates.lock().await;
    assert_eq!(
        *creates,
        vec![
            ("collection_paged".to_string(), true),
            ("collection_paged".to_string(), false),
            ("collection_paged".to_string(), false),
        ]
    );
    drop(creates);

    // Later pages did not wipe earlier inserts, and ids span all pages.
    let info = indexer.collection_info(&project).await.unwrap();
    assert_eq!(info.points_count, 5);
    let results = store.search("collection_paged", &[0.5, 0.5, 0.5, 0.5], 10).await.unwrap();
    let mut found: Vec<u64> = results.iter().map(|r| r.id).collect();
    found.sort_unstable();
    assert_eq!(found, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn all_fail_batch_is_skipped_without_failing_the_call() {
    let provider = Arc::new(
        ScriptedEmbeddings::new(DIMS).with_empty("bad 0").with_error("bad 1"),
    );
    let store = Arc::new(RecordingStore::new());
    let indexer = VectorIndexer::new(provider, store.clone(), RagConfig::default());

    let project = Project::new("allfail");
    let all_bad = vec![chunk("bad 0"), chunk("bad 1")];

    assert!(indexer.index(&project, &all_bad, &ids(2), true).await);
    assert!(store.insert_sizes.lock().await.is_empty());
    assert_eq!(indexer.collection_info(&project).await.unwrap().points_count, 0);
}

#[tokio::test]
async fn insert_rejection_aborts_the_indexing_call() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(RecordingStore::new());
    store.fail_inserts_after(1).await;
    let indexer = VectorIndexer::new(provider, store.clone(), RagConfig::default());

    let project = Project::new("reject");
    let chunks = chunks(101, "chunk");

    let err = indexer.try_index(&project, &chunks, &ids(101), true).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreError { .. }));
    assert!(!indexer.index(&project, &chunks, &ids(101), true).await);
    // The first batch stays inserted; there is no rollback.
    assert_eq!(*store.insert_sizes.lock().await, vec![50]);
}

#[tokio::test]
async fn mismatched_ids_are_a_pipeline_error() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(RecordingStore::new());
    let indexer = VectorIndexer::new(provider, store, RagConfig::default());

    let project = Project::new("mismatch");
    let err = indexer.try_index(&project, &chunks(3, "chunk"), &ids(2), false).await.unwrap_err();
    assert!(matches!(err, RagError::PipelineError(_)));
}

#[tokio::test]
async fn empty_query_embedding_yields_no_results_sentinel() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS).with_empty(""));
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("collection_p1", DIMS, false).await.unwrap();

    let retriever = Retriever::new(provider, store);
    let project = Project::new("p1");

    assert!(retriever.search(&project, "", 5).await.is_none());
}

#[tokio::test]
async fn empty_search_results_collapse_to_none() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("collection_p1", DIMS, false).await.unwrap();

    let retriever = Retriever::new(provider, store);
    let project = Project::new("p1");

    assert!(retriever.search(&project, "anything", 5).await.is_none());
}

fn assembler_over(
    provider: Arc<ScriptedEmbeddings>,
    store: Arc<InMemoryVectorStore>,
    generation: Arc<dyn GenerationProvider>,
) -> RagAnswerAssembler {
    RagAnswerAssembler::new(
        Retriever::new(provider, store),
        Arc::new(EnTemplates::new()),
        generation,
    )
}

#[tokio::test]
async fn no_documents_short_circuits_to_absent_answer() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("collection_p1", DIMS, false).await.unwrap();

    let assembler =
        assembler_over(provider, store, Arc::new(CannedGeneration::replying("unused")));
    let project = Project::new("p1");

    assert!(assembler.try_answer(&project, "query", 5).await.unwrap().is_none());
    assert!(assembler.answer(&project, "query", 5).await.is_none());
}

#[tokio::test]
async fn documents_are_rendered_in_retrieval_order() {
    let provider = Arc::new(
        ScriptedEmbeddings::new(2).with_vector("ranked query", vec![1.0, 0.0]),
    );
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("collection_p1", 2, false).await.unwrap();
    store
        .insert_many(
            "collection_p1",
            &EmbeddedBatch {
                texts: vec!["alpha".into(), "beta".into(), "gamma".into()],
                metadata: vec![json!({}), json!({}), json!({})],
                ids: vec![0, 1, 2],
                vectors: vec![vec![1.0, 0.0], vec![0.8, 0.6], vec![0.0, 1.0]],
            },
        )
        .await
        .unwrap();

    let assembler = assembler_over(provider, store, Arc::new(CannedGeneration::replying("ok")));
    let project = Project::new("p1");

    let answer = assembler.answer(&project, "ranked query", 3).await.unwrap();

    let first = answer.full_prompt.find("## Document No: 1\n### Content: alpha").unwrap();
    let second = answer.full_prompt.find("## Document No: 2\n### Content: beta").unwrap();
    let third = answer.full_prompt.find("## Document No: 3\n### Content: gamma").unwrap();
    assert!(first < second && second < third);

    // One system turn carrying the rendered system prompt.
    assert_eq!(answer.chat_history.len(), 1);
    assert_eq!(answer.chat_history[0].role, ragkit::ChatRole::System);
    assert!(answer.chat_history[0].content.starts_with("You are an assistant"));

    // Documents block and footer joined by a blank line, query verbatim.
    assert!(answer.full_prompt.contains("\n\n"));
    assert!(answer.full_prompt.contains("## Question:\nranked query"));
    assert_eq!(answer.answer, "ok");
}

#[tokio::test]
async fn generation_failure_collapses_the_whole_triple() {
    let provider = Arc::new(ScriptedEmbeddings::new(DIMS));
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("collection_p1", DIMS, false).await.unwrap();
    store
        .insert_many(
            "collection_p1",
            &EmbeddedBatch {
                texts: vec!["doc".into()],
                metadata: vec![json!({})],
                ids: vec![0],
                vectors: vec![vec![0.1, 0.2, 0.3, 0.4]],
            },
        )
        .await
        .unwrap();

    let assembler =
        assembler_over(provider, store, Arc::new(CannedGeneration::failing("model down")));
    let project = Project::new("p1");

    assert!(assembler.answer(&project, "query", 5).await.is_none());
}

#[tokio::test]
async fn end_to_end_index_then_search() {
    let provider = Arc::new(
        ScriptedEmbeddings::new(2)
            .with_vector("cat food", vec![1.0, 0.0])
            .with_vector("dog food", vec![0.6, 0.8])
            .with_vector("pet food", vec![1.0, 0.0]),
    );
    let store = Arc::new(RecordingStore::new());
    let indexer = VectorIndexer::new(provider.clone(), store.clone(), RagConfig::default());

    let project = Project::new("p1");
    let chunks = vec![chunk("cat food"), chunk("dog food")];
    assert!(indexer.index(&project, &chunks, &[0, 1], true).await);

    // One batch, collection created with reset, both vectors inserted.
    assert_eq!(*store.creates.lock().await, vec![("collection_p1".to_string(), true)]);
    assert_eq!(*store.insert_sizes.lock().await, vec![2]);
    let info = indexer.collection_info(&project).await.unwrap();
    assert_eq!(info.name, "collection_p1");
    assert_eq!(info.points_count, 2);

    let retriever = Retriever::new(provider, store);
    let results = retriever.search(&project, "pet food", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "cat food");
    assert_eq!(results[0].id, 0);
    assert_eq!(results[1].text, "dog food");
    assert_eq!(results[1].id, 1);
    assert!(results[0].score >= results[1].score);
}
