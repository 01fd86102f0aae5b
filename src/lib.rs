//! Batched vector indexing and retrieval-augmented generation for
//! per-project document collections.
//!
//! Each project owns one vector collection. Chunks of project text are
//! embedded in bounded batches and inserted into the collection; queries
//! are answered by embedding the query, retrieving the most similar
//! chunks, and assembling them into a prompt for a generation model.
//!
//! The pipeline is built from injected gateways: an [`EmbeddingProvider`],
//! a [`VectorStore`], a [`GenerationProvider`], and a [`TemplateSource`].
//! A cosine-similarity [`InMemoryVectorStore`] ships in the crate, and the
//! `openai` feature adds HTTP backends for embeddings and generation.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit::{
//!     InMemoryVectorStore, Project, RagAnswerAssembler, RagConfig, Retriever,
//!     EnTemplates, VectorIndexer,
//! };
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! let indexer = VectorIndexer::new(provider.clone(), store.clone(), RagConfig::default());
//!
//! let project = Project::new("p1");
//! indexer.index(&project, &chunks, &ids, true).await;
//!
//! let retriever = Retriever::new(provider, store);
//! let assembler = RagAnswerAssembler::new(retriever, Arc::new(EnTemplates::new()), generation);
//! let answer = assembler.answer(&project, "pet food", 5).await;
//! ```
//!
//! Per-item embedding failures are dropped and logged, never aborting a
//! batch; a vector store insert rejection aborts the indexing call. The
//! collapsed entry points (`index`, `search`, `answer`) report every
//! failure as `false`/`None` after logging it, while their `try_*`
//! siblings surface the underlying [`RagError`].

pub mod assembler;
pub mod batch;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retriever;
pub mod templates;
pub mod vectorstore;

pub use assembler::RagAnswerAssembler;
pub use batch::{BatchEmbedder, EmbeddedBatch};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    ChatRole, ChatTurn, Chunk, CollectionInfo, Project, RagAnswer, SearchResult,
};
pub use embedding::{EmbeddingKind, EmbeddingProvider};
pub use error::{RagError, Result};
pub use generation::GenerationProvider;
pub use indexer::{ChunkSource, IndexReport, IndexRun, RunState, VectorIndexer};
pub use inmemory::InMemoryVectorStore;
pub use retriever::Retriever;
pub use templates::{EnTemplates, TemplateSource};
pub use vectorstore::VectorStore;
