//! Data types for projects, chunks, search results, and RAG answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A project whose chunks are indexed into one dedicated vector collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Identifier used to derive the project's collection name.
    pub project_id: String,
}

impl Project {
    /// Create a project with the given identifier.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self { project_id: project_id.into() }
    }

    /// The deterministic name of this project's vector collection.
    pub fn collection_name(&self) -> String {
        format!("collection_{}", self.project_id).trim().to_string()
    }
}

/// An ordered unit of text with associated metadata.
///
/// Integer record ids are assigned externally by the indexing driver and
/// travel alongside chunk slices rather than inside the chunk itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Arbitrary JSON metadata associated with the chunk.
    pub metadata: Value,
}

impl Chunk {
    /// Create a chunk from text and metadata.
    pub fn new(text: impl Into<String>, metadata: Value) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// One retrieved record: stored text, metadata, record id, and the
/// similarity score reported by the vector store (higher is more relevant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The stored record id.
    pub id: u64,
    /// The stored chunk text.
    pub text: String,
    /// The similarity score assigned by the store.
    pub score: f32,
    /// The stored chunk metadata.
    pub metadata: Value,
}

/// Summary of a vector collection's contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionInfo {
    /// The collection name.
    pub name: String,
    /// Dimensionality of the stored vectors.
    pub dimensions: usize,
    /// Number of records currently stored.
    pub points_count: usize,
}

/// The role attached to a prompt turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// A single role-tagged prompt turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    /// The role this turn is attributed to.
    pub role: ChatRole,
    /// The turn's text content.
    pub content: String,
}

impl ChatTurn {
    /// Create a turn with the given role and content.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A generated answer together with the exact inputs that produced it.
///
/// The full prompt and chat history are returned verbatim so callers can
/// audit or replay the generation with identical input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagAnswer {
    /// The generated answer text.
    pub answer: String,
    /// The exact prompt submitted to the generation model.
    pub full_prompt: String,
    /// The chat history submitted alongside the prompt.
    pub chat_history: Vec<ChatTurn>,
}
