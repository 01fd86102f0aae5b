//! Generation provider trait for producing completions from prompts.

use async_trait::async_trait;

use crate::document::{ChatRole, ChatTurn};
use crate::error::Result;

/// A provider that generates text completions from a prompt and chat history.
///
/// Implementations wrap specific generation backends behind a unified
/// async interface. Providers also own turn construction so that backends
/// with non-standard role encodings can override it.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Build a role-tagged prompt turn.
    fn construct_turn(&self, text: &str, role: ChatRole) -> ChatTurn {
        ChatTurn::new(role, text)
    }

    /// Generate a completion for `prompt`, conditioned on `history`.
    ///
    /// An empty completion is an error; implementations should map their
    /// backend's "no output" case to [`RagError::GenerationError`].
    ///
    /// [`RagError::GenerationError`]: crate::error::RagError::GenerationError
    async fn generate(&self, prompt: &str, history: &[ChatTurn]) -> Result<String>;
}
