//! Retrieval-to-prompt assembly and answer generation.
//!
//! [`RagAnswerAssembler`] retrieves the documents most similar to a query,
//! renders them into a prompt in retrieval order, and asks the generation
//! provider for an answer. The answer is returned together with the exact
//! prompt and chat history that produced it.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{ChatRole, Project, RagAnswer};
use crate::error::Result;
use crate::generation::GenerationProvider;
use crate::retriever::Retriever;
use crate::templates::TemplateSource;

/// Assembles retrieved documents into a generation prompt and produces
/// the final RAG answer.
pub struct RagAnswerAssembler {
    retriever: Retriever,
    templates: Arc<dyn TemplateSource>,
    generation: Arc<dyn GenerationProvider>,
}

impl RagAnswerAssembler {
    /// Create an assembler from a retriever, a template source, and a
    /// generation provider.
    pub fn new(
        retriever: Retriever,
        templates: Arc<dyn TemplateSource>,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self { retriever, templates, generation }
    }

    /// Answer `query` using up to `limit` retrieved documents.
    ///
    /// Returns `Ok(None)` when retrieval produces no documents; there is
    /// nothing to ground an answer on and that is not an error.
    ///
    /// # Errors
    ///
    /// Surfaces embedding, store, template, and generation errors.
    pub async fn try_answer(
        &self,
        project: &Project,
        query: &str,
        limit: usize,
    ) -> Result<Option<RagAnswer>> {
        let documents = self.retriever.try_search(project, query, limit).await?;
        if documents.is_empty() {
            info!(project_id = %project.project_id, "no documents retrieved, skipping generation");
            return Ok(None);
        }

        let system_prompt = self.templates.render("rag", "system_prompt", &[])?;

        // Documents are rendered in retrieval order; the store's ranking
        // is preserved verbatim.
        let documents_prompt = documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                self.templates.render(
                    "rag",
                    "document_prompt",
                    &[("doc_num", (idx + 1).to_string()), ("chunk_text", doc.text.clone())],
                )
            })
            .collect::<Result<Vec<String>>>()?
            .join("\n");

        let footer_prompt =
            self.templates.render("rag", "footer_prompt", &[("query", query.to_string())])?;

        let chat_history = vec![self.generation.construct_turn(&system_prompt, ChatRole::System)];
        let full_prompt = format!("{documents_prompt}\n\n{footer_prompt}");

        let answer = self.generation.generate(&full_prompt, &chat_history).await?;

        info!(project_id = %project.project_id, documents = documents.len(), "rag answer generated");
        Ok(Some(RagAnswer { answer, full_prompt, chat_history }))
    }

    /// Collapsed form of [`try_answer`](Self::try_answer): any failure is
    /// logged and reported as `None`, indistinguishable from "no documents
    /// retrieved".
    pub async fn answer(&self, project: &Project, query: &str, limit: usize) -> Option<RagAnswer> {
        match self.try_answer(project, query, limit).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(project_id = %project.project_id, error = %e, "rag answer failed");
                None
            }
        }
    }
}
