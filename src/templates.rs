//! Prompt template source trait and the built-in English RAG templates.
//!
//! Templates are addressed by `(group, key)` and use `$name` placeholders.
//! Every placeholder must be supplied by the caller; a leftover placeholder
//! is a caller error, not silently passed through.

use crate::error::{RagError, Result};

/// A source of named, parameterized prompt templates.
pub trait TemplateSource: Send + Sync {
    /// Render the template at `(group, key)`, substituting `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::TemplateError`] if the template does not exist,
    /// a placeholder has no matching variable, or a supplied variable is
    /// not referenced by the template.
    fn render(&self, group: &str, key: &str, vars: &[(&str, String)]) -> Result<String>;
}

/// Substitute `$name` placeholders in `template` from `vars`.
///
/// A `$` not followed by an identifier character is kept literally.
fn substitute(group: &str, key: &str, template: &str, vars: &[(&str, String)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut used = vec![false; vars.len()];
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push('$');
            continue;
        }
        match vars.iter().position(|(k, _)| *k == name) {
            Some(pos) => {
                used[pos] = true;
                out.push_str(&vars[pos].1);
            }
            None => {
                return Err(RagError::TemplateError(format!(
                    "unresolved placeholder '${name}' in template '{group}/{key}'"
                )));
            }
        }
    }

    if let Some(pos) = used.iter().position(|u| !u) {
        return Err(RagError::TemplateError(format!(
            "variable '{}' is not referenced by template '{group}/{key}'",
            vars[pos].0
        )));
    }

    Ok(out)
}

/// The built-in English prompt templates under the `rag` group.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnTemplates;

impl EnTemplates {
    /// Create the English template source.
    pub fn new() -> Self {
        Self
    }
}

const RAG_SYSTEM_PROMPT: &str = "\
You are an assistant tasked with generating a response based on the user's query.
You will be provided with a set of documents related to the user's query.
Your goal is to generate a response based on these documents.
Ignore documents that are not relevant to the user's query.
If the documents do not provide a sufficient answer, be polite and concise in stating that you can't help further.
Generate your response in the same language as the user's query.
Be polite, precise, and respectful.
Avoid unnecessary information and focus on the key points from the relevant documents.
In your answer, mention that the response is based on the documents provided by the user.";

const RAG_DOCUMENT_PROMPT: &str = "\
## Document No: $doc_num
### Content: $chunk_text";

const RAG_FOOTER_PROMPT: &str = "\
Based only on the documents provided above, please generate a clear and concise answer for the user.
If the documents are similar, summarize key details rather than repeating them.
## Question:
$query

## Answer:";

impl TemplateSource for EnTemplates {
    fn render(&self, group: &str, key: &str, vars: &[(&str, String)]) -> Result<String> {
        let template = match (group, key) {
            ("rag", "system_prompt") => RAG_SYSTEM_PROMPT,
            ("rag", "document_prompt") => RAG_DOCUMENT_PROMPT,
            ("rag", "footer_prompt") => RAG_FOOTER_PROMPT,
            _ => {
                return Err(RagError::TemplateError(format!("unknown template '{group}/{key}'")));
            }
        };
        substitute(group, key, template, vars)
    }
}
