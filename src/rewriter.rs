//! Query rewriting via the generation model.

use std::sync::Arc;

use tracing::debug;

use crate::error::{RagError, Result};
use crate::llm::{GenerateOptions, LanguageModel};

/// Expands a user question into a better retrieval query.
///
/// A pure prompt-to-generation call: the instruction preserves meaning,
/// expands abbreviations, and forbids answering the question itself. No
/// retry logic lives here — retries, if any, belong to the generation
/// backend.
pub struct QueryRewriter {
    llm: Arc<dyn LanguageModel>,
    model: String,
    options: GenerateOptions,
}

impl QueryRewriter {
    /// Create a rewriter bound to a model and sampling options.
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>, options: GenerateOptions) -> Self {
        Self { llm, model: model.into(), options }
    }

    /// Rewrite `question` into a clearer search query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PromptError`] when the underlying generation
    /// call fails.
    pub async fn rewrite(&self, question: &str) -> Result<String> {
        debug!(model = %self.model, "rewriting query");

        let prompt = format!(
            "Rewrite the following question so it becomes a better search query \
for a document-based retrieval system.\n\n\
Guidelines:\n\
- Add missing context.\n\
- Expand abbreviations.\n\
- Clarify vague terms.\n\
- Keep the meaning the same.\n\
- Do NOT answer the question.\n\
- Return only the rewritten question.\n\n\
Original question:\n{question}\n"
        );

        let rewritten = self
            .llm
            .generate(&self.model, &prompt, &self.options)
            .await
            .map_err(|e| RagError::PromptError(format!("query rewrite failed: {e}")))?;

        Ok(rewritten.trim().to_string())
    }
}
