//! Generation model trait and sampling options.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling options forwarded to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus-sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { temperature: 0.2, top_p: 0.9, top_k: 40 }
    }
}

/// A text-generation model behind an async interface.
///
/// The pipeline treats generation as an opaque collaborator: prompt in,
/// text out. Implementations wrap a concrete backend (a local Ollama
/// server, a hosted API, a scripted mock) and report failures as
/// [`RagError::LlmError`](crate::RagError::LlmError).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt` with the named model.
    async fn generate(&self, model: &str, prompt: &str, options: &GenerateOptions)
        -> Result<String>;
}
