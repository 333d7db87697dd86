//! Deterministic mock providers for tests and demos.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::llm::{GenerateOptions, LanguageModel};

/// Hash-derived embeddings: deterministic, normalized, zero API keys.
///
/// The vector direction depends only on the text content, so identical
/// texts always embed identically — enough for exercising the pipeline,
/// with no semantic meaning whatsoever.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, value) in embedding.iter_mut().enumerate() {
            *value = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        // L2-normalise so cosine similarity is just the dot product.
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A scripted generation model.
///
/// Routes every prompt through a handler closure, which makes it easy to
/// return different replies for rewrite, rerank, and answer prompts in a
/// single test.
pub struct MockLlm {
    handler: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl MockLlm {
    /// Reply with the same text for every prompt.
    pub fn fixed(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self { handler: Box::new(move |_| reply.clone()) }
    }

    /// Route prompts through a custom handler.
    pub fn with_handler(handler: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler) }
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String> {
        Ok((self.handler)(prompt))
    }
}
