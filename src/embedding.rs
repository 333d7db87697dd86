//! Embedding provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns text into fixed-dimension embedding vectors.
///
/// Implementations wrap a concrete embedding backend behind a unified
/// async interface. Vectors are produced once at indexing or evaluation
/// time and never mutated afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use ragward::EmbeddingProvider;
///
/// let embedding = provider.embed("return policy").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially. Backends with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimensionality of the vectors produced by this provider.
    fn dimensions(&self) -> usize;
}
