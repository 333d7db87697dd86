//! Shared test helpers.

use async_trait::async_trait;

use ragward::{EmbeddingProvider, Result};

/// Bag-of-words embeddings with a fixed hash, so texts sharing words get
/// high cosine similarity. Gives tests semantic control that the
/// hash-of-the-whole-text mock cannot.
pub struct LexicalEmbedder {
    dims: usize,
}

impl LexicalEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

fn bucket(word: &str, dims: usize) -> usize {
    let hash = word.bytes().fold(5381u64, |h, b| h.wrapping_mul(33).wrapping_add(b as u64));
    (hash % dims as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for LexicalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dims];
        for word in text.to_lowercase().split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if word.is_empty() {
                continue;
            }
            embedding[bucket(word, self.dims)] += 1.0;
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
