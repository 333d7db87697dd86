//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Name of the generation model used for rewriting, reranking, and answers.
    pub llm_model: String,
    /// Name of the embedding model.
    pub embedding_model: String,
    /// Maximum chunk size in characters.
    pub max_chunk_chars: usize,
    /// Soft overlap carried between consecutive chunks, in characters.
    pub overlap_chars: usize,
    /// Chunks shorter than this are absorbed into a neighbour instead of
    /// being emitted standalone.
    pub min_chunk_size: usize,
    /// Number of chunks returned from hybrid search.
    pub retrieval_k: usize,
    /// Number of top chunks reported back to callers as sources.
    pub top_k: usize,
    /// Whether retrieved chunks are reranked by the generation model.
    pub rerank_enabled: bool,
    /// Default sampling temperature for generation.
    pub temperature: f32,
    /// Default nucleus-sampling cutoff for generation.
    pub top_p: f32,
    /// Default top-k sampling cutoff for generation.
    pub sample_top_k: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            llm_model: "llama3.2:3b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            max_chunk_chars: 800,
            overlap_chars: 120,
            min_chunk_size: 200,
            retrieval_k: 10,
            top_k: 5,
            rerank_enabled: true,
            temperature: 0.2,
            top_p: 0.9,
            sample_top_k: 40,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from `RAG_*` environment variables.
    ///
    /// Recognised variables: `RAG_LLM_MODEL`, `RAG_EMBED_MODEL`,
    /// `RAG_TOP_K`, `RAG_RERANK`, `RAG_TEMPERATURE`, `RAG_TOP_P`.
    /// Unset or unparsable variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the resulting configuration
    /// fails validation.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(model) = std::env::var("RAG_LLM_MODEL") {
            builder = builder.llm_model(model);
        }
        if let Ok(model) = std::env::var("RAG_EMBED_MODEL") {
            builder = builder.embedding_model(model);
        }
        if let Some(top_k) = env_parse::<usize>("RAG_TOP_K") {
            builder = builder.top_k(top_k);
        }
        if let Ok(rerank) = std::env::var("RAG_RERANK") {
            builder = builder.rerank_enabled(rerank.to_lowercase() == "true");
        }
        if let Some(temperature) = env_parse::<f32>("RAG_TEMPERATURE") {
            builder = builder.temperature(temperature);
        }
        if let Some(top_p) = env_parse::<f32>("RAG_TOP_P") {
            builder = builder.top_p(top_p);
        }

        builder.build()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the generation model name.
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm_model = model.into();
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn max_chunk_chars(mut self, chars: usize) -> Self {
        self.config.max_chunk_chars = chars;
        self
    }

    /// Set the soft overlap between consecutive chunks in characters.
    pub fn overlap_chars(mut self, chars: usize) -> Self {
        self.config.overlap_chars = chars;
        self
    }

    /// Set the minimum emitted chunk size in characters.
    pub fn min_chunk_size(mut self, chars: usize) -> Self {
        self.config.min_chunk_size = chars;
        self
    }

    /// Set the number of chunks returned from hybrid search.
    pub fn retrieval_k(mut self, k: usize) -> Self {
        self.config.retrieval_k = k;
        self
    }

    /// Set the number of top chunks reported as sources.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Enable or disable LLM reranking of retrieved chunks.
    pub fn rerank_enabled(mut self, enabled: bool) -> Self {
        self.config.rerank_enabled = enabled;
        self
    }

    /// Set the default sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the default nucleus-sampling cutoff.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = top_p;
        self
    }

    /// Set the default top-k sampling cutoff.
    pub fn sample_top_k(mut self, top_k: u32) -> Self {
        self.config.sample_top_k = top_k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `overlap_chars >= max_chunk_chars`
    /// - `retrieval_k == 0` or `top_k == 0`
    /// - `temperature` is outside `[0.0, 1.5]`
    /// - `top_p` is outside `[0.0, 1.0]`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.overlap_chars >= config.max_chunk_chars {
            return Err(RagError::ConfigError(format!(
                "overlap_chars ({}) must be less than max_chunk_chars ({})",
                config.overlap_chars, config.max_chunk_chars
            )));
        }
        if config.retrieval_k == 0 {
            return Err(RagError::ConfigError("retrieval_k must be greater than zero".to_string()));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=1.5).contains(&config.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be within [0.0, 1.5]",
                config.temperature
            )));
        }
        if !(0.0..=1.0).contains(&config.top_p) {
            return Err(RagError::ConfigError(format!(
                "top_p ({}) must be within [0.0, 1.0]",
                config.top_p
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn overlap_must_be_less_than_chunk_size() {
        let result = RagConfig::builder().max_chunk_chars(200).overlap_chars(200).build();
        assert!(matches!(result, Err(RagError::ConfigError(_))));
    }

    #[test]
    fn zero_retrieval_k_is_rejected() {
        let result = RagConfig::builder().retrieval_k(0).build();
        assert!(matches!(result, Err(RagError::ConfigError(_))));
    }
}
