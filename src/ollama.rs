//! Ollama-backed embedding and generation providers.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{GenerateOptions, LanguageModel};

/// Default address of a local Ollama server.
const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default embedding model served by Ollama.
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Dimensionality of `nomic-embed-text` vectors.
const DEFAULT_DIMENSIONS: usize = 768;

/// A client for a local Ollama server, implementing both
/// [`EmbeddingProvider`] and [`LanguageModel`].
///
/// Uses `reqwest` against the `/api/embeddings` and `/api/generate`
/// endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use ragward::ollama::OllamaClient;
///
/// let client = OllamaClient::from_env();
/// let embedding = client.embed("hello world").await?;
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    host: String,
    embedding_model: String,
    dimensions: usize,
}

impl OllamaClient {
    /// Create a client for the given host, e.g. `http://localhost:11434`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Create a client from the `OLLAMA_HOST` environment variable,
    /// falling back to the default local address.
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Self::new(host)
    }

    /// Set the embedding model and its output dimensionality.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.dimensions = dimensions;
        self
    }

    async fn read_error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        format!("server returned {status}: {detail}")
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Trait implementations ──────────────────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", text_len = text.len(), "embedding text");

        let request = EmbeddingsRequest { model: &self.embedding_model, prompt: text };
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "embedding request failed");
                RagError::EmbeddingError {
                    provider: "Ollama".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let message = Self::read_error_body(response).await;
            error!(provider = "Ollama", message = %message, "embedding API error");
            return Err(RagError::EmbeddingError { provider: "Ollama".into(), message });
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            RagError::EmbeddingError {
                provider: "Ollama".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String> {
        debug!(model, prompt_len = prompt.len(), "generating completion");

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: SamplingOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model, error = %e, "generation request failed");
                RagError::LlmError { model: model.into(), message: format!("request failed: {e}") }
            })?;

        if !response.status().is_success() {
            let message = Self::read_error_body(response).await;
            error!(model, message = %message, "generation API error");
            return Err(RagError::LlmError { model: model.into(), message });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            RagError::LlmError {
                model: model.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.response)
    }
}
