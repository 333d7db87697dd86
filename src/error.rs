//! Error types for the `ragward` crate.

use thiserror::Error;

/// Errors that can occur in the RAG pipeline.
///
/// Each pipeline stage wraps collaborator failures into its own variant;
/// the orchestrator only uses [`RagError::PipelineError`] for failures that
/// do not belong to a specific stage.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store or its underlying index.
    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    /// An error occurred while reranking retrieved chunks.
    #[error("Rerank error: {0}")]
    RerankError(String),

    /// An error occurred while rewriting a question or building a prompt.
    #[error("Prompt error: {0}")]
    PromptError(String),

    /// The generation model failed.
    #[error("LLM error ({model}): {message}")]
    LlmError {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
