//! # ragward
//!
//! Guarded Retrieval-Augmented Generation: a document pipeline that
//! chunks and embeds uploaded text into a persistent vector index, and at
//! query time retrieves, reranks, and synthesizes an answer — then runs
//! that answer through a multi-signal guardrail before anyone sees it.
//!
//! ## Overview
//!
//! - [`SentenceChunker`] — lossless, offset-tracked sentence chunking
//! - [`DiskVectorStore`] — persistent flat index with hybrid
//!   vector + keyword search and rebuild-on-delete
//! - [`QueryRewriter`] / [`LlmReranker`] — LLM-assisted retrieval
//! - [`AnswerEvaluator`] — lexical, semantic, hallucination, citation,
//!   and safety signals
//! - [`guardrail_decision`] — ordered rule chain producing an
//!   allow / warn / block verdict
//! - [`MemoryStore`] — per-session chat history with summarization
//! - [`RagPipeline`] — the orchestrator tying it all together
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragward::{DiskVectorStore, RagConfig, RagPipeline};
//! use ragward::ollama::OllamaClient;
//!
//! let config = RagConfig::from_env()?;
//! let client = Arc::new(OllamaClient::from_env());
//! let store = Arc::new(DiskVectorStore::open("db", client.dimensions()).await?);
//!
//! let pipeline = RagPipeline::builder()
//!     .config(config)
//!     .embedding_provider(client.clone())
//!     .language_model(client)
//!     .vector_store(store)
//!     .build()?;
//!
//! pipeline.ingest("Items can be returned within 30 days...", None).await?;
//! let outcome = pipeline.answer("what is the return window?", &Default::default()).await?;
//! println!("{}", outcome.decision.final_answer);
//! ```

pub mod chunking;
pub mod config;
pub mod diskstore;
pub mod document;
pub mod embedding;
pub mod error;
pub mod evaluator;
pub mod guardrail;
pub mod index;
pub mod llm;
pub mod memory;
pub mod mock;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod reranker;
pub mod rewriter;
pub mod vectorstore;

pub use chunking::SentenceChunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use diskstore::DiskVectorStore;
pub use document::{Chunk, Message, Role, ScoredChunk, Source};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use evaluator::{
    AnswerEvaluation, AnswerEvaluator, Citation, ConfidenceLabel, EvaluationReport,
    HallucinationCheck, SafetyCheck, SemanticScore,
};
pub use guardrail::{
    compute_confidence, guardrail_decision, ConfidenceLevel, ConfidenceReport, GuardrailDecision,
};
pub use index::FlatIndex;
pub use llm::{GenerateOptions, LanguageModel};
pub use memory::{summarize_messages, MemoryStore};
pub use pipeline::{ChatOutcome, QueryOptions, QueryOutcome, RagPipeline, RagPipelineBuilder};
pub use reranker::{LlmReranker, Reranker};
pub use rewriter::QueryRewriter;
pub use vectorstore::VectorStore;
