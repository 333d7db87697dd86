//! RAG pipeline orchestrator.
//!
//! [`RagPipeline`] composes the chunker, embedding provider, vector store,
//! query rewriter, reranker, generation model, evaluator, guardrail, and
//! session memory into the full ingest-and-answer workflow.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragward::{DiskVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .language_model(Arc::new(llm))
//!     .vector_store(Arc::new(DiskVectorStore::open("db", 768).await?))
//!     .build()?;
//!
//! pipeline.ingest(&document_text, None).await?;
//! let outcome = pipeline.answer("what is the refund window?", &Default::default()).await?;
//! println!("{}", outcome.decision.final_answer);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::SentenceChunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Role, Source};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::evaluator::{
    AnswerEvaluation, AnswerEvaluator, Citation, HallucinationCheck, SafetyCheck, SemanticScore,
};
use crate::guardrail::{compute_confidence, guardrail_decision, ConfidenceReport, GuardrailDecision};
use crate::llm::{GenerateOptions, LanguageModel};
use crate::memory::{summarize_messages, MemoryStore};
use crate::prompt::{build_rag_prompt, decode_escapes};
use crate::reranker::{LlmReranker, Reranker};
use crate::rewriter::QueryRewriter;
use crate::vectorstore::VectorStore;

/// Per-request overrides for the generation call. Unset fields fall back
/// to the pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryOptions {
    /// Generation model override.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Nucleus-sampling override.
    pub top_p: Option<f32>,
    /// Top-k sampling override.
    pub top_k: Option<u32>,
}

/// Everything produced for one answered query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryOutcome {
    /// The raw (escape-decoded) model answer, before guardrails.
    pub answer: String,
    /// The chunks supplied to the generation model.
    pub sources: Vec<Source>,
    /// Lexical overlap signal.
    pub evaluation: AnswerEvaluation,
    /// Whole-answer grounding signal.
    pub hallucination: HallucinationCheck,
    /// Per-chunk semantic similarity signal.
    pub semantic: SemanticScore,
    /// Per-sentence citation alignment.
    pub citations: Vec<Citation>,
    /// Safety classification.
    pub safety_check: SafetyCheck,
    /// Aggregate informational confidence.
    pub confidence: ConfidenceReport,
    /// The guardrail verdict, carrying the user-visible answer.
    pub decision: GuardrailDecision,
}

/// A [`QueryOutcome`] produced inside a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatOutcome {
    /// The full query outcome.
    #[serde(flatten)]
    pub outcome: QueryOutcome,
    /// The (possibly summarized) session history, one `role: content`
    /// line per message. Informational: it is not fed to generation.
    pub memory_context: String,
}

/// The RAG pipeline orchestrator. Construct via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LanguageModel>,
    store: Arc<dyn VectorStore>,
    reranker: Option<Arc<dyn Reranker>>,
    chunker: SentenceChunker,
    rewriter: QueryRewriter,
    evaluator: AnswerEvaluator,
    memory: MemoryStore,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The session memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// The vector store backend.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Split `text` into chunks without ingesting them.
    pub fn chunk_document(&self, text: &str, doc_id: Option<&str>) -> Vec<Chunk> {
        self.chunker.chunk(text, doc_id)
    }

    /// Ingest a document: chunk → embed → store → persist.
    ///
    /// Returns the stored chunks. A text that yields no chunks is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates embedding and vector store failures.
    pub async fn ingest(&self, text: &str, doc_id: Option<&str>) -> Result<Vec<Chunk>> {
        let chunks = self.chunker.chunk(text, doc_id);
        if chunks.is_empty() {
            info!(chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(doc_id = %chunks[0].doc_id, error = %e, "embedding failed during ingestion");
            e
        })?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            self.store.add(embedding, chunk.clone()).await?;
        }
        self.store.save().await?;

        info!(doc_id = %chunks[0].doc_id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Remove every chunk of `doc_id` and rebuild the index.
    ///
    /// Returns the number of chunks removed (0 when the document is
    /// unknown).
    pub async fn delete_document(&self, doc_id: &str) -> Result<usize> {
        self.store.delete(doc_id).await
    }

    /// Chunk counts keyed by document id.
    pub async fn documents(&self) -> HashMap<String, usize> {
        self.store.documents().await
    }

    /// All stored chunks of one document.
    pub async fn document_chunks(&self, doc_id: &str) -> Vec<Chunk> {
        self.store.chunks_for(doc_id).await
    }

    /// Answer a question over the indexed documents.
    ///
    /// Runs rewrite → embed → hybrid search → rerank → generate, then
    /// evaluates the answer and applies the guardrail. A blocked verdict
    /// is a successful outcome carrying a refusal, not an error.
    ///
    /// # Errors
    ///
    /// Propagates stage-specific failures ([`RagError::PromptError`],
    /// [`RagError::EmbeddingError`], [`RagError::VectorStoreError`],
    /// [`RagError::RerankError`], [`RagError::LlmError`]).
    pub async fn answer(&self, question: &str, options: &QueryOptions) -> Result<QueryOutcome> {
        let rewritten = self.rewriter.rewrite(question).await?;

        let query_embedding = self.embedder.embed(&rewritten).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;
        let retrieved =
            self.store.search(&query_embedding, self.config.retrieval_k, &rewritten).await?;

        let ranked: Vec<Chunk> = match (&self.reranker, self.config.rerank_enabled) {
            (Some(reranker), true) => {
                let scored = reranker.rerank(&rewritten, retrieved).await?;
                scored.into_iter().map(|s| s.chunk).collect()
            }
            _ => retrieved,
        };
        let top_chunks: Vec<Chunk> = ranked.into_iter().take(self.config.top_k).collect();

        let context = top_chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let prompt = build_rag_prompt(&context, question);

        let model = options.model.as_deref().unwrap_or(&self.config.llm_model);
        let generate_options = self.generate_options(options);
        let raw = self.llm.generate(model, &prompt, &generate_options).await.map_err(|e| {
            error!(model, error = %e, "answer generation failed");
            e
        })?;
        let answer = decode_escapes(&raw);

        let sources: Vec<Source> = top_chunks.iter().map(Source::from).collect();
        let report = self.evaluator.evaluate(&answer, &sources).await?;
        let confidence = compute_confidence(
            &report.evaluation,
            &report.semantic,
            &report.hallucination,
            &report.citations,
            &report.safety,
        );
        let decision = guardrail_decision(
            &answer,
            &report.evaluation,
            &report.hallucination,
            &report.semantic,
            &report.safety,
            &report.citations,
        );

        info!(
            allowed = decision.allowed,
            source_count = sources.len(),
            confidence = confidence.score,
            "answered query"
        );

        Ok(QueryOutcome {
            answer,
            sources,
            evaluation: report.evaluation,
            hallucination: report.hallucination,
            semantic: report.semantic,
            citations: report.citations,
            safety_check: report.safety,
            confidence,
            decision,
        })
    }

    /// Answer inside a chat session.
    ///
    /// Stores the user turn, summarizes the history into `memory_context`,
    /// runs the full answer pipeline, and stores the guardrail-approved
    /// answer as the assistant turn.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        options: &QueryOptions,
    ) -> Result<ChatOutcome> {
        self.memory.add_message(session_id, Role::User, message).await;

        let history = summarize_messages(&self.memory.messages(session_id).await);
        let memory_context = history
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let outcome = self.answer(message, options).await?;

        self.memory
            .add_message(session_id, Role::Assistant, outcome.decision.final_answer.clone())
            .await;

        Ok(ChatOutcome { outcome, memory_context })
    }

    /// Answer a question and stream the resulting text token-by-token.
    ///
    /// The stream yields the guardrail-approved `final_answer` itself,
    /// split at whitespace boundaries — the streamed text is pinned to the
    /// evaluated answer rather than being a second, independently
    /// generated completion.
    pub async fn answer_stream(
        &self,
        question: &str,
        options: &QueryOptions,
    ) -> Result<(QueryOutcome, impl Stream<Item = String> + Send)> {
        let outcome = self.answer(question, options).await?;
        let tokens: Vec<String> = outcome
            .decision
            .final_answer
            .split_inclusive(char::is_whitespace)
            .map(str::to_string)
            .collect();
        Ok((outcome, futures::stream::iter(tokens)))
    }

    fn generate_options(&self, options: &QueryOptions) -> GenerateOptions {
        GenerateOptions {
            temperature: options.temperature.unwrap_or(self.config.temperature),
            top_p: options.top_p.unwrap_or(self.config.top_p),
            top_k: options.top_k.unwrap_or(self.config.sample_top_k),
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, `language_model`, and `vector_store`
/// are required. A reranker is optional: when omitted and reranking is
/// enabled in the configuration, a default [`LlmReranker`] bound to the
/// configured model is used.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    llm: Option<Arc<dyn LanguageModel>>,
    store: Option<Arc<dyn VectorStore>>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation model.
    pub fn language_model(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a custom reranker.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Build the [`RagPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let llm = self
            .llm
            .ok_or_else(|| RagError::ConfigError("language_model is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        let base_options = GenerateOptions {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.sample_top_k,
        };

        // Rewriting and reranking always use the configured model, even
        // when a request overrides the answer model.
        let rewriter =
            QueryRewriter::new(llm.clone(), config.llm_model.clone(), base_options.clone());
        let reranker = self.reranker.or_else(|| {
            config.rerank_enabled.then(|| {
                Arc::new(LlmReranker::new(
                    llm.clone(),
                    config.llm_model.clone(),
                    base_options.clone(),
                )) as Arc<dyn Reranker>
            })
        });

        let chunker = SentenceChunker::new(&config);
        let evaluator = AnswerEvaluator::new(embedder.clone());

        Ok(RagPipeline {
            config,
            embedder,
            llm,
            store,
            reranker,
            chunker,
            rewriter,
            evaluator,
            memory: MemoryStore::new(),
        })
    }
}
