//! End-to-end pipeline behaviour with scripted providers.

mod common;

use std::sync::Arc;

use futures::StreamExt;

use common::LexicalEmbedder;
use ragward::guardrail::REFUSAL_MESSAGE;
use ragward::mock::MockLlm;
use ragward::{
    ConfidenceLevel, DiskVectorStore, EmbeddingProvider, LanguageModel, QueryOptions, RagConfig,
    RagPipeline, VectorStore,
};

const DIMS: usize = 256;

const POLICY_DOC: &str =
    "Items can be returned within 30 days in original packaging for a refund.";

const GROUNDED_ANSWER: &str = "Items can be returned within 30 days in original packaging";

/// Routes the three prompt shapes the pipeline produces: rewrite,
/// relevance rating, and the final answer.
fn scripted_llm(answer: &'static str) -> Arc<dyn LanguageModel> {
    Arc::new(MockLlm::with_handler(move |prompt| {
        if prompt.contains("Rewrite the following question") {
            "return window original packaging".to_string()
        } else if prompt.contains("You are a relevance evaluator.") {
            "90".to_string()
        } else {
            answer.to_string()
        }
    }))
}

async fn pipeline_with(
    dir: &std::path::Path,
    llm: Arc<dyn LanguageModel>,
) -> ragward::Result<RagPipeline> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(LexicalEmbedder::new(DIMS));
    let store: Arc<dyn VectorStore> = Arc::new(DiskVectorStore::open(dir, DIMS).await?);

    RagPipeline::builder()
        .config(RagConfig::builder().min_chunk_size(20).build()?)
        .embedding_provider(embedder)
        .language_model(llm)
        .vector_store(store)
        .build()
}

#[tokio::test]
async fn grounded_answer_passes_the_guardrail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(dir.path(), scripted_llm(GROUNDED_ANSWER)).await.unwrap();

    let chunks = pipeline.ingest(POLICY_DOC, Some("return_policy")).await.unwrap();
    assert_eq!(chunks.len(), 1);

    let outcome =
        pipeline.answer("what is the return window?", &QueryOptions::default()).await.unwrap();

    assert_eq!(outcome.answer, GROUNDED_ANSWER);
    assert_eq!(outcome.sources.len(), 1);
    assert_eq!(outcome.sources[0].doc_id, "return_policy");
    assert!(outcome.evaluation.overlap_score >= 3);
    assert!(!outcome.hallucination.hallucinated);
    assert!(outcome.safety_check.safe);

    assert!(outcome.decision.allowed);
    assert_eq!(outcome.decision.reason, None);
    assert_eq!(outcome.decision.final_answer, GROUNDED_ANSWER);
    assert_eq!(outcome.confidence.score, 100);
    assert_eq!(outcome.confidence.level, ConfidenceLevel::High);
}

#[tokio::test]
async fn empty_store_blocks_for_lack_of_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline =
        pipeline_with(dir.path(), scripted_llm("The moon is made of cheese")).await.unwrap();

    let outcome = pipeline.answer("what about the moon?", &QueryOptions::default()).await.unwrap();

    assert!(outcome.sources.is_empty());
    assert!(outcome.semantic.chunk_scores.is_empty());
    assert_eq!(outcome.semantic.average, 0.0);
    assert_eq!(outcome.hallucination.score, 0.0);

    // The evidence rule outranks the severe-hallucination rule, so an
    // empty context blocks as "no evidence" even though the hallucination
    // score is also below the hard floor.
    assert!(!outcome.decision.allowed);
    assert_eq!(outcome.decision.reason.as_deref(), Some("no_evidence_in_context"));
    assert_eq!(outcome.decision.final_answer, REFUSAL_MESSAGE);

    assert_eq!(outcome.confidence.score, 15);
    assert_eq!(outcome.confidence.level, ConfidenceLevel::VeryLow);
}

#[tokio::test]
async fn reranking_promotes_the_relevant_document() {
    let dir = tempfile::tempdir().unwrap();

    // Score chunks mentioning couriers highly, everything else poorly.
    let llm = Arc::new(MockLlm::with_handler(|prompt| {
        if prompt.contains("Rewrite the following question") {
            "express courier options".to_string()
        } else if prompt.contains("You are a relevance evaluator.") {
            if prompt.contains("courier") { "95".to_string() } else { "5".to_string() }
        } else {
            "Express couriers are available".to_string()
        }
    }));
    let pipeline = pipeline_with(dir.path(), llm).await.unwrap();

    pipeline
        .ingest("The warranty covers manufacturing defects for two years.", Some("warranty"))
        .await
        .unwrap();
    pipeline
        .ingest("Express couriers are available at checkout for urgent orders.", Some("couriers"))
        .await
        .unwrap();

    let outcome = pipeline.answer("how fast can you ship?", &QueryOptions::default()).await.unwrap();
    assert_eq!(outcome.sources[0].doc_id, "couriers");
}

#[tokio::test]
async fn delete_document_empties_retrieval_for_that_doc() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(dir.path(), scripted_llm(GROUNDED_ANSWER)).await.unwrap();

    pipeline.ingest(POLICY_DOC, Some("return_policy")).await.unwrap();
    pipeline.ingest("Gift cards never expire and hold their balance.", Some("gift_cards")).await.unwrap();

    let documents = pipeline.documents().await;
    assert_eq!(documents.len(), 2);

    let removed = pipeline.delete_document("return_policy").await.unwrap();
    assert_eq!(removed, 1);
    assert!(pipeline.document_chunks("return_policy").await.is_empty());
    assert_eq!(pipeline.documents().await.len(), 1);
}

#[tokio::test]
async fn chat_summarizes_history_past_five_messages() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(dir.path(), scripted_llm(GROUNDED_ANSWER)).await.unwrap();
    pipeline.ingest(POLICY_DOC, Some("return_policy")).await.unwrap();

    // Three full turns: 6 stored messages, no summarization yet.
    for i in 0..3 {
        let outcome = pipeline
            .chat("session-1", &format!("question number {i} about returns?"), &QueryOptions::default())
            .await
            .unwrap();
        let lines = outcome.memory_context.lines().count();
        assert!(lines <= 6, "unexpected context growth: {lines} lines");
    }
    assert_eq!(pipeline.memory().messages("session-1").await.len(), 6);

    // Fourth turn: 7 messages at context-build time, so the history
    // collapses to one summary line plus the last five verbatim.
    let outcome = pipeline
        .chat("session-1", "final question about returns?", &QueryOptions::default())
        .await
        .unwrap();

    let lines: Vec<&str> = outcome.memory_context.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("system: Conversation summary:"));
    assert!(lines[5].starts_with("user: final question"));
    assert_eq!(pipeline.memory().messages("session-1").await.len(), 8);
}

#[tokio::test]
async fn chat_stores_the_guardrailed_answer_as_the_assistant_turn() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline =
        pipeline_with(dir.path(), scripted_llm("The moon is made of cheese")).await.unwrap();

    // Empty store: the answer gets blocked, and the refusal is what the
    // session remembers.
    pipeline.chat("session-2", "what about the moon?", &QueryOptions::default()).await.unwrap();

    let messages = pipeline.memory().messages("session-2").await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, REFUSAL_MESSAGE);
}

#[tokio::test]
async fn streamed_tokens_reassemble_into_the_final_answer() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(dir.path(), scripted_llm(GROUNDED_ANSWER)).await.unwrap();
    pipeline.ingest(POLICY_DOC, Some("return_policy")).await.unwrap();

    let (outcome, stream) =
        pipeline.answer_stream("what is the return window?", &QueryOptions::default()).await.unwrap();
    let tokens: Vec<String> = stream.collect().await;

    assert!(!tokens.is_empty());
    // The stream is pinned to the evaluated answer, not a second
    // generation pass.
    assert_eq!(tokens.concat(), outcome.decision.final_answer);
}

#[tokio::test]
async fn escape_artifacts_are_decoded_before_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        dir.path(),
        scripted_llm("Items can be returned\\nwithin 30 days in original packaging"),
    )
    .await
    .unwrap();
    pipeline.ingest(POLICY_DOC, Some("return_policy")).await.unwrap();

    let outcome =
        pipeline.answer("what is the return window?", &QueryOptions::default()).await.unwrap();
    assert_eq!(outcome.answer, "Items can be returned\nwithin 30 days in original packaging");
}
