//! Answer evaluation signals.
//!
//! Five independent signals, each a pure function of `(answer, sources)`:
//! lexical overlap, semantic similarity, hallucination score, per-sentence
//! citation alignment, and safety classification. The guardrail engine
//! composes them into a verdict; none of them is persisted.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Source;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;

/// Answers scoring below this against the combined sources are flagged as
/// possible hallucinations.
pub const HALLUCINATION_THRESHOLD: f32 = 0.55;

/// Minimum similarity for a sentence to be attributed to a source.
pub const CITATION_THRESHOLD: f32 = 0.45;

/// Similarity to an unsafe-category description at or above which the
/// answer is classified unsafe.
pub const SAFETY_THRESHOLD: f32 = 0.65;

/// Fixed reference descriptions for the unsafe-content categories.
const SAFETY_CATEGORIES: &[(&str, &str)] = &[
    (
        "hate",
        "hateful content attacking or demeaning people based on race, religion, \
         gender, or other protected attributes",
    ),
    (
        "toxicity",
        "toxic, harassing, or abusive language intended to insult, intimidate, \
         or demean someone",
    ),
    (
        "self-harm",
        "content encouraging, glorifying, or giving instructions for self-harm \
         or suicide",
    ),
    ("sexual", "sexually explicit or pornographic adult content"),
    (
        "violence",
        "graphic descriptions of violence or threats of physical harm against people",
    ),
    (
        "weapons",
        "instructions for building, obtaining, or using weapons or explosives",
    ),
];

/// A coarse confidence bucket attached to individual signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    /// Weak signal.
    Low,
    /// Moderate signal.
    Medium,
    /// Strong signal.
    High,
}

/// Lexical overlap between the answer and the concatenated source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerEvaluation {
    /// Number of answer tokens found in the sources.
    pub overlap_score: usize,
    /// Number of sources the answer was checked against.
    pub source_count: usize,
    /// Bucketed confidence: `< 3` low, `< 10` medium, otherwise high.
    pub confidence: ConfidenceLabel,
}

/// Cosine similarity between the answer and each source chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticScore {
    /// Per-chunk similarity, in source order.
    pub chunk_scores: Vec<f32>,
    /// Mean of `chunk_scores` (0 when there are no sources).
    pub average: f32,
    /// Highest per-chunk similarity.
    pub max: f32,
    /// Lowest per-chunk similarity.
    pub min: f32,
    /// Bucketed confidence: average `> 0.75` high, `> 0.45` medium, else low.
    pub confidence: ConfidenceLabel,
}

/// Whether the answer is semantically grounded in the sources as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HallucinationCheck {
    /// Similarity between the answer and all sources concatenated.
    pub score: f32,
    /// `true` when `score` falls below [`HALLUCINATION_THRESHOLD`].
    pub hallucinated: bool,
}

/// One answer sentence mapped to its best-supporting source, or none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The answer sentence.
    pub sentence: String,
    /// Best-matching document id, if similarity reached [`CITATION_THRESHOLD`].
    pub source_doc_id: Option<String>,
    /// Similarity to the best-matching source.
    pub score: f32,
}

/// Safety classification of the answer text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyCheck {
    /// `true` when no category reached [`SAFETY_THRESHOLD`].
    pub safe: bool,
    /// The highest-scoring category when unsafe.
    pub category: Option<String>,
    /// Similarity to the highest-scoring category.
    pub score: f32,
}

/// All five signals computed for one answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    /// Lexical overlap signal.
    pub evaluation: AnswerEvaluation,
    /// Per-chunk semantic similarity signal.
    pub semantic: SemanticScore,
    /// Whole-answer grounding signal.
    pub hallucination: HallucinationCheck,
    /// Per-sentence citation alignment.
    pub citations: Vec<Citation>,
    /// Safety classification.
    pub safety: SafetyCheck,
}

/// Computes the evaluation signals for an answer against its sources.
pub struct AnswerEvaluator {
    embedder: Arc<dyn EmbeddingProvider>,
    sentence_boundary: Regex,
}

impl AnswerEvaluator {
    /// Create an evaluator backed by the given embedding provider.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            sentence_boundary: Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"),
        }
    }

    /// Compute all five signals.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::EmbeddingError`](crate::RagError::EmbeddingError)
    /// from the embedding provider.
    pub async fn evaluate(&self, answer: &str, sources: &[Source]) -> Result<EvaluationReport> {
        let evaluation = self.evaluate_answer(answer, sources);
        let semantic = self.semantic_score(answer, sources).await?;
        let hallucination = self.detect_hallucination(answer, sources).await?;
        let citations = self.align_citations(answer, sources).await?;
        let safety = self.safety_check(answer).await?;

        debug!(
            overlap = evaluation.overlap_score,
            semantic_avg = semantic.average,
            hallucination = hallucination.score,
            safe = safety.safe,
            "evaluated answer"
        );

        Ok(EvaluationReport { evaluation, semantic, hallucination, citations, safety })
    }

    /// Lexical overlap: whitespace-tokenize the answer and count tokens
    /// whose lowercase form occurs anywhere in the combined source text.
    pub fn evaluate_answer(&self, answer: &str, sources: &[Source]) -> AnswerEvaluation {
        let combined = combined_source_text(sources).to_lowercase();
        let overlap_score = answer
            .split_whitespace()
            .filter(|word| combined.contains(&word.to_lowercase()))
            .count();

        let confidence = if overlap_score < 3 {
            ConfidenceLabel::Low
        } else if overlap_score < 10 {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::High
        };

        AnswerEvaluation { overlap_score, source_count: sources.len(), confidence }
    }

    /// Per-chunk cosine similarity between the answer and each source.
    pub async fn semantic_score(&self, answer: &str, sources: &[Source]) -> Result<SemanticScore> {
        if sources.is_empty() {
            return Ok(SemanticScore {
                chunk_scores: Vec::new(),
                average: 0.0,
                max: 0.0,
                min: 0.0,
                confidence: ConfidenceLabel::Low,
            });
        }

        let answer_embedding = self.embedder.embed(answer).await?;
        let texts: Vec<&str> = sources.iter().map(|s| s.text.as_str()).collect();
        let source_embeddings = self.embedder.embed_batch(&texts).await?;

        let chunk_scores: Vec<f32> = source_embeddings
            .iter()
            .map(|embedding| cosine_similarity(&answer_embedding, embedding))
            .collect();

        let average = chunk_scores.iter().sum::<f32>() / chunk_scores.len() as f32;
        let max = chunk_scores.iter().copied().fold(f32::MIN, f32::max);
        let min = chunk_scores.iter().copied().fold(f32::MAX, f32::min);

        let confidence = if average > 0.75 {
            ConfidenceLabel::High
        } else if average > 0.45 {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        };

        Ok(SemanticScore { chunk_scores, average, max, min, confidence })
    }

    /// Compare the answer against all sources concatenated. An empty
    /// combined source text scores 0 without an embedding call.
    pub async fn detect_hallucination(
        &self,
        answer: &str,
        sources: &[Source],
    ) -> Result<HallucinationCheck> {
        let combined = combined_source_text(sources);
        let score = if combined.trim().is_empty() {
            0.0
        } else {
            let answer_embedding = self.embedder.embed(answer).await?;
            let source_embedding = self.embedder.embed(&combined).await?;
            cosine_similarity(&answer_embedding, &source_embedding)
        };

        Ok(HallucinationCheck { score, hallucinated: score < HALLUCINATION_THRESHOLD })
    }

    /// Map every answer sentence to its best-supporting source document,
    /// or to none when the best similarity stays below the threshold.
    pub async fn align_citations(&self, answer: &str, sources: &[Source]) -> Result<Vec<Citation>> {
        let sentences = self.split_answer_sentences(answer);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        if sources.is_empty() {
            return Ok(sentences
                .into_iter()
                .map(|sentence| Citation { sentence, source_doc_id: None, score: 0.0 })
                .collect());
        }

        let sentence_refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let sentence_embeddings = self.embedder.embed_batch(&sentence_refs).await?;
        let texts: Vec<&str> = sources.iter().map(|s| s.text.as_str()).collect();
        let source_embeddings = self.embedder.embed_batch(&texts).await?;

        let citations = sentences
            .iter()
            .zip(sentence_embeddings.iter())
            .map(|(sentence, sentence_embedding)| {
                let mut best_score = f32::MIN;
                let mut best_doc = None;
                for (source, source_embedding) in sources.iter().zip(source_embeddings.iter()) {
                    let score = cosine_similarity(sentence_embedding, source_embedding);
                    if score > best_score {
                        best_score = score;
                        best_doc = Some(source.doc_id.clone());
                    }
                }
                let source_doc_id = if best_score >= CITATION_THRESHOLD { best_doc } else { None };
                Citation { sentence: sentence.clone(), source_doc_id, score: best_score }
            })
            .collect();

        Ok(citations)
    }

    /// Classify the answer against the fixed unsafe-category references.
    pub async fn safety_check(&self, answer: &str) -> Result<SafetyCheck> {
        let answer_embedding = self.embedder.embed(answer).await?;
        let descriptions: Vec<&str> = SAFETY_CATEGORIES.iter().map(|(_, desc)| *desc).collect();
        let category_embeddings = self.embedder.embed_batch(&descriptions).await?;

        let mut best_score = f32::MIN;
        let mut best_category = "";
        for ((name, _), embedding) in SAFETY_CATEGORIES.iter().zip(category_embeddings.iter()) {
            let score = cosine_similarity(&answer_embedding, embedding);
            if score > best_score {
                best_score = score;
                best_category = name;
            }
        }

        let safe = best_score < SAFETY_THRESHOLD;
        Ok(SafetyCheck {
            safe,
            category: if safe { None } else { Some(best_category.to_string()) },
            score: best_score,
        })
    }

    /// Split the answer on sentence-final punctuation followed by
    /// whitespace. An answer without terminal punctuation is one sentence.
    fn split_answer_sentences(&self, answer: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut prev = 0;
        for m in self.sentence_boundary.find_iter(answer) {
            // Keep the punctuation with its sentence, drop the whitespace.
            let split_at = m.start() + 1;
            let piece = answer[prev..split_at].trim();
            if !piece.is_empty() {
                sentences.push(piece.to_string());
            }
            prev = m.end();
        }
        let tail = answer[prev..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }
}

fn combined_source_text(sources: &[Source]) -> String {
    sources.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

/// Cosine similarity between two vectors. Returns 0 if either has zero
/// magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
