//! Vector store trait for persisted embeddings with hybrid search.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::Chunk;
use crate::error::Result;

/// A storage backend pairing each embedding with its [`Chunk`] metadata.
///
/// Implementations maintain the positional-correspondence invariant: entry
/// `i` of the index is described by element `i` of the metadata list. All
/// mutating operations must keep the two in lockstep — interleaved writes
/// without external exclusion would corrupt retrieval.
///
/// # Example
///
/// ```rust,ignore
/// use ragward::{DiskVectorStore, VectorStore};
///
/// let store = DiskVectorStore::open("db", 768).await?;
/// store.add(&embedding, chunk).await?;
/// let hits = store.search(&query_embedding, 10, "refund window").await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append one entry. Never rejects duplicate text.
    async fn add(&self, embedding: &[f32], chunk: Chunk) -> Result<()>;

    /// Hybrid search: vector candidates rescored by keyword overlap.
    ///
    /// Fetches `retrieval_k * 3` nearest neighbours, rescores them by how
    /// many case-folded words of `query_text` occur in each candidate's
    /// text, and returns the top `retrieval_k` in descending keyword order
    /// (vector-distance order preserved on ties).
    async fn search(
        &self,
        query_embedding: &[f32],
        retrieval_k: usize,
        query_text: &str,
    ) -> Result<Vec<Chunk>>;

    /// Remove every entry belonging to `doc_id` and rebuild the index.
    ///
    /// Deletion is O(n), not O(1): the underlying index has no native
    /// delete, so survivors are read back and re-indexed in order.
    /// Returns the number of entries removed.
    async fn delete(&self, doc_id: &str) -> Result<usize>;

    /// Persist the index and metadata artifacts.
    async fn save(&self) -> Result<()>;

    /// Total number of stored entries.
    async fn count(&self) -> usize;

    /// Chunk counts keyed by document id.
    async fn documents(&self) -> HashMap<String, usize>;

    /// All chunks belonging to `doc_id`, in stored order.
    async fn chunks_for(&self, doc_id: &str) -> Vec<Chunk>;
}

/// Count how many whitespace-separated, case-folded words of `query`
/// appear as substrings in `text`.
pub fn keyword_score(query: &str, text: &str) -> usize {
    let text_lower = text.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| text_lower.contains(word))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_score_counts_case_folded_hits() {
        assert_eq!(keyword_score("Return POLICY refund", "Our return policy is simple."), 2);
        assert_eq!(keyword_score("warranty", "no match here"), 0);
        assert_eq!(keyword_score("", "anything"), 0);
    }
}
