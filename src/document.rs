//! Data types for chunks, retrieval results, and conversation messages.

use serde::{Deserialize, Serialize};

/// A contiguous, bounded-length slice of a document's text.
///
/// Chunks are the unit of embedding and retrieval. They are immutable once
/// produced by the chunker: `chunk_index` is contiguous per `doc_id`
/// starting at 0, and `offset_start`/`offset_end` are character offsets
/// into the whitespace-normalized chunked text, non-decreasing across the
/// chunks of a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the parent document.
    pub doc_id: String,
    /// Position of this chunk within the document, starting at 0.
    pub chunk_index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the chunk start in the reconstructed text.
    pub offset_start: usize,
    /// Character offset of the chunk end in the reconstructed text.
    pub offset_end: usize,
}

/// A retrieved [`Chunk`] paired with a reranker relevance score in `[0, 100]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// LLM-judged relevance of the chunk to the query (higher is better).
    pub score: u8,
}

/// A source reference returned alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// Identifier of the document the text came from.
    pub doc_id: String,
    /// The chunk text supplied to the generation model.
    pub text: String,
}

impl From<&Chunk> for Source {
    fn from(chunk: &Chunk) -> Self {
        Self { doc_id: chunk.doc_id.clone(), text: chunk.text.clone() }
    }
}

/// The author of a conversation [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message written by the end user.
    User,
    /// A message produced by the pipeline.
    Assistant,
    /// A synthetic message, such as a history summary.
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A single turn in a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Create a new message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}
