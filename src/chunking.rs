//! Sentence-aware sliding-window chunking.
//!
//! [`SentenceChunker`] splits raw document text into overlapping,
//! offset-tracked [`Chunk`]s. The splitter is lossless at the sentence
//! level (it never drops or rewrites source text) and deterministic.
//!
//! Sentence boundaries are detected with regex heuristics, not a full
//! tokenizer: abbreviations ("e.g. Smith") and decimal numbers may split
//! incorrectly. That is an accepted limitation.

use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::document::Chunk;

/// Boundary heuristics: sentence-final punctuation before an uppercase
/// letter, a newline before an uppercase letter or digit (heading/list),
/// and a numbered-list marker ("1.") before an uppercase letter. Every
/// alternative ends in a single ASCII character, so the boundary sits one
/// byte before the match end.
const SENTENCE_BOUNDARY: &str = r"[.!?]\s+[A-Z]|\n+[A-Z0-9]|[0-9]\.\s+[A-Z]";

/// Splits text into sentence-aligned chunks with soft overlap.
///
/// The chunker works in four passes:
///
/// 1. normalize line endings and split on blank lines into paragraphs;
/// 2. split each paragraph into sentences with boundary heuristics;
/// 3. greedily pack sentences into windows of at most `max_chunk_chars`,
///    seeding each new window with the word-aligned tail of the previous;
/// 4. absorb fragments shorter than `min_chunk_size` into a neighbour.
///
/// A single sentence longer than `max_chunk_chars` is emitted whole rather
/// than truncated or split mid-sentence.
#[derive(Debug)]
pub struct SentenceChunker {
    max_chars: usize,
    overlap_chars: usize,
    min_chunk_size: usize,
    boundary: Regex,
}

impl SentenceChunker {
    /// Create a chunker from a validated configuration.
    ///
    /// `RagConfig` construction already guarantees
    /// `overlap_chars < max_chunk_chars`.
    pub fn new(config: &RagConfig) -> Self {
        Self {
            max_chars: config.max_chunk_chars,
            overlap_chars: config.overlap_chars,
            min_chunk_size: config.min_chunk_size,
            boundary: Regex::new(SENTENCE_BOUNDARY).expect("sentence boundary pattern is valid"),
        }
    }

    /// Split `text` into ordered chunks for `doc_id`.
    ///
    /// A missing `doc_id` gets a generated UUID. Empty or whitespace-only
    /// input yields an empty vector.
    pub fn chunk(&self, text: &str, doc_id: Option<&str>) -> Vec<Chunk> {
        let doc_id = match doc_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let sentences = self.split_sentences(text);
        let windows = self.sliding_window(&sentences);
        let merged = self.absorb_small(windows);

        let mut chunks = Vec::with_capacity(merged.len());
        let mut offset = 0;
        for (chunk_index, text) in merged.into_iter().enumerate() {
            let length = text.chars().count();
            chunks.push(Chunk {
                doc_id: doc_id.clone(),
                chunk_index,
                text,
                offset_start: offset,
                offset_end: offset + length,
            });
            offset += length;
        }

        info!(doc_id = %doc_id, chunk_count = chunks.len(), "chunked document");
        chunks
    }

    /// Split text into sentences: normalize line endings, break on blank
    /// lines, then split each paragraph at heuristic boundaries.
    fn split_sentences(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut sentences = Vec::new();
        for paragraph in normalized.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            let mut prev = 0;
            for m in self.boundary.find_iter(paragraph) {
                // The final character of every alternative starts the next
                // sentence; split just before it.
                let split_at = m.end() - 1;
                let piece = paragraph[prev..split_at].trim();
                if !piece.is_empty() {
                    sentences.push(piece.to_string());
                }
                prev = split_at;
            }
            let tail = paragraph[prev..].trim();
            if !tail.is_empty() {
                sentences.push(tail.to_string());
            }
        }

        sentences
    }

    /// Greedily pack sentences into windows of at most `max_chars`,
    /// carrying a soft overlap into each new window. Sentence text is
    /// whitespace-collapsed as it is appended; nothing is dropped.
    fn sliding_window(&self, sentences: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in sentences {
            let collapsed = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
            let separator = usize::from(!current.is_empty());

            if char_len(&current) + separator + char_len(&collapsed) > self.max_chars {
                if !current.is_empty() {
                    chunks.push(current.clone());
                }
                current = if self.overlap_chars > 0 {
                    soft_overlap(&current, self.overlap_chars)
                } else {
                    String::new()
                };
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&collapsed);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Absorb chunks shorter than `min_chunk_size` into the following
    /// chunk, or into the preceding one at the end of the document. A
    /// short fragment is only emitted alone when it is the only chunk.
    fn absorb_small(&self, chunks: Vec<String>) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        let mut buffer = String::new();

        for chunk in chunks {
            let combined = if buffer.is_empty() {
                chunk
            } else {
                let mut joined = std::mem::take(&mut buffer);
                joined.push(' ');
                joined.push_str(&chunk);
                joined
            };

            if char_len(&combined) < self.min_chunk_size {
                buffer = combined;
            } else {
                merged.push(combined);
            }
        }

        if !buffer.is_empty() {
            match merged.last_mut() {
                Some(last) => {
                    last.push(' ');
                    last.push_str(&buffer);
                }
                None => merged.push(buffer),
            }
        }

        merged
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Take the trailing `size` characters of `chunk`, trimmed forward to the
/// nearest word boundary so the overlap never starts mid-word.
fn soft_overlap(chunk: &str, size: usize) -> String {
    let total = char_len(chunk);
    if total <= size {
        return chunk.to_string();
    }

    let start = chunk
        .char_indices()
        .nth(total - size)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(0);
    let overlap = &chunk[start..];

    match overlap.find(' ') {
        Some(space) => overlap[space + 1..].to_string(),
        None => overlap.to_string(),
    }
}
