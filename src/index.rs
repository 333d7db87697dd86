//! Brute-force flat vector index.
//!
//! [`FlatIndex`] is the low-level nearest-neighbour engine behind
//! [`DiskVectorStore`](crate::DiskVectorStore). It stores raw vectors in an
//! append-only arena and searches by exhaustive squared-L2 distance. There
//! is no in-place delete: removal is a filter-and-rebuild performed by the
//! store through [`reconstruct`](FlatIndex::reconstruct).

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// An append-only flat index over fixed-dimension vectors.
///
/// Row `i` of the index corresponds to element `i` of the store's metadata
/// list; keeping both in lockstep is the store's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self { dim, vectors: Vec::new() }
    }

    /// Dimensionality of the indexed vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.vectors.len() / self.dim
        }
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append one vector to the index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] on dimension mismatch.
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(RagError::VectorStoreError(format!(
                "dimension mismatch: expected {}, got {}",
                self.dim,
                vector.len()
            )));
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Return up to `k` rows ordered by ascending squared-L2 distance to
    /// `query`. Rows with equal distance keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|row| {
                let start = row * self.dim;
                let vector = &self.vectors[start..start + self.dim];
                let distance: f32 =
                    vector.iter().zip(query.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                (row, distance)
            })
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Read back the vector stored at `row`, if it exists.
    pub fn reconstruct(&self, row: usize) -> Option<&[f32]> {
        if row >= self.len() {
            return None;
        }
        let start = row * self.dim;
        Some(&self.vectors[start..start + self.dim])
    }

    /// Serialize the index into a binary blob.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| RagError::VectorStoreError(format!("failed to encode index: {e}")))
    }

    /// Deserialize an index from a binary blob.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the blob is malformed or
    /// internally inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let index: FlatIndex = bincode::deserialize(bytes)
            .map_err(|e| RagError::VectorStoreError(format!("failed to decode index: {e}")))?;
        if index.dim == 0 && !index.vectors.is_empty() {
            return Err(RagError::VectorStoreError(
                "decoded index has vectors but zero dimension".to_string(),
            ));
        }
        if index.dim != 0 && index.vectors.len() % index.dim != 0 {
            return Err(RagError::VectorStoreError(format!(
                "decoded index length {} is not a multiple of dimension {}",
                index.vectors.len(),
                index.dim
            )));
        }
        Ok(index)
    }
}
