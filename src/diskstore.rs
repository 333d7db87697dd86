//! Disk-backed vector store: flat index blob plus JSON metadata sidecar.
//!
//! [`DiskVectorStore`] persists two artifacts under its directory:
//! `index.bin` (the encoded [`FlatIndex`]) and `meta.json` (the chunk
//! list). On open, a missing or corrupt artifact falls back to an empty
//! store so ingestion is always retryable from a clean slate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::index::FlatIndex;
use crate::vectorstore::{keyword_score, VectorStore};

const INDEX_FILE: &str = "index.bin";
const META_FILE: &str = "meta.json";

/// Candidate multiplier for the vector stage of hybrid search.
const CANDIDATE_FACTOR: usize = 3;

struct StoreInner {
    index: FlatIndex,
    meta: Vec<Chunk>,
}

impl StoreInner {
    /// The load-bearing invariant: row `i` of the index describes
    /// `meta[i]`. A violation is a correctness bug, never recoverable.
    fn check_invariant(&self) -> Result<()> {
        if self.index.len() != self.meta.len() {
            return Err(RagError::VectorStoreError(format!(
                "index/metadata count mismatch: {} vectors, {} metadata entries",
                self.index.len(),
                self.meta.len()
            )));
        }
        Ok(())
    }
}

/// A persistent vector store guarded by a readers-writer lock.
///
/// `search` and the introspection methods take a read lock; `add`,
/// `delete`, and `save` take a write lock, which is the mutual-exclusion
/// layer required around the positional-correspondence invariant.
pub struct DiskVectorStore {
    dir: PathBuf,
    dim: usize,
    inner: RwLock<StoreInner>,
}

impl DiskVectorStore {
    /// Open a store under `dir` for vectors of dimension `dim`.
    ///
    /// Loads the persisted artifacts if both are present and consistent;
    /// otherwise starts empty with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] only if the directory cannot
    /// be created; artifact problems never fail construction.
    pub async fn open(dir: impl Into<PathBuf>, dim: usize) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            RagError::VectorStoreError(format!(
                "failed to create store directory {}: {e}",
                dir.display()
            ))
        })?;

        let inner = match Self::load(&dir, dim).await {
            Ok(Some(inner)) => {
                info!(entries = inner.meta.len(), dir = %dir.display(), "loaded vector store");
                inner
            }
            Ok(None) => StoreInner { index: FlatIndex::new(dim), meta: Vec::new() },
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "failed to load vector store, starting empty");
                StoreInner { index: FlatIndex::new(dim), meta: Vec::new() }
            }
        };

        Ok(Self { dir, dim, inner: RwLock::new(inner) })
    }

    /// Try to load both artifacts. `Ok(None)` means a fresh store (no
    /// files yet); `Err` means the files exist but are unusable.
    async fn load(dir: &Path, dim: usize) -> Result<Option<StoreInner>> {
        let index_path = dir.join(INDEX_FILE);
        let meta_path = dir.join(META_FILE);
        if !index_path.exists() || !meta_path.exists() {
            return Ok(None);
        }

        let index_bytes = tokio::fs::read(&index_path)
            .await
            .map_err(|e| RagError::VectorStoreError(format!("failed to read index blob: {e}")))?;
        let index = FlatIndex::from_bytes(&index_bytes)?;

        let meta_bytes = tokio::fs::read(&meta_path)
            .await
            .map_err(|e| RagError::VectorStoreError(format!("failed to read metadata: {e}")))?;
        let meta: Vec<Chunk> = serde_json::from_slice(&meta_bytes)
            .map_err(|e| RagError::VectorStoreError(format!("failed to parse metadata: {e}")))?;

        if index.dim() != dim {
            return Err(RagError::VectorStoreError(format!(
                "persisted index dimension {} does not match configured {dim}",
                index.dim()
            )));
        }

        let inner = StoreInner { index, meta };
        inner.check_invariant()?;
        Ok(Some(inner))
    }

    async fn persist(&self, index_bytes: Vec<u8>, meta_bytes: Vec<u8>) -> Result<()> {
        tokio::fs::write(self.dir.join(INDEX_FILE), index_bytes)
            .await
            .map_err(|e| RagError::VectorStoreError(format!("failed to write index blob: {e}")))?;
        tokio::fs::write(self.dir.join(META_FILE), meta_bytes)
            .await
            .map_err(|e| RagError::VectorStoreError(format!("failed to write metadata: {e}")))?;
        Ok(())
    }

    /// Embedding dimension this store was opened with.
    pub fn dimensions(&self) -> usize {
        self.dim
    }
}

#[async_trait]
impl VectorStore for DiskVectorStore {
    async fn add(&self, embedding: &[f32], chunk: Chunk) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.index.add(embedding)?;
        inner.meta.push(chunk);
        inner.check_invariant()
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        retrieval_k: usize,
        query_text: &str,
    ) -> Result<Vec<Chunk>> {
        let inner = self.inner.read().await;
        inner.check_invariant()?;

        let candidates = inner.index.search(query_embedding, retrieval_k * CANDIDATE_FACTOR);

        // Rescore by keyword hits. The candidate list arrives in ascending
        // vector-distance order and the sort is stable, so equal keyword
        // scores keep that order.
        let mut scored: Vec<(usize, &Chunk)> = candidates
            .into_iter()
            .map(|(row, _distance)| {
                let chunk = &inner.meta[row];
                (keyword_score(query_text, &chunk.text), chunk)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(retrieval_k);

        Ok(scored.into_iter().map(|(_, chunk)| chunk.clone()).collect())
    }

    async fn delete(&self, doc_id: &str) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.check_invariant()?;

        let before = inner.meta.len();
        let mut index = FlatIndex::new(self.dim);
        let mut meta = Vec::new();

        // No native delete in the index: read survivors back by position
        // and rebuild both sides in the same relative order.
        for (row, chunk) in inner.meta.iter().enumerate() {
            if chunk.doc_id == doc_id {
                continue;
            }
            let vector = inner.index.reconstruct(row).ok_or_else(|| {
                RagError::VectorStoreError(format!("missing vector for metadata row {row}"))
            })?;
            index.add(vector)?;
            meta.push(chunk.clone());
        }

        let removed = before - meta.len();
        inner.index = index;
        inner.meta = meta;
        inner.check_invariant()?;

        // Persist while holding the write lock so the two artifacts can
        // never land on disk from different snapshots.
        let index_bytes = inner.index.to_bytes()?;
        let meta_bytes = serde_json::to_vec(&inner.meta)
            .map_err(|e| RagError::VectorStoreError(format!("failed to encode metadata: {e}")))?;
        self.persist(index_bytes, meta_bytes).await?;

        info!(doc_id, removed, "deleted document from vector store");
        Ok(removed)
    }

    async fn save(&self) -> Result<()> {
        let inner = self.inner.write().await;
        inner.check_invariant()?;
        let index_bytes = inner.index.to_bytes()?;
        let meta_bytes = serde_json::to_vec(&inner.meta)
            .map_err(|e| RagError::VectorStoreError(format!("failed to encode metadata: {e}")))?;
        self.persist(index_bytes, meta_bytes).await
    }

    async fn count(&self) -> usize {
        self.inner.read().await.meta.len()
    }

    async fn documents(&self) -> HashMap<String, usize> {
        let inner = self.inner.read().await;
        let mut counts = HashMap::new();
        for chunk in &inner.meta {
            *counts.entry(chunk.doc_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    async fn chunks_for(&self, doc_id: &str) -> Vec<Chunk> {
        let inner = self.inner.read().await;
        inner.meta.iter().filter(|c| c.doc_id == doc_id).cloned().collect()
    }
}
