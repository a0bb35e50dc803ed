//! The approximate nearest neighbor capability consumed by [`SimilarityIndex`].
//!
//! Any structure that can be built once over a batch of embeddings and then
//! answer batched k-NN queries can sit behind [`AnnBackend`]: the HNSW graph
//! in [`crate::hnsw`] or the exact scan in [`crate::flat`].
//!
//! [`SimilarityIndex`]: crate::SimilarityIndex

use crate::{Embedding, IndexConfig, ItemId, Result, Space};

/// One k-NN hit: the internal item id and its distance in the index space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: ItemId,
    pub distance: f32,
}

impl Neighbor {
    #[inline]
    #[must_use]
    pub fn new(id: ItemId, distance: f32) -> Self {
        Self { id, distance }
    }
}

pub trait AnnBackend: Send + Sync {
    /// Build over `embeddings`, assigning ids `0..len` in insertion order.
    ///
    /// Callers guarantee a non-empty corpus of uniform dimension and a
    /// validated `config`.
    fn build(embeddings: &[Embedding], space: Space, config: &IndexConfig) -> Result<Self>
    where
        Self: Sized;

    /// Query-time breadth of the candidate list. Should be at least `k`.
    fn set_query_quality(&mut self, search_breadth: usize);

    /// One row per query, each holding up to `k` neighbors by ascending distance.
    /// Rows are shorter than `k` only when the corpus is smaller than `k`.
    fn knn_query(&self, queries: &[Embedding], k: usize) -> Vec<Vec<Neighbor>>;

    fn len(&self) -> usize;

    fn dim(&self) -> usize;

    fn space(&self) -> Space;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
