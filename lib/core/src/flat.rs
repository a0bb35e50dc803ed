// Exact, row-major flat index.
// Linear scan over every stored vector; fine for small corpora and as ground truth.

use crate::backend::{AnnBackend, Neighbor};
use crate::embedding::normalize_in_place;
use crate::{Embedding, IndexConfig, Result, Space};
use ordered_float::OrderedFloat;
use rayon::prelude::*;

pub struct FlatBackend {
    space: Space,
    dim: usize,
    /// Concatenated rows of length `dim`
    vectors: Vec<f32>,
}

impl FlatBackend {
    #[inline]
    fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dim;
        &self.vectors[start..start + self.dim]
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = (0..self.len())
            .map(|i| Neighbor::new(i, self.space.distance(query, self.row(i))))
            .collect();
        hits.sort_unstable_by_key(|n| (OrderedFloat(n.distance), n.id));
        hits.truncate(k);
        hits
    }
}

impl AnnBackend for FlatBackend {
    fn build(embeddings: &[Embedding], space: Space, _config: &IndexConfig) -> Result<Self> {
        let dim = embeddings.first().map(Embedding::dim).unwrap_or(0);
        let mut vectors = Vec::with_capacity(embeddings.len() * dim);
        for embedding in embeddings {
            let start = vectors.len();
            vectors.extend_from_slice(embedding.as_slice());
            if space.normalizes() {
                normalize_in_place(&mut vectors[start..]);
            }
        }
        Ok(Self { space, dim, vectors })
    }

    /// Exact search has no breadth to tune
    fn set_query_quality(&mut self, _search_breadth: usize) {}

    fn knn_query(&self, queries: &[Embedding], k: usize) -> Vec<Vec<Neighbor>> {
        queries
            .par_iter()
            .map(|query| {
                if self.space.normalizes() {
                    let mut q = query.as_slice().to_vec();
                    normalize_in_place(&mut q);
                    self.search(&q, k)
                } else {
                    self.search(query.as_slice(), k)
                }
            })
            .collect()
    }

    #[inline]
    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.vectors.len() / self.dim
        }
    }

    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn space(&self) -> Space {
        self.space
    }
}
