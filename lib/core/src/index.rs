use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::AnnBackend;
use crate::{Embedding, Error, HnswBackend, Result, ScoreAggregator, ScoreMap, Space};

/// Construction and query options for a [`SimilarityIndex`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub space: Space,
    /// Candidate list size while building the graph
    pub ef_construction: usize,
    /// Graph connectivity (max links per node on upper layers, doubled on layer 0)
    pub m: usize,
    /// Query-time candidate list size. Should be >= every `k` queried.
    pub search_breadth: usize,
    /// Seed for level assignment, so rebuilding a corpus yields the same graph
    pub seed: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            space: Space::Cosine,
            ef_construction: 200,
            m: 16,
            search_breadth: 50,
            seed: 100,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ef_construction == 0 {
            return Err(Error::InvalidConfig("ef_construction must be positive".to_string()));
        }
        if self.m < 2 {
            return Err(Error::InvalidConfig(format!("m must be at least 2, got {}", self.m)));
        }
        if self.search_breadth == 0 {
            return Err(Error::InvalidConfig("search_breadth must be positive".to_string()));
        }
        Ok(())
    }
}

/// Read-only similarity index over a fixed embedding corpus.
///
/// Item ids are the corpus positions (`0..len`). Queries return
/// `1 - distance` as the similarity, which is exact for cosine and an
/// approximation carried as-is for `l2` and `ip`.
pub struct SimilarityIndex<B: AnnBackend = HnswBackend> {
    backend: B,
    search_breadth: usize,
}

impl SimilarityIndex<HnswBackend> {
    /// Build an HNSW-backed index
    pub fn build(embeddings: &[Embedding], config: &IndexConfig) -> Result<Self> {
        Self::build_with(embeddings, config)
    }
}

impl<B: AnnBackend> SimilarityIndex<B> {
    /// Build over any [`AnnBackend`]
    pub fn build_with(embeddings: &[Embedding], config: &IndexConfig) -> Result<Self> {
        config.validate()?;

        let first = embeddings.first().ok_or(Error::EmptyCorpus)?;
        let dim = first.dim();
        if dim == 0 {
            return Err(Error::InvalidConfig("embeddings must have at least one dimension".to_string()));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }

        tracing::debug!(
            items = embeddings.len(),
            dim,
            space = %config.space,
            ef_construction = config.ef_construction,
            m = config.m,
            search_breadth = config.search_breadth,
            "building similarity index"
        );

        let mut backend = B::build(embeddings, config.space, config)?;
        backend.set_query_quality(config.search_breadth);

        Ok(Self {
            backend,
            search_breadth: config.search_breadth,
        })
    }

    /// Max-aggregated similarities of the `k` nearest items to each query.
    ///
    /// Empty input yields an empty map.
    pub fn query(&self, query_embeddings: &[Embedding], k: usize) -> Result<ScoreMap> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be positive".to_string()));
        }
        if let Some(bad) = query_embeddings.iter().find(|e| e.dim() != self.dim()) {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: bad.dim(),
            });
        }
        if k > self.search_breadth {
            tracing::debug!(k, search_breadth = self.search_breadth, "search breadth below k, recall may drop");
        }

        let rows = self.backend.knn_query(query_embeddings, k);
        let mut aggregator = ScoreAggregator::with_capacity(rows.iter().map(Vec::len).sum());
        for neighbor in rows.iter().flatten() {
            aggregator.observe(neighbor.id, 1.0 - neighbor.distance);
        }
        Ok(aggregator.finish())
    }

    /// Change the query-time breadth
    pub fn set_search_breadth(&mut self, search_breadth: usize) -> Result<()> {
        if search_breadth == 0 {
            return Err(Error::InvalidConfig("search_breadth must be positive".to_string()));
        }
        self.backend.set_query_quality(search_breadth);
        self.search_breadth = search_breadth;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn search_breadth(&self) -> usize {
        self.search_breadth
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.backend.dim()
    }

    #[inline]
    #[must_use]
    pub fn space(&self) -> Space {
        self.backend.space()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: AnnBackend> fmt::Debug for SimilarityIndex<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("len", &self.len())
            .field("dim", &self.dim())
            .field("space", &self.space())
            .field("search_breadth", &self.search_breadth)
            .finish()
    }
}
