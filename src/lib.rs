//! # distrec
//!
//! Item recommendations from a user's interaction history.
//!
//! Each history item is mapped to its embedding, every embedding queries an
//! approximate nearest neighbor index, and the per-query hits are folded into
//! one score per item by keeping the best similarity. The resulting map can
//! then be filtered, truncated to the top k, or randomly sampled.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! distrec --embeddings items.json --history 3,17,42 --k 10 --sample-weight 1.5
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use distrec::prelude::*;
//! use std::sync::Arc;
//!
//! let corpus = vec![
//!     Embedding::new(vec![1.0, 0.0, 0.0]),
//!     Embedding::new(vec![0.9, 0.1, 0.0]),
//!     Embedding::new(vec![0.0, 0.0, 1.0]),
//! ];
//! let index = Arc::new(SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap());
//! let recommender = EmbeddingRecommender::new(
//!     index,
//!     InMemoryEmbeddings::new(corpus),
//!     RecommenderConfig { k: 1, sample_weight: 2.0, ..Default::default() },
//! ).unwrap();
//!
//! let scores = recommender.recommend(&[0]).unwrap();
//! let picked = finalize(&scores, &[0], 1, Selection::TopK).unwrap();
//! assert!(picked.contains(1));
//! ```
//!
//! ## Crate Structure
//!
//! - [`distrec-core`](https://docs.rs/distrec-core) - Embeddings, ANN backends (HNSW, flat), similarity index, score aggregation and transforms
//! - [`distrec-recommend`](https://docs.rs/distrec-recommend) - Lookups, configuration, recommenders and final selection

// Re-export core types
pub use distrec_core::{
    AnnBackend, Embedding, Error, FlatBackend, HnswBackend, IndexConfig, ItemId, Neighbor, Result,
    ScoreAggregator, ScoreMap, SimilarityIndex, Space,
};

/// Score transforms: rank, unpack, exclude, top-k, random sample
pub mod transform {
    pub use distrec_core::transform::{exclude, random_sample, rank, top_k, unpack};
}

// Re-export recommenders
pub use distrec_recommend::{
    finalize, EmbeddingLookup, EmbeddingRecommender, HistoryLookup, InMemoryEmbeddings,
    InMemoryHistories, Recommender, RecommenderConfig, ResolutionPolicy, Selection, Settings,
    UserId, UserRecommender,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        finalize, transform, Embedding, EmbeddingLookup, EmbeddingRecommender, Error,
        IndexConfig, InMemoryEmbeddings, ItemId, Recommender, RecommenderConfig,
        ResolutionPolicy, Result, ScoreMap, Selection, SimilarityIndex, Space,
    };
}
