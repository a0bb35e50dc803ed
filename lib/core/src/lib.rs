//! # distrec Core
//!
//! Core library for distrec, the embedding-history recommender.
//!
//! This crate provides the building blocks of the scoring pipeline:
//!
//! - [`Embedding`] - Dense embedding vector
//! - [`Space`] - Similarity space (`l2`, `ip`, `cosine`)
//! - [`AnnBackend`] - Approximate nearest neighbor capability
//! - [`HnswBackend`] / [`FlatBackend`] - HNSW graph and exact scan backends
//! - [`SimilarityIndex`] - Batched k-NN queries folded into one [`ScoreMap`]
//! - [`ScoreAggregator`] - Max-aggregation of per-query hits
//! - [`transform`] - Rank, exclude, top-k and random sampling
//!
//! ## Example
//!
//! ```rust
//! use distrec_core::{Embedding, IndexConfig, SimilarityIndex, transform};
//!
//! let corpus = vec![
//!     Embedding::new(vec![1.0, 0.0]),
//!     Embedding::new(vec![0.9, 0.1]),
//!     Embedding::new(vec![0.0, 1.0]),
//! ];
//! let index = SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap();
//!
//! // Two history items, two nearest neighbors each
//! let scores = index.query(&corpus[..2], 2).unwrap();
//! let fresh = transform::exclude(&scores, [0, 1]);
//! let (ids, _) = transform::unpack(&transform::top_k(&fresh, 1));
//! assert!(ids.len() <= 1);
//! ```

/// Item identifier: the 0-based position of the item in the indexed corpus
pub type ItemId = usize;

pub mod aggregate;
pub mod backend;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod hnsw;
pub mod index;
pub mod scores;
pub mod transform;

pub use aggregate::ScoreAggregator;
pub use backend::{AnnBackend, Neighbor};
pub use distance::Space;
pub use embedding::Embedding;
pub use error::{Error, Result};
pub use flat::FlatBackend;
pub use hnsw::HnswBackend;
pub use index::{IndexConfig, SimilarityIndex};
pub use scores::ScoreMap;
