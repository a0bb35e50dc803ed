//! # distrec Recommend
//!
//! History-based recommenders on top of a [`distrec_core::SimilarityIndex`].
//!
//! ```text
//! history ids ──> EmbeddingLookup ──> SimilarityIndex::query ──> ScoreMap
//!                                      (k' = floor(sample_weight * k))
//!                                                                  │
//!                                  finalize(exclude history, top-k | sample)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use distrec_core::{Embedding, IndexConfig, SimilarityIndex};
//! use distrec_recommend::{EmbeddingRecommender, InMemoryEmbeddings, Recommender, RecommenderConfig};
//!
//! let corpus = vec![
//!     Embedding::new(vec![1.0, 0.0]),
//!     Embedding::new(vec![0.9, 0.1]),
//!     Embedding::new(vec![0.0, 1.0]),
//! ];
//! let index = SimilarityIndex::build(&corpus, &IndexConfig::default()).unwrap();
//! let config = RecommenderConfig { k: 1, sample_weight: 2.0, ..Default::default() };
//! let recommender = EmbeddingRecommender::new(
//!     Arc::new(index),
//!     InMemoryEmbeddings::new(corpus),
//!     config,
//! ).unwrap();
//!
//! let raw = recommender.recommend(&[0]).unwrap();
//! assert_eq!(raw.len(), 2);
//! let picked = recommender.recommend_final(&[0]).unwrap();
//! assert!(picked.contains(1));
//! ```

pub mod config;
pub mod lookup;
pub mod recommender;
pub mod select;

pub use config::{RecommenderConfig, ResolutionPolicy, Settings};
pub use lookup::{EmbeddingLookup, HistoryLookup, InMemoryEmbeddings, InMemoryHistories, UserId};
pub use recommender::{EmbeddingRecommender, Recommender, UserRecommender};
pub use select::{finalize, Selection};
