use distrec_core::{Error, IndexConfig, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::select::Selection;

/// What to do with history ids the embedding lookup cannot resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Abort the call with `Error::NotFound` on the first unresolved id
    #[default]
    FailFast,
    /// Drop unresolved ids and recommend from the rest
    Skip,
}

/// Configuration for an [`crate::EmbeddingRecommender`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Final result size
    pub k: usize,
    /// Over-fetch multiplier applied to `k` before filtering, at least 1.0
    pub sample_weight: f64,
    pub resolution: ResolutionPolicy,
    /// How [`crate::finalize`] picks the final `k`
    pub selection: Selection,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            k: 10,
            sample_weight: 1.0,
            resolution: ResolutionPolicy::FailFast,
            selection: Selection::TopK,
        }
    }
}

impl RecommenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig("k must be positive".to_string()));
        }
        if !self.sample_weight.is_finite() || self.sample_weight < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_weight must be a finite value >= 1.0, got {}",
                self.sample_weight
            )));
        }
        Ok(())
    }

    /// Neighbors fetched per history item: `floor(sample_weight * k)`
    #[inline]
    #[must_use]
    pub fn fetch_size(&self) -> usize {
        (self.sample_weight * self.k as f64).floor() as usize
    }
}

/// Index and recommender settings, as read from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexConfig,
    pub recommender: RecommenderConfig,
}

impl Settings {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let settings: Settings = serde_json::from_reader(BufReader::new(file))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.recommender.validate()
    }
}
