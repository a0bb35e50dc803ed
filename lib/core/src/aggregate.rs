//! Max-aggregation of per-query neighbor hits.
//!
//! Every history embedding surfaces its own neighbor list; the same item can
//! show up under several of them. [`ScoreAggregator`] keeps one score per
//! item, the best similarity seen so far. An absent entry compares below any
//! observation, so the first sighting is always recorded as-is.
//!
//! The reduction is order independent, so partial aggregators built on
//! separate threads can be combined with [`ScoreAggregator::merge`].

use std::collections::hash_map::Entry;

use crate::{ItemId, ScoreMap};

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    scores: ScoreMap,
}

impl ScoreAggregator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: ScoreMap::with_capacity(capacity),
        }
    }

    /// Record one (item, similarity) observation.
    /// NaN carries no ordering and is dropped.
    #[inline]
    pub fn observe(&mut self, id: ItemId, similarity: f32) {
        if similarity.is_nan() {
            tracing::trace!(id = id, "dropping NaN similarity");
            return;
        }
        match self.scores.scores.entry(id) {
            Entry::Occupied(mut best) => {
                if similarity > *best.get() {
                    best.insert(similarity);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(similarity);
            }
        }
    }

    pub fn observe_all<I: IntoIterator<Item = (ItemId, f32)>>(&mut self, observations: I) {
        for (id, similarity) in observations {
            self.observe(id, similarity);
        }
    }

    /// Combine two partial aggregations
    #[must_use]
    pub fn merge(mut self, other: ScoreAggregator) -> Self {
        self.observe_all(other.scores);
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn finish(self) -> ScoreMap {
        self.scores
    }
}

impl FromIterator<(ItemId, f32)> for ScoreAggregator {
    fn from_iter<I: IntoIterator<Item = (ItemId, f32)>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        aggregator.observe_all(iter);
        aggregator
    }
}
