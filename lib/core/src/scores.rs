use serde::{Deserialize, Serialize};
use std::collections::hash_map;
use std::collections::HashMap;

use crate::ItemId;

/// Item scores in similarity space (higher = more similar).
///
/// Unordered: use [`crate::transform::rank`] for a deterministic ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap {
    pub(crate) scores: HashMap<ItemId, f32, ahash::RandomState>,
}

impl ScoreMap {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: HashMap::with_capacity_and_hasher(capacity, ahash::RandomState::new()),
        }
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
    pub fn get(&self, id: ItemId) -> Option<f32> {
        self.scores.get(&id).copied()
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.scores.contains_key(&id)
    }

    /// Set the score for `id`, replacing any previous value
    #[inline]
    pub fn insert(&mut self, id: ItemId, score: f32) -> Option<f32> {
        self.scores.insert(id, score)
    }

    /// Entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, f32)> + '_ {
        self.scores.iter().map(|(&id, &score)| (id, score))
    }

    /// Ids in arbitrary order
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.scores.keys().copied()
    }
}

impl FromIterator<(ItemId, f32)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (ItemId, f32)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (id, score) in iter {
            map.insert(id, score);
        }
        map
    }
}

impl IntoIterator for ScoreMap {
    type Item = (ItemId, f32);
    type IntoIter = hash_map::IntoIter<ItemId, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.into_iter()
    }
}
