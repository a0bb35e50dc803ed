//! Pure transforms over a [`ScoreMap`]: ranking, exclusion, top-k and
//! seeded random sampling.
//!
//! Ranking is by score descending with ties broken by ascending [`ItemId`],
//! so every transform here is fully deterministic for a given input (and,
//! for sampling, a given RNG state).

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::{Error, ItemId, Result, ScoreMap};

/// Entries by score descending, ties by ascending id
#[must_use]
pub fn rank(scores: &ScoreMap) -> Vec<(ItemId, f32)> {
    let mut ranked: Vec<(ItemId, f32)> = scores.iter().collect();
    ranked.sort_unstable_by(|a, b| {
        OrderedFloat(b.1)
            .cmp(&OrderedFloat(a.1))
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

/// Ranked ids and scores as two aligned vectors
#[must_use]
pub fn unpack(scores: &ScoreMap) -> (Vec<ItemId>, Vec<f32>) {
    rank(scores).into_iter().unzip()
}

/// Drop every entry whose id is in `excluded`
pub fn exclude<I>(scores: &ScoreMap, excluded: I) -> ScoreMap
where
    I: IntoIterator<Item = ItemId>,
{
    let excluded: ahash::AHashSet<ItemId> = excluded.into_iter().collect();
    if excluded.is_empty() {
        return scores.clone();
    }
    scores
        .iter()
        .filter(|(id, _)| !excluded.contains(id))
        .collect()
}

/// The `k` best entries (all of them when `k >= len`)
#[must_use]
pub fn top_k(scores: &ScoreMap, k: usize) -> ScoreMap {
    rank(scores).into_iter().take(k).collect()
}

/// `k` entries drawn uniformly without replacement.
///
/// Entries are laid out by ascending id before drawing, so the outcome
/// depends only on the map contents and the RNG state.
pub fn random_sample<R: Rng + ?Sized>(scores: &ScoreMap, k: usize, rng: &mut R) -> Result<ScoreMap> {
    if k > scores.len() {
        return Err(Error::OutOfRange {
            requested: k,
            available: scores.len(),
        });
    }

    let mut population: Vec<(ItemId, f32)> = scores.iter().collect();
    population.sort_unstable_by_key(|&(id, _)| id);

    Ok(rand::seq::index::sample(rng, population.len(), k)
        .into_iter()
        .map(|i| population[i])
        .collect())
}
