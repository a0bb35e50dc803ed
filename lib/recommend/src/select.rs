// Final selection: drop what the user has already seen, then pick k.

use distrec_core::transform::{exclude, random_sample, top_k};
use distrec_core::{ItemId, Result, ScoreMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Selection {
    /// Highest scores, ties by ascending id
    #[default]
    TopK,
    /// Uniform draw without replacement, reproducible for a given seed
    Sample { seed: u64 },
}

/// Exclude `history` from `scores`, then select `k` entries.
///
/// Sampling more than the remaining entries is an `OutOfRange` error,
/// never a silent clamp.
pub fn finalize(scores: &ScoreMap, history: &[ItemId], k: usize, selection: Selection) -> Result<ScoreMap> {
    let fresh = exclude(scores, history.iter().copied());
    match selection {
        Selection::TopK => Ok(top_k(&fresh, k)),
        Selection::Sample { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            random_sample(&fresh, k, &mut rng)
        }
    }
}
