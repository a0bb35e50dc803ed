use distrec_core::{AnnBackend, Embedding, Error, HnswBackend, ItemId, Result, ScoreMap, SimilarityIndex};
use std::sync::Arc;

use crate::config::{RecommenderConfig, ResolutionPolicy};
use crate::lookup::{check_parallel, EmbeddingLookup, HistoryLookup, UserId};
use crate::select::finalize;

/// Anything that turns an input (a history, a user) into item scores.
///
/// The returned map is raw: exclusion and final selection are left to the
/// caller, see [`crate::finalize`].
pub trait Recommender: Send + Sync {
    type Input: ?Sized;

    fn recommend(&self, input: &Self::Input) -> Result<ScoreMap>;
}

/// Recommends the nearest neighbors of a user's history embeddings,
/// max-aggregated across history items
pub struct EmbeddingRecommender<L: EmbeddingLookup, B: AnnBackend = HnswBackend> {
    index: Arc<SimilarityIndex<B>>,
    lookup: L,
    config: RecommenderConfig,
}

impl<L: EmbeddingLookup, B: AnnBackend> EmbeddingRecommender<L, B> {
    pub fn new(index: Arc<SimilarityIndex<B>>, lookup: L, config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { index, lookup, config })
    }

    #[inline]
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    #[inline]
    pub fn index(&self) -> &Arc<SimilarityIndex<B>> {
        &self.index
    }

    /// History embeddings, with unresolved ids handled per the resolution policy
    fn resolve(&self, history_ids: &[ItemId]) -> Result<Vec<Embedding>> {
        let found = self.lookup.lookup(history_ids)?;
        check_parallel(history_ids.len(), found.len())?;

        match self.config.resolution {
            ResolutionPolicy::FailFast => history_ids
                .iter()
                .zip(found)
                .map(|(&id, embedding)| embedding.ok_or(Error::NotFound(id)))
                .collect(),
            ResolutionPolicy::Skip => {
                let resolved: Vec<Embedding> = found.into_iter().flatten().collect();
                let skipped = history_ids.len() - resolved.len();
                if skipped > 0 {
                    tracing::warn!(skipped, requested = history_ids.len(), "skipping unresolved history items");
                }
                Ok(resolved)
            }
        }
    }

    /// [`Recommender::recommend`] followed by [`finalize`] with the configured
    /// `k` and selection
    pub fn recommend_final(&self, history_ids: &[ItemId]) -> Result<ScoreMap> {
        let scores = self.recommend(history_ids)?;
        finalize(&scores, history_ids, self.config.k, self.config.selection)
    }
}

impl<L: EmbeddingLookup, B: AnnBackend> Recommender for EmbeddingRecommender<L, B> {
    type Input = [ItemId];

    fn recommend(&self, history_ids: &[ItemId]) -> Result<ScoreMap> {
        let history = self.resolve(history_ids)?;
        let scores = self.index.query(&history, self.config.fetch_size())?;

        tracing::info!(
            recommendations = scores.len(),
            history_items = history.len(),
            "Found {} recommendations for {} history items",
            scores.len(),
            history.len()
        );
        Ok(scores)
    }
}

/// Recommends for a user id by looking up the user's history and handing
/// it to a history-based recommender
pub struct UserRecommender<H: HistoryLookup, R> {
    histories: H,
    inner: R,
}

impl<H, R> UserRecommender<H, R>
where
    H: HistoryLookup,
    R: Recommender<Input = [ItemId]>,
{
    pub fn new(histories: H, inner: R) -> Self {
        Self { histories, inner }
    }

    #[inline]
    pub fn inner(&self) -> &R {
        &self.inner
    }

    #[inline]
    pub fn history(&self, user: UserId) -> Result<Vec<ItemId>> {
        self.histories.history(user)
    }
}

impl<H, R> Recommender for UserRecommender<H, R>
where
    H: HistoryLookup,
    R: Recommender<Input = [ItemId]>,
{
    type Input = UserId;

    fn recommend(&self, user: &UserId) -> Result<ScoreMap> {
        let history = self.histories.history(*user)?;
        tracing::debug!(user = *user, history_items = history.len(), "resolved user history");
        self.inner.recommend(&history)
    }
}
