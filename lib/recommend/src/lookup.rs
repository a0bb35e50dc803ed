//! Lookup capabilities the recommenders consume.
//!
//! Both traits are implemented for plain closures so a remote store or a
//! feature service can be plugged in without a wrapper type.

use distrec_core::{Embedding, Error, ItemId, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// User identifier for [`crate::UserRecommender`]
pub type UserId = u64;

/// Resolves item ids to embeddings.
///
/// The result is parallel to `ids`; `None` marks an id the store does not
/// know. What happens to those is the recommender's resolution policy.
/// `Err` is reserved for the store itself failing.
pub trait EmbeddingLookup: Send + Sync {
    fn lookup(&self, ids: &[ItemId]) -> Result<Vec<Option<Embedding>>>;
}

impl<F> EmbeddingLookup for F
where
    F: Fn(&[ItemId]) -> Result<Vec<Option<Embedding>>> + Send + Sync,
{
    fn lookup(&self, ids: &[ItemId]) -> Result<Vec<Option<Embedding>>> {
        self(ids)
    }
}

/// Resolves a user to the item ids in their history
pub trait HistoryLookup: Send + Sync {
    fn history(&self, user: UserId) -> Result<Vec<ItemId>>;
}

impl<F> HistoryLookup for F
where
    F: Fn(UserId) -> Result<Vec<ItemId>> + Send + Sync,
{
    fn history(&self, user: UserId) -> Result<Vec<ItemId>> {
        self(user)
    }
}

/// Embedding table held in memory; the row index is the item id.
///
/// Usually the same rows the index was built from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct InMemoryEmbeddings {
    embeddings: Vec<Embedding>,
}

impl InMemoryEmbeddings {
    #[must_use]
    pub fn new(embeddings: Vec<Embedding>) -> Self {
        Self { embeddings }
    }

    /// Read a JSON array of number arrays
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let table: Self = serde_json::from_reader(reader)?;
        Ok(table)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    #[inline]
    pub fn get(&self, id: ItemId) -> Option<&Embedding> {
        self.embeddings.get(id)
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Embedding] {
        &self.embeddings
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

impl EmbeddingLookup for InMemoryEmbeddings {
    fn lookup(&self, ids: &[ItemId]) -> Result<Vec<Option<Embedding>>> {
        Ok(ids.iter().map(|&id| self.embeddings.get(id).cloned()).collect())
    }
}

/// User histories held in memory. Unknown users have an empty history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistories {
    histories: HashMap<UserId, Vec<ItemId>, ahash::RandomState>,
}

impl InMemoryHistories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: UserId, history: Vec<ItemId>) {
        self.histories.insert(user, history);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

impl FromIterator<(UserId, Vec<ItemId>)> for InMemoryHistories {
    fn from_iter<I: IntoIterator<Item = (UserId, Vec<ItemId>)>>(iter: I) -> Self {
        let mut histories = Self::new();
        for (user, history) in iter {
            histories.insert(user, history);
        }
        histories
    }
}

impl HistoryLookup for InMemoryHistories {
    fn history(&self, user: UserId) -> Result<Vec<ItemId>> {
        Ok(self.histories.get(&user).cloned().unwrap_or_default())
    }
}

/// Check that a lookup answered one slot per requested id
pub(crate) fn check_parallel(requested: usize, returned: usize) -> Result<()> {
    if requested != returned {
        return Err(Error::Lookup(format!(
            "lookup returned {} embeddings for {} ids",
            returned, requested
        )));
    }
    Ok(())
}
