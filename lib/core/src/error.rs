use thiserror::Error;

use crate::ItemId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Cannot build an index over an empty corpus")]
    EmptyCorpus,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Embedding lookup failed: {0}")]
    Lookup(String),

    #[error("Cannot sample {requested} entries from a population of {available}")]
    OutOfRange { requested: usize, available: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
