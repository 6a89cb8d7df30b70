use std::io;
use thiserror::Error;

use crate::types::Version;

#[derive(Error, Debug)]
pub enum OrdoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Concurrency conflict on {aggregate}: expected version {expected}, got {actual}")]
    Concurrency {
        aggregate: String,
        expected: Version,
        actual: Version,
    },

    #[error("Batch holds events for more than one aggregate: {0}")]
    MixedBatch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl OrdoError {
    /// Whether the concurrency validator rejected the batch.
    ///
    /// A version mismatch clears up after re-reading the stream. A mixed batch
    /// never does, so retry loops should only build single-aggregate batches.
    pub fn is_conflict(&self) -> bool {
        matches!(self, OrdoError::Concurrency { .. } | OrdoError::MixedBatch(_))
    }

    /// Whether the error means the store could not be brought up at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrdoError::Config(_) | OrdoError::Timeout(_) | OrdoError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OrdoError>;
