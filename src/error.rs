//! Merge error types.

use thiserror::Error;

/// Errors raised while building a merge script.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The merge was asked for something that cannot be merged (missing
    /// team, same team on both sides).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A badge pair cannot be merged as requested.
    #[error("badge conflict: {0}")]
    BadgeConflict(String),

    /// Reading from the store failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;
