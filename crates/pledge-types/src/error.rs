use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("negative event index: {0}")]
    NegativeIndex(i32),
}
