use pledge_types::EventId;
use thiserror::Error;

/// Domain errors returned by event store operations.
///
/// None of these are fatal; the request handler turns each one into a
/// response for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid event index: {index} (store holds {len} events)")]
    InvalidIndex { index: i64, len: usize },

    #[error("event {0} has already ended")]
    EventEnded(EventId),
}

pub type StoreResult<T> = Result<T, StoreError>;
