//! The [`EventStore`] trait defining the event storage interface.

use pledge_types::{EventId, EventListing, EventSnapshot, Timestamp};

use crate::error::StoreResult;

/// Storage backend for fundraising events.
///
/// Implementations must be thread-safe (`Send + Sync`) and every method must
/// appear atomic to concurrent callers: no caller may observe a partially
/// applied operation.
pub trait EventStore: Send + Sync {
    /// Append a new event and return its id.
    ///
    /// The id equals the sequence length minus one right after the append.
    /// No validation is done here; rejecting empty names, non-positive
    /// targets, or past deadlines is up to the caller.
    fn create(&self, name: &str, target_amount: f64, deadline: Timestamp) -> EventId;

    /// Partition all events into current and past, each ordered by ascending
    /// deadline with ties kept in insertion order.
    fn list(&self) -> EventListing;

    /// Add `amount` to the event's raised total.
    ///
    /// Fails with `InvalidIndex` if `id` is out of range and with
    /// `EventEnded` if the deadline has passed. Neither failure mutates state.
    fn donate(&self, id: EventId, amount: f64) -> StoreResult<()>;

    /// Atomic snapshot of one event.
    fn details(&self, id: EventId) -> StoreResult<EventSnapshot>;

    /// `true` iff at least one event has been created.
    fn exists(&self) -> bool;

    /// Number of stored events.
    fn len(&self) -> usize;
}
