//! Event store for Pledge.
//!
//! Owns the insertion-ordered sequence of fundraising events and exposes the
//! only operations allowed to touch it:
//! - `create` appends an event and assigns its id in one step
//! - `list` partitions events into current and past against a single "now"
//! - `donate` adds to an event that has not yet ended
//! - `details` snapshots one event
//! - `exists` reports whether any event has been created
//!
//! All locking lives inside [`InMemoryEventStore`]; callers never see a guard.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryEventStore;
pub use traits::EventStore;
