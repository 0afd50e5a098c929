//! In-memory event store.
//!
//! [`InMemoryEventStore`] keeps every event in a `Vec` behind one `Mutex`.
//! Data is lost when the store is dropped.

use std::sync::{Mutex, MutexGuard, PoisonError};

use pledge_types::{
    Clock, EventId, EventListing, EventSnapshot, EventSummary, FundraisingEvent, SystemClock,
    Timestamp,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::EventStore;

/// An in-memory implementation of [`EventStore`].
///
/// The sequence is never reordered; sorted and partitioned views are built
/// per call. The clock decides which events are current.
#[derive(Debug)]
pub struct InMemoryEventStore<C: Clock = SystemClock> {
    clock: C,
    events: Mutex<Vec<FundraisingEvent>>,
}

impl InMemoryEventStore<SystemClock> {
    /// Create a new empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryEventStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryEventStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            events: Mutex::new(Vec::new()),
        }
    }

    // Every mutation is a single step, so a panic elsewhere cannot leave the
    // sequence half-written; recover the guard instead of propagating poison.
    fn events(&self) -> MutexGuard<'_, Vec<FundraisingEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalid_index(id: EventId, len: usize) -> StoreError {
        StoreError::InvalidIndex {
            index: id.index() as i64,
            len,
        }
    }
}

impl<C: Clock> EventStore for InMemoryEventStore<C> {
    fn create(&self, name: &str, target_amount: f64, deadline: Timestamp) -> EventId {
        let mut events = self.events();
        let id = EventId::new(events.len() as u32);
        events.push(FundraisingEvent::new(id, name, target_amount, deadline));
        debug!(%id, name, target_amount, %deadline, "event created");
        id
    }

    fn list(&self) -> EventListing {
        let (mut current, mut past): (Vec<EventSummary>, Vec<EventSummary>) = {
            let events = self.events();
            let now = self.clock.now();
            events
                .iter()
                .map(FundraisingEvent::summary)
                .partition(|e| e.deadline.is_after(&now))
        };

        // Stable sort keeps insertion order among equal deadlines.
        current.sort_by_key(|e| e.deadline);
        past.sort_by_key(|e| e.deadline);
        EventListing { current, past }
    }

    fn donate(&self, id: EventId, amount: f64) -> StoreResult<()> {
        let mut events = self.events();
        let len = events.len();
        let now = self.clock.now();
        let event = events
            .get_mut(id.index())
            .ok_or_else(|| Self::invalid_index(id, len))?;
        if !event.is_current(now) {
            return Err(StoreError::EventEnded(id));
        }
        event.record_donation(amount);
        debug!(%id, amount, total = event.current_amount(), "donation recorded");
        Ok(())
    }

    fn details(&self, id: EventId) -> StoreResult<EventSnapshot> {
        let events = self.events();
        events
            .get(id.index())
            .map(FundraisingEvent::snapshot)
            .ok_or_else(|| Self::invalid_index(id, events.len()))
    }

    fn exists(&self) -> bool {
        !self.events().is_empty()
    }

    fn len(&self) -> usize {
        self.events().len()
    }
}
