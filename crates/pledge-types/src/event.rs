use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Timestamp;

/// Zero-based identifier of a fundraising event.
///
/// Equal to the event's insertion index in the store. Front-ends that show
/// one-based numbers apply the offset themselves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u32);

impl EventId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// The signed form carried on the wire.
    pub fn as_wire(&self) -> i32 {
        self.0 as i32
    }

    /// Convert a one-based display number into an id.
    pub fn from_display(number: u32) -> Option<Self> {
        number.checked_sub(1).map(Self)
    }

    /// One-based number for display.
    pub fn display_number(&self) -> u32 {
        self.0 + 1
    }
}

impl TryFrom<i32> for EventId {
    type Error = TypeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| TypeError::NegativeIndex(raw))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fundraising campaign.
///
/// Everything except `current_amount` is fixed at creation. Whether the event
/// is current or past is derived from `deadline` at query time and never
/// stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundraisingEvent {
    id: EventId,
    name: String,
    target_amount: f64,
    deadline: Timestamp,
    current_amount: f64,
}

impl FundraisingEvent {
    pub fn new(id: EventId, name: impl Into<String>, target_amount: f64, deadline: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            target_amount,
            deadline,
            current_amount: 0.0,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_amount(&self) -> f64 {
        self.target_amount
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn current_amount(&self) -> f64 {
        self.current_amount
    }

    /// `true` while the deadline is strictly in the future relative to `now`.
    pub fn is_current(&self, now: Timestamp) -> bool {
        self.deadline.is_after(&now)
    }

    /// Add a donation. Callers are responsible for checking the deadline.
    pub fn record_donation(&mut self, amount: f64) {
        self.current_amount += amount;
    }

    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            name: self.name.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            deadline: self.deadline,
        }
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            name: self.name.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            deadline: self.deadline,
        }
    }
}

/// Point-in-time copy of one event, as returned by a details lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Timestamp,
}

impl EventSnapshot {
    /// Fraction of the target raised so far.
    pub fn progress(&self) -> f64 {
        if self.target_amount > 0.0 {
            self.current_amount / self.target_amount
        } else {
            0.0
        }
    }

    /// Amount still needed to reach the target, never negative.
    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

/// One row of an event listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Timestamp,
}

/// All events partitioned into current and past, each sorted by deadline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventListing {
    pub current: Vec<EventSummary>,
    pub past: Vec<EventSummary>,
}

impl EventListing {
    pub fn len(&self) -> usize {
        self.current.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.past.is_empty()
    }
}
