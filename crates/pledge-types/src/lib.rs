//! Foundation types for Pledge.
//!
//! This crate provides the event record, identifier, and temporal types used
//! throughout the Pledge system. Every other Pledge crate depends on
//! `pledge-types`.
//!
//! # Key Types
//!
//! - [`EventId`]: Zero-based insertion index of a fundraising event
//! - [`FundraisingEvent`]: A campaign record with a single mutable amount
//! - [`EventSnapshot`] / [`EventSummary`]: Immutable views handed to callers
//! - [`Timestamp`]: Wall-clock epoch milliseconds
//! - [`Clock`]: Source of "now" for current/past classification

pub mod error;
pub mod event;
pub mod temporal;

pub use error::TypeError;
pub use event::{EventId, EventListing, EventSnapshot, EventSummary, FundraisingEvent};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
