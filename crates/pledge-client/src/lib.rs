//! Client SDK for Pledge.
//!
//! [`PledgeClient`] turns each protocol operation into a typed async call and
//! maps the server's reply texts back into [`ClientError`] variants. The wire
//! is abstracted behind [`Transport`] so the same client speaks TCP or UDP.

pub mod client;
pub mod error;
pub mod transport;

pub use client::PledgeClient;
pub use error::{ClientError, ClientResult};
pub use transport::{TcpTransport, Transport, UdpTransport};

pub use pledge_types::{EventId, EventListing, EventSnapshot, EventSummary, Timestamp};
