//! Coordination server for Pledge.
//!
//! Serves the fundraising protocol over either TCP (one task per connection)
//! or UDP (one task per datagram plus an idle-client monitor). Both transports
//! share [`dispatch`] and a single event store.

pub mod config;
pub mod datagram;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod server;
pub mod session;

#[cfg(test)]
pub(crate) mod test_logs;

use std::sync::Arc;

use pledge_store::EventStore;

pub use config::{ServerConfig, Transport};
pub use error::{ServerError, ServerResult};
pub use registry::{spawn_idle_monitor, ClientRegistry};
pub use server::PledgeServer;
pub use session::{run_session, SessionEnd};

/// Event store shared by every session and datagram task.
pub type SharedStore = Arc<dyn EventStore>;
