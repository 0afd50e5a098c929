//! Liveness bookkeeping for connectionless clients.
//!
//! UDP has no connect or close, so a client counts as connected from its first
//! datagram until it has been silent for the idle timeout. Eviction is purely
//! informational: it never touches the event store and never rejects a later
//! datagram, which simply registers the client again.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::info;

/// Last-contact table keyed by client address and port.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<SocketAddr, Instant>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<SocketAddr, Instant>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record contact from `client`. Returns `true` if it was not registered.
    pub fn touch(&self, client: SocketAddr, now: Instant) -> bool {
        self.clients().insert(client, now).is_none()
    }

    /// Remove every client idle for at least `threshold` as of `now`.
    pub fn sweep(&self, now: Instant, threshold: Duration) -> Vec<SocketAddr> {
        let mut evicted = Vec::new();
        self.clients().retain(|client, last_contact| {
            let idle = now.saturating_duration_since(*last_contact) >= threshold;
            if idle {
                evicted.push(*client);
            }
            !idle
        });
        evicted.sort();
        evicted
    }

    pub fn contains(&self, client: &SocketAddr) -> bool {
        self.clients().contains_key(client)
    }

    pub fn last_contact(&self, client: &SocketAddr) -> Option<Instant> {
        self.clients().get(client).copied()
    }

    pub fn len(&self) -> usize {
        self.clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients().is_empty()
    }
}

/// Sweep `registry` every `timeout`, logging each evicted client.
///
/// The first sweep happens one full period after the monitor starts.
pub fn spawn_idle_monitor(registry: Arc<ClientRegistry>, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + timeout, timeout);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for client in registry.sweep(Instant::now(), timeout) {
                info!(peer = %client, ip = %client.ip(), port = client.port(), "client disconnected");
            }
        }
    })
}
