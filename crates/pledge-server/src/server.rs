use std::net::SocketAddr;
use std::sync::Arc;

use pledge_store::InMemoryEventStore;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{error, info};

use crate::config::{ServerConfig, Transport};
use crate::datagram::serve_datagrams;
use crate::error::{ServerError, ServerResult};
use crate::registry::{spawn_idle_monitor, ClientRegistry};
use crate::session::run_session;
use crate::SharedStore;

enum Bound {
    Tcp(TcpListener),
    Udp(Arc<UdpSocket>),
}

/// Pledge coordination server, bound and ready to serve.
pub struct PledgeServer {
    config: ServerConfig,
    store: SharedStore,
    registry: Arc<ClientRegistry>,
    bound: Bound,
    local_addr: SocketAddr,
}

impl PledgeServer {
    /// Bind with a fresh, empty in-memory store.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        Self::bind_with_store(config, Arc::new(InMemoryEventStore::new())).await
    }

    /// Bind the configured transport. Failure here is fatal to startup.
    pub async fn bind_with_store(config: ServerConfig, store: SharedStore) -> ServerResult<Self> {
        config.validate()?;
        let addr = config.bind_addr;
        let bind_err = |source| ServerError::Bind { addr, source };
        let bound = match config.transport {
            Transport::Tcp => Bound::Tcp(TcpListener::bind(addr).await.map_err(bind_err)?),
            Transport::Udp => Bound::Udp(Arc::new(UdpSocket::bind(addr).await.map_err(bind_err)?)),
        };
        let local_addr = match &bound {
            Bound::Tcp(listener) => listener.local_addr()?,
            Bound::Udp(socket) => socket.local_addr()?,
        };
        Ok(Self {
            config,
            store,
            registry: Arc::new(ClientRegistry::new()),
            bound,
            local_addr,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Connectionless client table; stays empty in TCP mode.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Serve requests until the task is dropped.
    pub async fn serve(self) -> ServerResult<()> {
        info!(
            addr = %self.local_addr,
            transport = %self.config.transport,
            "Pledge server listening"
        );
        match self.bound {
            Bound::Tcp(listener) => {
                let max_frame_size = self.config.max_frame_size;
                loop {
                    match listener.accept().await {
                        Ok((stream, peer)) => {
                            let store = Arc::clone(&self.store);
                            tokio::spawn(run_session(stream, peer, store, max_frame_size));
                        }
                        Err(e) => error!(error = %e, "failed to accept connection"),
                    }
                }
            }
            Bound::Udp(socket) => {
                let monitor =
                    spawn_idle_monitor(Arc::clone(&self.registry), self.config.idle_timeout());
                serve_datagrams(socket, self.store, self.registry, self.config.max_datagram_size)
                    .await;
                monitor.abort();
                Ok(())
            }
        }
    }
}
