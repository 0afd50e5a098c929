//! Receive loop for the connectionless transport.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tracing::{error, info, warn};

use crate::dispatch::handle_datagram;
use crate::registry::ClientRegistry;
use crate::SharedStore;

/// Receive datagrams forever, answering each on its own task.
///
/// Every datagram refreshes its sender in `registry`; a sender seen for the
/// first time is logged as connected. Replies go back to the sender's address.
pub async fn serve_datagrams(
    socket: Arc<UdpSocket>,
    store: SharedStore,
    registry: Arc<ClientRegistry>,
    max_datagram_size: usize,
) {
    let mut buf = vec![0u8; max_datagram_size];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                // Typically an ICMP error from an earlier send; the socket stays usable.
                warn!(error = %e, "failed to receive datagram");
                continue;
            }
        };

        if registry.touch(peer, Instant::now()) {
            info!(peer = %peer, ip = %peer.ip(), port = peer.port(), "client connected");
        }

        let payload = buf[..len].to_vec();
        let socket = Arc::clone(&socket);
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let reply = match handle_datagram(store.as_ref(), &payload, peer, max_datagram_size) {
                Ok(reply) => reply,
                Err(e) => {
                    error!(peer = %peer, error = %e, "failed to encode reply");
                    return;
                }
            };
            if let Err(e) = socket.send_to(&reply, peer).await {
                warn!(peer = %peer, error = %e, bytes = reply.len(), "failed to send reply");
            }
        });
    }
}
