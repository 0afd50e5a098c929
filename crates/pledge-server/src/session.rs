//! Per-connection request loop for stream transports.

use std::net::SocketAddr;

use pledge_protocol::{read_frame, write_frame, PledgeCodec, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::dispatch::handle_payload;
use crate::SharedStore;

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The peer closed the stream between requests.
    Closed { served: u64 },
    /// A request could not be decoded; the connection is dropped.
    Malformed { served: u64, error: ProtocolError },
    /// Reading or writing the stream failed.
    Transport { served: u64, error: ProtocolError },
}

impl SessionEnd {
    pub fn served(&self) -> u64 {
        match self {
            Self::Closed { served }
            | Self::Malformed { served, .. }
            | Self::Transport { served, .. } => *served,
        }
    }
}

/// Serve one connection until it closes or fails.
///
/// Requests are handled strictly one after another: read a frame, dispatch it,
/// write the reply, repeat. The stream is dropped on return.
pub async fn run_session<S>(
    mut stream: S,
    peer: SocketAddr,
    store: SharedStore,
    max_frame_size: usize,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!(peer = %peer, "client connected");
    let mut served = 0u64;

    let end = loop {
        let payload = match read_frame(&mut stream, max_frame_size).await {
            Ok(Some(payload)) => payload,
            Ok(None) => break SessionEnd::Closed { served },
            Err(error) => break SessionEnd::Transport { served, error },
        };

        let response = match handle_payload(store.as_ref(), &payload, peer) {
            Ok(response) => response,
            Err(error) => break SessionEnd::Malformed { served, error },
        };

        let reply = match PledgeCodec::encode_response(&response) {
            Ok(reply) => reply,
            Err(error) => break SessionEnd::Transport { served, error },
        };
        if let Err(error) = write_frame(&mut stream, &reply).await {
            break SessionEnd::Transport { served, error };
        }
        served += 1;
    };

    match &end {
        SessionEnd::Closed { .. } => {}
        SessionEnd::Malformed { error, .. } => {
            warn!(peer = %peer, error = %error, "malformed request, closing connection");
        }
        SessionEnd::Transport { error, .. } => {
            debug!(peer = %peer, error = %error, "transport error");
        }
    }
    info!(peer = %peer, served = end.served(), "client disconnected");
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use pledge_protocol::{replies, Request, RequestKind, Response, MAX_FRAME_SIZE};
    use pledge_store::InMemoryEventStore;
    use pledge_types::Timestamp;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    fn peer() -> SocketAddr {
        "10.0.0.7:5555".parse().unwrap()
    }

    fn spawn_session(store: SharedStore) -> (DuplexStream, JoinHandle<SessionEnd>) {
        let (client, server) = duplex(64 * 1024);
        let handle = tokio::spawn(run_session(server, peer(), store, MAX_FRAME_SIZE));
        (client, handle)
    }

    async fn call(stream: &mut DuplexStream, request: &Request) -> Response {
        let payload = PledgeCodec::encode_request(request).unwrap();
        write_frame(stream, &payload).await.unwrap();
        let reply = read_frame(stream, MAX_FRAME_SIZE).await.unwrap().unwrap();
        PledgeCodec::decode_response(request.kind(), &reply).unwrap()
    }

    #[tokio::test]
    async fn sequential_requests_on_one_connection() {
        let store: SharedStore = Arc::new(InMemoryEventStore::new());
        let (mut client, handle) = spawn_session(Arc::clone(&store));

        let deadline = Timestamp::now().saturating_add(Duration::from_secs(3600));
        let created = call(
            &mut client,
            &Request::CreateEvent {
                name: "Shelter".into(),
                target_amount: 1000.0,
                deadline,
            },
        )
        .await;
        assert_eq!(created.as_message(), Some(replies::EVENT_CREATED));

        let donated = call(&mut client, &Request::Donate { index: 0, amount: 250.0 }).await;
        assert_eq!(donated.as_message(), Some(replies::DONATION_ACCEPTED));

        let Response::Details(snap) = call(&mut client, &Request::CheckDetails { index: 0 }).await
        else {
            panic!("expected details");
        };
        assert_eq!(snap.current_amount, 250.0);

        drop(client);
        let end = handle.await.unwrap();
        assert!(matches!(end, SessionEnd::Closed { served: 3 }));
    }

    #[tokio::test]
    async fn unknown_tag_keeps_session_open() {
        let store: SharedStore = Arc::new(InMemoryEventStore::new());
        let (mut client, handle) = spawn_session(store);

        let mut bogus = 5u16.to_be_bytes().to_vec();
        bogus.extend_from_slice(b"HELLO");
        write_frame(&mut client, &bogus).await.unwrap();
        let reply = read_frame(&mut client, MAX_FRAME_SIZE).await.unwrap().unwrap();
        let reply = PledgeCodec::decode_response(RequestKind::CreateEvent, &reply).unwrap();
        assert_eq!(reply.as_message(), Some(replies::INVALID_REQUEST_TYPE));

        let exists = call(&mut client, &Request::CheckEventsExist).await;
        assert_eq!(exists, Response::Exists(false));

        drop(client);
        assert_eq!(handle.await.unwrap().served(), 2);
    }

    #[tokio::test]
    async fn malformed_request_closes_session() {
        let store: SharedStore = Arc::new(InMemoryEventStore::new());
        let (mut client, handle) = spawn_session(store);

        let full = PledgeCodec::encode_request(&Request::CheckDetails { index: 0 }).unwrap();
        write_frame(&mut client, &full[..full.len() - 2]).await.unwrap();

        let end = handle.await.unwrap();
        assert!(matches!(
            end,
            SessionEnd::Malformed {
                served: 0,
                error: ProtocolError::MalformedRequest(_)
            }
        ));
        assert!(read_frame(&mut client, MAX_FRAME_SIZE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn truncated_frame_is_a_transport_error() {
        let store: SharedStore = Arc::new(InMemoryEventStore::new());
        let (mut client, handle) = spawn_session(Arc::clone(&store));

        client.write_all(&[0, 0, 0, 40, 1, 2]).await.unwrap();
        drop(client);

        let end = handle.await.unwrap();
        assert!(matches!(end, SessionEnd::Transport { served: 0, .. }));
        assert!(!store.exists());
    }
}
