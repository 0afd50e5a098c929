use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use pledge_protocol::{read_frame, write_frame, MAX_DATAGRAM_SIZE, MAX_FRAME_SIZE};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// One request payload out, one response payload back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, payload: &[u8]) -> ClientResult<Vec<u8>>;
}

/// Framed requests over a single persistent TCP connection.
pub struct TcpTransport {
    stream: Mutex<TcpStream>,
    max_frame_size: usize,
}

impl TcpTransport {
    pub async fn connect(addr: SocketAddr) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream: Mutex::new(stream),
            max_frame_size: MAX_FRAME_SIZE,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn round_trip(&self, payload: &[u8]) -> ClientResult<Vec<u8>> {
        let mut stream = self.stream.lock().await;
        write_frame(&mut *stream, payload).await?;
        read_frame(&mut *stream, self.max_frame_size)
            .await?
            .ok_or(ClientError::ConnectionClosed)
    }
}

/// One datagram per request, waiting up to `timeout` for the reply.
pub struct UdpTransport {
    socket: Mutex<UdpSocket>,
    timeout: Duration,
}

impl UdpTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub async fn connect(addr: SocketAddr) -> ClientResult<Self> {
        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        Ok(Self {
            socket: Mutex::new(socket),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn round_trip(&self, payload: &[u8]) -> ClientResult<Vec<u8>> {
        // Held across send and receive so concurrent calls cannot swap replies.
        let socket = self.socket.lock().await;
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        // A reply that arrived after an earlier call timed out would otherwise
        // be read as the answer to this request.
        while let Ok(len) = socket.try_recv(&mut buf) {
            debug!(bytes = len, "discarding stale reply");
        }
        socket.send(payload).await?;
        let len = tokio::time::timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;
        buf.truncate(len);
        Ok(buf)
    }
}
