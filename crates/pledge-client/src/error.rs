use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid event index")]
    InvalidIndex,

    #[error("event has already ended")]
    EventEnded,

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response to {request}: {got}")]
    UnexpectedResponse { request: &'static str, got: String },

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("protocol error: {0}")]
    Protocol(#[from] pledge_protocol::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
