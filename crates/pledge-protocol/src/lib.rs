//! Wire protocol for Pledge.
//!
//! Requests and responses are flat sequences of typed big-endian fields.
//! Every request starts with its tag string; responses carry no tag and are
//! interpreted according to the request they answer. Over TCP each payload is
//! wrapped in a 4-byte length frame; over UDP one datagram holds one payload.

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::PledgeCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{read_frame, write_frame};
pub use message::{
    replies, Request, RequestKind, Response, MAX_DATAGRAM_SIZE, MAX_FRAME_SIZE, MAX_STRING_LEN,
};
