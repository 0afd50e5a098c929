//! Request handling shared by the TCP and UDP front doors.
//!
//! Decoding and encoding happen here, outside the store's lock; the store call
//! in the middle is the only step that touches shared state.

use std::net::SocketAddr;

use pledge_protocol::{replies, PledgeCodec, ProtocolError, ProtocolResult, Request, Response};
use pledge_store::{EventStore, StoreError, StoreResult};
use pledge_types::EventId;
use tracing::{debug, info, warn};

/// Apply one decoded request to the store.
///
/// Domain errors never escape; they become message responses.
pub fn handle_request(store: &dyn EventStore, request: Request) -> Response {
    match request {
        Request::CreateEvent {
            name,
            target_amount,
            deadline,
        } => {
            store.create(&name, target_amount, deadline);
            Response::message(replies::EVENT_CREATED)
        }
        Request::ListEvents => Response::Listing(store.list()),
        Request::Donate { index, amount } => {
            match resolve(store, index).and_then(|id| store.donate(id, amount)) {
                Ok(()) => Response::message(replies::DONATION_ACCEPTED),
                Err(e) => error_reply(&e),
            }
        }
        Request::CheckDetails { index } => {
            match resolve(store, index).and_then(|id| store.details(id)) {
                Ok(snapshot) => Response::Details(snapshot),
                Err(e) => error_reply(&e),
            }
        }
        Request::CheckEventsExist => Response::Exists(store.exists()),
    }
}

/// Decode a raw payload and handle it.
///
/// An unknown request type is answered with `Invalid request type.`; only a
/// payload that cannot be decoded at all comes back as `Err`, leaving the
/// transport to decide whether that ends the client's session.
pub fn handle_payload(
    store: &dyn EventStore,
    payload: &[u8],
    peer: SocketAddr,
) -> ProtocolResult<Response> {
    match PledgeCodec::decode_request(payload) {
        Ok(request) => {
            info!(peer = %peer, request = %request.kind(), "received request");
            Ok(handle_request(store, request))
        }
        Err(ProtocolError::UnknownRequestType(tag)) => {
            debug!(peer = %peer, tag = %tag, "unknown request type");
            Ok(Response::message(replies::INVALID_REQUEST_TYPE))
        }
        Err(e) => Err(e),
    }
}

/// Handle a datagram payload, always producing reply bytes.
///
/// A reply longer than `max_reply_size` cannot travel in one datagram and is
/// replaced by `Error processing request.`
pub fn handle_datagram(
    store: &dyn EventStore,
    payload: &[u8],
    peer: SocketAddr,
    max_reply_size: usize,
) -> ProtocolResult<Vec<u8>> {
    let response = handle_payload(store, payload, peer).unwrap_or_else(|e| {
        debug!(peer = %peer, error = %e, "undecodable datagram");
        Response::message(replies::PROCESSING_ERROR)
    });
    let reply = PledgeCodec::encode_response(&response)?;
    if reply.len() > max_reply_size {
        warn!(peer = %peer, size = reply.len(), max = max_reply_size, "reply exceeds datagram size");
        return PledgeCodec::encode_response(&Response::message(replies::PROCESSING_ERROR));
    }
    Ok(reply)
}

fn resolve(store: &dyn EventStore, index: i32) -> StoreResult<EventId> {
    EventId::try_from(index).map_err(|_| StoreError::InvalidIndex {
        index: i64::from(index),
        len: store.len(),
    })
}

fn error_reply(err: &StoreError) -> Response {
    match err {
        StoreError::InvalidIndex { .. } => Response::message(replies::INVALID_INDEX),
        StoreError::EventEnded(_) => Response::message(replies::EVENT_ENDED),
    }
}
