use bytes::{Buf, BufMut};
use pledge_types::{EventId, EventListing, EventSnapshot, EventSummary, Timestamp};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Request, RequestKind, Response, MAX_STRING_LEN};

/// Codec for encoding/decoding Pledge protocol payloads.
///
/// Field encodings: strings are a 2-byte big-endian length followed by UTF-8
/// bytes, reals are 8-byte IEEE-754, timestamps 8-byte signed epoch millis,
/// counts and indices 4-byte signed, booleans one byte.
pub struct PledgeCodec;

impl PledgeCodec {
    /// Encode a request payload: [tag][fields...]
    pub fn encode_request(request: &Request) -> ProtocolResult<Vec<u8>> {
        let mut buf = Vec::new();
        put_string(&mut buf, request.kind().tag())?;
        match request {
            Request::CreateEvent {
                name,
                target_amount,
                deadline,
            } => {
                put_string(&mut buf, name)?;
                buf.put_f64(*target_amount);
                buf.put_i64(deadline.as_millis());
            }
            Request::Donate { index, amount } => {
                buf.put_i32(*index);
                buf.put_f64(*amount);
            }
            Request::CheckDetails { index } => buf.put_i32(*index),
            Request::ListEvents | Request::CheckEventsExist => {}
        }
        Ok(buf)
    }

    /// Decode a request payload.
    ///
    /// An unrecognised tag yields `UnknownRequestType`; anything else that
    /// cannot be read yields `MalformedRequest`. Bytes after the last
    /// expected field are ignored.
    pub fn decode_request(data: &[u8]) -> ProtocolResult<Request> {
        let mut r = FieldReader::new(data, ProtocolError::MalformedRequest);
        let tag = r.string("request type")?;
        let kind = RequestKind::from_tag(&tag).ok_or(ProtocolError::UnknownRequestType(tag))?;
        let request = match kind {
            RequestKind::CreateEvent => Request::CreateEvent {
                name: r.string("name")?,
                target_amount: r.f64("target amount")?,
                deadline: r.timestamp("deadline")?,
            },
            RequestKind::ListEvents => Request::ListEvents,
            RequestKind::Donate => Request::Donate {
                index: r.i32("event index")?,
                amount: r.f64("donation amount")?,
            },
            RequestKind::CheckDetails => Request::CheckDetails {
                index: r.i32("event index")?,
            },
            RequestKind::CheckEventsExist => Request::CheckEventsExist,
        };
        Ok(request)
    }

    /// Encode a response payload. Equal responses encode to equal bytes.
    pub fn encode_response(response: &Response) -> ProtocolResult<Vec<u8>> {
        let mut buf = Vec::new();
        match response {
            Response::Message(text) => put_string(&mut buf, text)?,
            Response::Listing(listing) => {
                put_count(&mut buf, listing.current.len())?;
                put_count(&mut buf, listing.past.len())?;
                for row in listing.current.iter().chain(&listing.past) {
                    buf.put_i32(row.id.as_wire());
                    put_string(&mut buf, &row.name)?;
                    buf.put_f64(row.target_amount);
                    buf.put_f64(row.current_amount);
                    buf.put_i64(row.deadline.as_millis());
                }
            }
            Response::Details(snapshot) => {
                put_string(&mut buf, &snapshot.name)?;
                buf.put_f64(snapshot.target_amount);
                buf.put_f64(snapshot.current_amount);
                buf.put_i64(snapshot.deadline.as_millis());
            }
            Response::Exists(exists) => buf.put_u8(u8::from(*exists)),
        }
        Ok(buf)
    }

    /// Decode the response to a request of the given kind.
    ///
    /// Errors come back as a plain message in place of the typed payload, so
    /// when the expected shape does not account for every byte the payload is
    /// read as a single message instead.
    pub fn decode_response(kind: RequestKind, data: &[u8]) -> ProtocolResult<Response> {
        let typed = match kind {
            RequestKind::CreateEvent | RequestKind::Donate => return decode_message(data),
            RequestKind::ListEvents => decode_listing(data).map(Response::Listing),
            RequestKind::CheckDetails => decode_details(data).map(Response::Details),
            RequestKind::CheckEventsExist => decode_exists(data).map(Response::Exists),
        };
        typed.or_else(|typed_err| decode_message(data).map_err(|_| typed_err))
    }
}

fn decode_message(data: &[u8]) -> ProtocolResult<Response> {
    let mut r = FieldReader::new(data, ProtocolError::MalformedResponse);
    let text = r.string("message")?;
    r.finish()?;
    Ok(Response::Message(text))
}

fn decode_listing(data: &[u8]) -> ProtocolResult<EventListing> {
    let mut r = FieldReader::new(data, ProtocolError::MalformedResponse);
    let current_count = r.count("current count")?;
    let past_count = r.count("past count")?;
    let mut listing = EventListing::default();
    for _ in 0..current_count {
        listing.current.push(r.summary()?);
    }
    for _ in 0..past_count {
        listing.past.push(r.summary()?);
    }
    r.finish()?;
    Ok(listing)
}

fn decode_details(data: &[u8]) -> ProtocolResult<EventSnapshot> {
    let mut r = FieldReader::new(data, ProtocolError::MalformedResponse);
    let snapshot = EventSnapshot {
        name: r.string("name")?,
        target_amount: r.f64("target amount")?,
        current_amount: r.f64("current amount")?,
        deadline: r.timestamp("deadline")?,
    };
    r.finish()?;
    Ok(snapshot)
}

fn decode_exists(data: &[u8]) -> ProtocolResult<bool> {
    let mut r = FieldReader::new(data, ProtocolError::MalformedResponse);
    let exists = r.bool("exists")?;
    r.finish()?;
    Ok(exists)
}

fn put_string(buf: &mut Vec<u8>, s: &str) -> ProtocolResult<()> {
    let len = u16::try_from(s.len()).map_err(|_| ProtocolError::StringTooLong {
        len: s.len(),
        max: MAX_STRING_LEN,
    })?;
    buf.put_u16(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn put_count(buf: &mut Vec<u8>, count: usize) -> ProtocolResult<()> {
    let count = i32::try_from(count)
        .map_err(|_| ProtocolError::MalformedResponse(format!("too many events: {count}")))?;
    buf.put_i32(count);
    Ok(())
}

/// Bounds-checked cursor over a payload.
///
/// `bytes::Buf` panics on underflow, so every read checks `remaining()`
/// first and reports the missing field through `malformed`.
struct FieldReader<'a> {
    buf: &'a [u8],
    malformed: fn(String) -> ProtocolError,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8], malformed: fn(String) -> ProtocolError) -> Self {
        Self { buf, malformed }
    }

    fn need(&self, field: &str, n: usize) -> ProtocolResult<()> {
        if self.buf.remaining() < n {
            return Err((self.malformed)(format!(
                "truncated {field}: need {n} bytes, have {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn string(&mut self, field: &str) -> ProtocolResult<String> {
        self.need(field, 2)?;
        let len = self.buf.get_u16() as usize;
        self.need(field, len)?;
        let (raw, rest) = self.buf.split_at(len);
        self.buf = rest;
        String::from_utf8(raw.to_vec())
            .map_err(|e| (self.malformed)(format!("{field} is not valid UTF-8: {e}")))
    }

    fn f64(&mut self, field: &str) -> ProtocolResult<f64> {
        self.need(field, 8)?;
        Ok(self.buf.get_f64())
    }

    fn i32(&mut self, field: &str) -> ProtocolResult<i32> {
        self.need(field, 4)?;
        Ok(self.buf.get_i32())
    }

    fn timestamp(&mut self, field: &str) -> ProtocolResult<Timestamp> {
        self.need(field, 8)?;
        Ok(Timestamp::from_millis(self.buf.get_i64()))
    }

    fn bool(&mut self, field: &str) -> ProtocolResult<bool> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8() != 0)
    }

    fn count(&mut self, field: &str) -> ProtocolResult<usize> {
        let raw = self.i32(field)?;
        usize::try_from(raw).map_err(|_| (self.malformed)(format!("negative {field}: {raw}")))
    }

    fn summary(&mut self) -> ProtocolResult<EventSummary> {
        let raw_id = self.i32("event id")?;
        let id = EventId::try_from(raw_id).map_err(|e| (self.malformed)(e.to_string()))?;
        Ok(EventSummary {
            id,
            name: self.string("name")?,
            target_amount: self.f64("target amount")?,
            current_amount: self.f64("current amount")?,
            deadline: self.timestamp("deadline")?,
        })
    }

    fn finish(&self) -> ProtocolResult<()> {
        if self.buf.has_remaining() {
            return Err((self.malformed)(format!(
                "{} trailing bytes",
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}
