use std::net::SocketAddr;

use pledge_protocol::{replies, PledgeCodec, Request, Response};
use pledge_types::{EventListing, EventSnapshot, Timestamp};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::transport::{TcpTransport, Transport, UdpTransport};

/// High-level Pledge client.
///
/// Event indices are the zero-based ids used on the wire.
pub struct PledgeClient {
    transport: Box<dyn Transport>,
}

impl PledgeClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub async fn connect_tcp(addr: SocketAddr) -> ClientResult<Self> {
        Ok(Self::new(TcpTransport::connect(addr).await?))
    }

    pub async fn connect_udp(addr: SocketAddr) -> ClientResult<Self> {
        Ok(Self::new(UdpTransport::connect(addr).await?))
    }

    /// Send a request and decode the reply shape expected for it.
    pub async fn call(&self, request: &Request) -> ClientResult<Response> {
        let payload = PledgeCodec::encode_request(request)?;
        let reply = self.transport.round_trip(&payload).await?;
        let response = PledgeCodec::decode_response(request.kind(), &reply)?;
        debug!(request = %request.kind(), "received response");
        Ok(response)
    }

    pub async fn create_event(
        &self,
        name: &str,
        target_amount: f64,
        deadline: Timestamp,
    ) -> ClientResult<()> {
        let request = Request::CreateEvent {
            name: name.to_string(),
            target_amount,
            deadline,
        };
        match self.call(&request).await? {
            Response::Message(text) if text == replies::EVENT_CREATED => Ok(()),
            other => Err(reply_error("CREATE_EVENT", other)),
        }
    }

    pub async fn list_events(&self) -> ClientResult<EventListing> {
        match self.call(&Request::ListEvents).await? {
            Response::Listing(listing) => Ok(listing),
            other => Err(reply_error("LIST_EVENTS", other)),
        }
    }

    pub async fn donate(&self, index: i32, amount: f64) -> ClientResult<()> {
        match self.call(&Request::Donate { index, amount }).await? {
            Response::Message(text) if text == replies::DONATION_ACCEPTED => Ok(()),
            other => Err(reply_error("DONATE", other)),
        }
    }

    pub async fn event_details(&self, index: i32) -> ClientResult<EventSnapshot> {
        match self.call(&Request::CheckDetails { index }).await? {
            Response::Details(snapshot) => Ok(snapshot),
            other => Err(reply_error("CHECK_DETAILS", other)),
        }
    }

    pub async fn events_exist(&self) -> ClientResult<bool> {
        match self.call(&Request::CheckEventsExist).await? {
            Response::Exists(exists) => Ok(exists),
            other => Err(reply_error("CHECK_EVENTS_EXIST", other)),
        }
    }
}

fn reply_error(request: &'static str, response: Response) -> ClientError {
    match response {
        Response::Message(text) => match text.as_str() {
            replies::INVALID_INDEX => ClientError::InvalidIndex,
            replies::EVENT_ENDED => ClientError::EventEnded,
            _ => ClientError::Rejected(text),
        },
        other => ClientError::UnexpectedResponse {
            request,
            got: format!("{other:?}"),
        },
    }
}
