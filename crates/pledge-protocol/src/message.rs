use std::fmt;

use pledge_types::{EventListing, EventSnapshot, Timestamp};

/// Longest string the wire format can carry (2-byte length prefix).
pub const MAX_STRING_LEN: usize = u16::MAX as usize;
/// Default upper bound on one TCP frame payload.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;
/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// All request types in the Pledge protocol.
///
/// Indices are kept as the raw signed wire value; range checks belong to the
/// event store.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    CreateEvent {
        name: String,
        target_amount: f64,
        deadline: Timestamp,
    },
    ListEvents,
    Donate {
        index: i32,
        amount: f64,
    },
    CheckDetails {
        index: i32,
    },
    CheckEventsExist,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CreateEvent { .. } => RequestKind::CreateEvent,
            Self::ListEvents => RequestKind::ListEvents,
            Self::Donate { .. } => RequestKind::Donate,
            Self::CheckDetails { .. } => RequestKind::CheckDetails,
            Self::CheckEventsExist => RequestKind::CheckEventsExist,
        }
    }
}

/// The tag that opens every request on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    CreateEvent,
    ListEvents,
    Donate,
    CheckDetails,
    CheckEventsExist,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        Self::CreateEvent,
        Self::ListEvents,
        Self::Donate,
        Self::CheckDetails,
        Self::CheckEventsExist,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateEvent => "CREATE_EVENT",
            Self::ListEvents => "LIST_EVENTS",
            Self::Donate => "DONATE",
            Self::CheckDetails => "CHECK_DETAILS",
            Self::CheckEventsExist => "CHECK_EVENTS_EXIST",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// All response shapes in the Pledge protocol.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Free-text reply: confirmations and every error.
    Message(String),
    Listing(EventListing),
    Details(EventSnapshot),
    Exists(bool),
}

impl Response {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(text) => Some(text),
            _ => None,
        }
    }
}

/// Canonical reply texts.
pub mod replies {
    pub const EVENT_CREATED: &str = "Event created successfully.";
    pub const DONATION_ACCEPTED: &str = "Donation successful. Thank you for your contribution!";
    pub const INVALID_INDEX: &str = "Invalid event index.";
    pub const EVENT_ENDED: &str = "Donation failed. The event has already ended.";
    pub const INVALID_REQUEST_TYPE: &str = "Invalid request type.";
    pub const PROCESSING_ERROR: &str = "Error processing request.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_resolve_back_to_kinds() {
        for kind in RequestKind::ALL {
            assert_eq!(RequestKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn unknown_and_case_mismatched_tags() {
        assert_eq!(RequestKind::from_tag("DELETE_EVENT"), None);
        assert_eq!(RequestKind::from_tag("donate"), None);
        assert_eq!(RequestKind::from_tag(""), None);
    }

    #[test]
    fn request_kind_matches_variant() {
        let req = Request::Donate { index: 0, amount: 1.0 };
        assert_eq!(req.kind(), RequestKind::Donate);
        assert_eq!(req.kind().to_string(), "DONATE");
        assert_eq!(Request::ListEvents.kind(), RequestKind::ListEvents);
    }

    #[test]
    fn message_accessor() {
        assert_eq!(
            Response::message(replies::EVENT_CREATED).as_message(),
            Some("Event created successfully.")
        );
        assert_eq!(Response::Exists(true).as_message(), None);
    }
}
