use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wall-clock timestamp in milliseconds since the UNIX epoch.
///
/// This is the unit carried on the wire for event deadlines (8-byte signed
/// big-endian). Values before the epoch are representable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis() as i64,
            Err(e) => -(e.duration().as_millis() as i64),
        };
        Self(millis)
    }

    /// Returns `true` if this timestamp is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as i64))
    }

    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_millis() as i64))
    }

    /// Parse a deadline as typed by a user.
    ///
    /// Accepts RFC 3339 (`2026-12-31T18:00:00Z`), ISO dates (`2026-12-31`),
    /// and US-style dates (`12-31-2026`). Bare dates resolve to midnight UTC.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let input = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self(dt.timestamp_millis()));
        }
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(input, "%m-%d-%Y"))
            .map_err(|_| TypeError::InvalidTimestamp(input.to_string()))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TypeError::InvalidTimestamp(input.to_string()))?;
        Ok(Self(midnight.and_utc().timestamp_millis()))
    }

    /// Convert to a `chrono` UTC datetime, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of the current time.
///
/// The event store reads "now" through a clock so that the current/past
/// classification can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(start.as_millis()),
        }
    }

    pub fn set(&self, to: Timestamp) {
        self.millis.store(to.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn now_is_after_epoch() {
        assert!(Timestamp::now().is_after(&Timestamp::from_millis(0)));
    }

    #[test]
    fn parse_iso_date() {
        let ts = Timestamp::parse("2030-01-02").unwrap();
        assert_eq!(ts.as_millis(), 1_893_542_400_000);
    }

    #[test]
    fn parse_us_date_matches_iso() {
        assert_eq!(
            Timestamp::parse("01-02-2030").unwrap(),
            Timestamp::parse("2030-01-02").unwrap()
        );
    }

    #[test]
    fn parse_rfc3339() {
        let ts = Timestamp::parse("1970-01-01T00:00:01Z").unwrap();
        assert_eq!(ts.as_millis(), 1000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Timestamp::parse("next tuesday"),
            Err(TypeError::InvalidTimestamp(_))
        ));
        assert!(Timestamp::parse("02-30-2030").is_err());
    }

    #[test]
    fn display_is_utc() {
        let ts = Timestamp::from_millis(1_893_542_400_000);
        assert_eq!(ts.to_string(), "2030-01-02 00:00:00 UTC");
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Timestamp::from_millis(1_000));
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now(), Timestamp::from_millis(3_000));
        clock.set(Timestamp::from_millis(5));
        assert_eq!(clock.now(), Timestamp::from_millis(5));
    }

    #[test]
    fn shared_clock_sees_updates() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(0)));
        let handle = Arc::clone(&clock);
        handle.advance(Duration::from_millis(10));
        assert_eq!(Clock::now(&clock), Timestamp::from_millis(10));
    }

    #[test]
    fn serde_is_plain_millis() {
        let json = serde_json::to_string(&Timestamp::from_millis(42)).unwrap();
        assert_eq!(json, "42");
    }

    proptest! {
        #[test]
        fn ordering_matches_millis(a in any::<i64>(), b in any::<i64>()) {
            let (ta, tb) = (Timestamp::from_millis(a), Timestamp::from_millis(b));
            prop_assert_eq!(ta.is_after(&tb), a > b);
            prop_assert_eq!(tb.is_after(&ta), a < b);
        }
    }
}
