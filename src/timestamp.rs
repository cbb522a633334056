// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! A `Timestamp` primitive for UTC datetimes.
//!
//! The `Timestamp` is represented as a 64-bit integer of milliseconds since the
//! UNIX epoch, but is constrained to a range of years from 0 to 9999 so that its
//! RFC 3339 text form always round-trips.
use chrono::{DateTime, Datelike, SecondsFormat, TimeDelta, Utc};
use std::{fmt, str::FromStr};

/// Error returned when creating or parsing a `Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The year is outside the supported range of `0` to `9999`.
    InvalidYear(i32),
    /// The string could not be parsed as a valid RFC 3339 datetime.
    Parse(String),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::InvalidYear(year) => write!(
                f,
                "invalid year {year}, supported years are between 0 and 9999 included"
            ),
            TimestampError::Parse(s) => {
                write!(f, "failed to parse date {s} in rfc3339 format")
            }
        }
    }
}

impl std::error::Error for TimestampError {}

/// A UTC datetime with millisecond precision.
///
/// The valid range for a `Timestamp` is from `0000-01-01T00:00:00.000Z` to
/// `9999-12-31T23:59:59.999Z`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The minimum supported `Timestamp`: `0000-01-01T00:00:00.000Z`.
    pub const MIN: Timestamp = Timestamp(-62_167_219_200_000);
    /// The maximum supported `Timestamp`: `9999-12-31T23:59:59.999Z`.
    pub const MAX: Timestamp = Timestamp(253_402_300_799_999);

    /// Creates a new `Timestamp` from a `chrono::DateTime<Utc>`.
    ///
    /// The datetime is truncated to millisecond precision.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside the supported range of `0` to `9999`.
    pub fn new(datetime: DateTime<Utc>) -> Result<Timestamp, TimestampError> {
        let year = datetime.year();
        if !(0..=9999).contains(&year) {
            return Err(TimestampError::InvalidYear(year));
        }
        Ok(Timestamp(datetime.timestamp_millis()))
    }

    /// The current wall-clock time.
    pub fn now() -> Timestamp {
        Timestamp::new(Utc::now()).expect("the current year is between 0 and 9999")
    }

    /// Creates a `Timestamp` from a number of milliseconds since the UNIX epoch.
    ///
    /// Returns `None` if the number of milliseconds corresponds to a datetime outside
    /// the supported range.
    pub fn from_millis(milliseconds: i64) -> Option<Self> {
        (Self::MIN.as_millis()..=Self::MAX.as_millis())
            .contains(&milliseconds)
            .then_some(Self(milliseconds))
    }

    /// Returns the number of milliseconds since the UNIX epoch as an `i64`.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Offsets the timestamp, or returns `None` if the result leaves the supported range.
    pub fn checked_add(self, delta: TimeDelta) -> Option<Timestamp> {
        self.0
            .checked_add(delta.num_milliseconds())
            .and_then(Timestamp::from_millis)
    }

    /// Converts the `Timestamp` to a `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0)
            .expect("roundtrips with `DateTime::timestamp_millis`")
    }
}

impl fmt::Display for Timestamp {
    // Formats the `Timestamp` as an RFC 3339 string with millisecond precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_datetime().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let datetime =
            DateTime::parse_from_rfc3339(s).map_err(|_| TimestampError::Parse(s.to_string()))?;
        Timestamp::new(datetime.to_utc())
    }
}

impl From<Timestamp> for serde_json::Value {
    fn from(value: Timestamp) -> Self {
        serde_json::Value::String(value.to_string())
    }
}
