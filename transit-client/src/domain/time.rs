//! Departure time handling.
//!
//! Schedules and favorites carry departure times as "HH:mm" strings. This
//! module parses them into a validated wall-clock time.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A departure time of day, minute precision.
///
/// # Examples
///
/// ```
/// use transit_client::domain::DepartureTime;
///
/// let time = DepartureTime::parse_hhmm("07:45").unwrap();
/// assert_eq!(time.to_string(), "07:45");
///
/// assert!(DepartureTime::parse_hhmm("745").is_err());
/// assert!(DepartureTime::parse_hhmm("24:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepartureTime(NaiveTime);

impl DepartureTime {
    /// Parse a time from "HH:mm" format.
    ///
    /// Leading and trailing whitespace is ignored; everything else must be
    /// exactly two hour digits, a colon and two minute digits.
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:mm format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| TimeError::new("invalid time"))
    }

    /// Returns the underlying time of day.
    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(u32::from(a - b'0') * 10 + u32::from(b - b'0'))
        }
        _ => None,
    }
}

impl fmt::Debug for DepartureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepartureTime({self})")
    }
}

impl fmt::Display for DepartureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for DepartureTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DepartureTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hhmm(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(DepartureTime::parse_hhmm("00:00").unwrap().to_string(), "00:00");
        assert_eq!(DepartureTime::parse_hhmm("23:59").unwrap().hour(), 23);
        let t = DepartureTime::parse_hhmm("14:30").unwrap();
        assert_eq!(t.hour(), 14);
        assert_eq!(t.minute(), 30);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(DepartureTime::parse_hhmm(" 06:05 ").is_ok());
    }

    #[test]
    fn reject_bad_formats() {
        assert!(DepartureTime::parse_hhmm("").is_err());
        assert!(DepartureTime::parse_hhmm("1430").is_err());
        assert!(DepartureTime::parse_hhmm("14:3").is_err());
        assert!(DepartureTime::parse_hhmm("14-30").is_err());
        assert!(DepartureTime::parse_hhmm("ab:cd").is_err());
        assert!(DepartureTime::parse_hhmm("+1:30").is_err());
    }

    #[test]
    fn reject_out_of_range() {
        assert_eq!(
            DepartureTime::parse_hhmm("24:00").unwrap_err().to_string(),
            "invalid time: hour must be 0-23"
        );
        assert_eq!(
            DepartureTime::parse_hhmm("12:60").unwrap_err().to_string(),
            "invalid time: minute must be 0-59"
        );
    }

    #[test]
    fn display_zero_pads() {
        let t = DepartureTime::parse_hhmm("06:05").unwrap();
        assert_eq!(t.to_string(), "06:05");
        assert_eq!(format!("{:?}", t), "DepartureTime(06:05)");
    }

    #[test]
    fn ordering_follows_clock() {
        let early = DepartureTime::parse_hhmm("06:00").unwrap();
        let late = DepartureTime::parse_hhmm("18:00").unwrap();
        assert!(early < late);
    }

    #[test]
    fn serde_uses_hhmm_string() {
        let t = DepartureTime::parse_hhmm("09:15").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"09:15\"");
        let back: DepartureTime = serde_json::from_str("\"09:15\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<DepartureTime>("\"9:15\"").is_err());
    }
}
