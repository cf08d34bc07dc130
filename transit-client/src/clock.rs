//! Wall-clock access and day-of-week resolution.
//!
//! Everything that needs "now" goes through [`Clock`] so tests can pin time.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveTime, Weekday};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current time in the device's local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current epoch time in milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Current local day of the week.
    fn weekday(&self) -> Weekday {
        self.now().weekday()
    }
}

/// The system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that returns a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Parse an RFC 3339 timestamp, e.g. `2024-03-18T08:00:00+01:00`.
    pub fn at(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self::new)
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Next instant, strictly after `now`, at which a weekly reminder should fire.
///
/// The reminder targets `time` on `day` and fires `lead` earlier. The result
/// is expressed in `now`'s offset.
pub fn next_trigger(
    now: DateTime<FixedOffset>,
    day: Weekday,
    time: NaiveTime,
    lead: Duration,
) -> DateTime<FixedOffset> {
    let today = now.date_naive();
    let days_ahead = (7 + i64::from(day.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
        % 7;
    let target_date = today + Duration::days(days_ahead);
    let offset = *now.offset();

    let mut trigger = (target_date.and_time(time) - lead)
        .and_local_timezone(offset)
        .single()
        .unwrap_or(now);
    while trigger <= now {
        trigger += Duration::days(7);
    }
    trigger
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn fixed_clock_reports_weekday() {
        // 2024-03-18 is a Monday
        let clock = FixedClock::at("2024-03-18T08:00:00+01:00").unwrap();
        assert_eq!(clock.weekday(), Weekday::Mon);

        clock.advance(Duration::days(1));
        assert_eq!(clock.weekday(), Weekday::Tue);
    }

    #[test]
    fn weekday_uses_local_offset() {
        // 23:30 UTC on Monday is already Tuesday at UTC+2
        let clock = FixedClock::at("2024-03-19T01:30:00+02:00").unwrap();
        assert_eq!(clock.weekday(), Weekday::Tue);
        assert_eq!(clock.now_millis(), at("2024-03-18T23:30:00Z").timestamp_millis());
    }

    #[test]
    fn trigger_later_same_day() {
        let now = at("2024-03-18T08:00:00+01:00");
        let t = next_trigger(now, Weekday::Mon, hm(9, 30), Duration::minutes(10));
        assert_eq!(t, at("2024-03-18T09:20:00+01:00"));
    }

    #[test]
    fn trigger_already_passed_rolls_a_week() {
        let now = at("2024-03-18T09:25:00+01:00");
        let t = next_trigger(now, Weekday::Mon, hm(9, 30), Duration::minutes(10));
        assert_eq!(t, at("2024-03-25T09:20:00+01:00"));
    }

    #[test]
    fn trigger_exactly_now_rolls_a_week() {
        let now = at("2024-03-18T09:20:00+01:00");
        let t = next_trigger(now, Weekday::Mon, hm(9, 30), Duration::minutes(10));
        assert_eq!(t, at("2024-03-25T09:20:00+01:00"));
    }

    #[test]
    fn trigger_on_later_weekday() {
        // Monday → Friday
        let now = at("2024-03-18T12:00:00+00:00");
        let t = next_trigger(now, Weekday::Fri, hm(7, 0), Duration::zero());
        assert_eq!(t, at("2024-03-22T07:00:00+00:00"));
    }

    #[test]
    fn trigger_on_earlier_weekday_wraps() {
        // Friday → following Monday
        let now = at("2024-03-22T12:00:00+00:00");
        let t = next_trigger(now, Weekday::Mon, hm(7, 0), Duration::zero());
        assert_eq!(t, at("2024-03-25T07:00:00+00:00"));
    }

    #[test]
    fn lead_can_cross_midnight() {
        // 00:05 Tuesday with a 10 minute lead fires 23:55 Monday
        let now = at("2024-03-18T12:00:00+00:00");
        let t = next_trigger(now, Weekday::Tue, hm(0, 5), Duration::minutes(10));
        assert_eq!(t, at("2024-03-18T23:55:00+00:00"));
    }
}
