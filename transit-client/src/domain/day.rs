//! Day-of-week types and the storage numbering boundary.
//!
//! Persisted favorites number days 1 = Sunday through 7 = Saturday. Everything
//! else in the crate uses [`chrono::Weekday`]. [`weekday_from_storage`] and
//! [`weekday_to_storage`] are the only places the two conventions meet.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

/// Error returned when a stored day number is outside 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid stored day of week {0}: expected 1 (Sunday) to 7 (Saturday)")]
pub struct InvalidStorageDay(pub i64);

/// Convert a stored day number (1 = Sunday … 7 = Saturday) to a weekday.
pub fn weekday_from_storage(day: i64) -> Result<Weekday, InvalidStorageDay> {
    match day {
        1 => Ok(Weekday::Sun),
        2 => Ok(Weekday::Mon),
        3 => Ok(Weekday::Tue),
        4 => Ok(Weekday::Wed),
        5 => Ok(Weekday::Thu),
        6 => Ok(Weekday::Fri),
        7 => Ok(Weekday::Sat),
        other => Err(InvalidStorageDay(other)),
    }
}

/// Convert a weekday to its stored day number (1 = Sunday … 7 = Saturday).
pub fn weekday_to_storage(day: Weekday) -> i64 {
    i64::from(day.num_days_from_sunday()) + 1
}

/// Returns true for Monday through Friday.
pub fn is_weekday(day: Weekday) -> bool {
    !matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Persisted name of a weekday (`MONDAY` … `SUNDAY`).
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Parse a persisted weekday name, case-insensitively.
///
/// Accepts full names and chrono's short forms ("mon", "Tue").
pub fn parse_weekday_name(s: &str) -> Option<Weekday> {
    let s = s.trim();
    ALL_WEEKDAYS
        .into_iter()
        .find(|d| weekday_name(*d).eq_ignore_ascii_case(s))
        .or_else(|| Weekday::from_str(s).ok())
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DaySet(u8);

impl DaySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    /// Add a day to the set.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    /// Returns a copy of the set with `day` added.
    pub fn with(mut self, day: Weekday) -> Self {
        self.insert(day);
        self
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate over the days in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.into_iter().filter(|d| self.contains(*d))
    }

    /// Parse persisted weekday names; unknown names are skipped.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names
            .into_iter()
            .filter_map(parse_weekday_name)
            .collect()
    }

    /// Persisted names of the days in the set.
    pub fn to_names(&self) -> Vec<String> {
        self.iter().map(|d| weekday_name(d).to_string()).collect()
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Which days a scheduled departure runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceDays {
    #[default]
    Daily,
    Weekdays,
    Weekends,
    Saturday,
    Sunday,
}

impl ServiceDays {
    /// Parse the optional `dayOfWeek` tag of a schedule entry.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "daily" | "all" => Some(Self::Daily),
            "weekdays" | "weekday" => Some(Self::Weekdays),
            "weekends" | "weekend" => Some(Self::Weekends),
            "saturday" | "sat" => Some(Self::Saturday),
            "sunday" | "sun" => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Returns true if a departure with this tag runs on `day`.
    pub fn runs_on(&self, day: Weekday) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekdays => is_weekday(day),
            Self::Weekends => !is_weekday(day),
            Self::Saturday => day == Weekday::Sat,
            Self::Sunday => day == Weekday::Sun,
        }
    }
}
