//! Notification policy: the parsed form of the persisted notification
//! settings, and the pure eligibility rule evaluated against it.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset};
use tracing::warn;

use crate::domain::{DaySet, RouteId, day};

use super::store::PreferenceValue;

pub const KEY_QUIET_MODE: &str = "notification_quiet_mode";
pub const KEY_QUIET_UNTIL: &str = "notification_quiet_until";
pub const KEY_MODE: &str = "notification_mode";
pub const KEY_SELECTED_DAYS: &str = "notification_selected_days";
pub const KEY_VIBRATION: &str = "notification_vibration";

const OVERRIDE_PREFIX: &str = "route_notification.";
const OVERRIDE_MODE_SUFFIX: &str = ".mode";
const OVERRIDE_DAYS_SUFFIX: &str = ".days";

/// Settings key holding the override mode for `route_id`.
pub fn override_mode_key(route_id: &RouteId) -> String {
    format!("{OVERRIDE_PREFIX}{route_id}{OVERRIDE_MODE_SUFFIX}")
}

/// Settings key holding the override day set for `route_id`.
pub fn override_days_key(route_id: &RouteId) -> String {
    format!("{OVERRIDE_PREFIX}{route_id}{OVERRIDE_DAYS_SUFFIX}")
}

/// Global quiet switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuietMode {
    /// All notifications muted
    Disabled,
    #[default]
    Enabled,
    /// Muted until the given epoch time in milliseconds
    SuppressedUntil(i64),
}

impl QuietMode {
    pub fn storage_name(&self) -> &'static str {
        match self {
            QuietMode::Disabled => "DISABLED",
            QuietMode::Enabled => "ENABLED",
            QuietMode::SuppressedUntil(_) => "SUPPRESSED_UNTIL",
        }
    }
}

/// Which days notifications are delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationMode {
    Disabled,
    #[default]
    AllDays,
    /// Monday through Friday
    Weekdays,
    SelectedDays(DaySet),
}

impl NotificationMode {
    pub fn storage_name(&self) -> &'static str {
        match self {
            NotificationMode::Disabled => "DISABLED",
            NotificationMode::AllDays => "ALL_DAYS",
            NotificationMode::Weekdays => "WEEKDAYS",
            NotificationMode::SelectedDays(_) => "SELECTED_DAYS",
        }
    }

    /// Whether this mode delivers on `day`.
    pub fn allows(&self, day: chrono::Weekday) -> bool {
        match self {
            NotificationMode::Disabled => false,
            NotificationMode::AllDays => true,
            NotificationMode::Weekdays => day::is_weekday(day),
            NotificationMode::SelectedDays(days) => days.contains(day),
        }
    }

    /// Parse a stored mode name. `days` is consulted for `SELECTED_DAYS`.
    fn parse(name: &str, days: Option<&PreferenceValue>) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DISABLED" => Some(NotificationMode::Disabled),
            "ALL_DAYS" => Some(NotificationMode::AllDays),
            "WEEKDAYS" => Some(NotificationMode::Weekdays),
            "SELECTED_DAYS" => Some(NotificationMode::SelectedDays(parse_days(days))),
            _ => None,
        }
    }
}

/// Raised while evaluating a policy. Callers decide how to degrade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("quiet-until timestamp {0} is out of range")]
    InvalidQuietUntil(i64),
}

/// Immutable snapshot of every notification preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub quiet: QuietMode,
    pub mode: NotificationMode,
    /// Per-route overrides; an override replaces the global mode entirely.
    pub overrides: HashMap<RouteId, NotificationMode>,
    pub vibration: bool,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            quiet: QuietMode::Enabled,
            mode: NotificationMode::AllDays,
            overrides: HashMap::new(),
            vibration: true,
        }
    }
}

impl NotificationPolicy {
    /// Build a policy from raw settings. Missing or unreadable values fall
    /// back to their defaults and never fail the whole parse.
    pub fn from_settings(settings: &HashMap<String, PreferenceValue>) -> Self {
        let quiet = parse_quiet(settings);
        let mode = match settings.get(KEY_MODE) {
            None => NotificationMode::AllDays,
            Some(value) => value
                .as_text()
                .and_then(|name| NotificationMode::parse(name, settings.get(KEY_SELECTED_DAYS)))
                .unwrap_or_else(|| {
                    warn!(value = ?value, "Unrecognised notification mode, using ALL_DAYS");
                    NotificationMode::AllDays
                }),
        };
        let vibration = match settings.get(KEY_VIBRATION) {
            None => true,
            Some(value) => value.as_bool().unwrap_or_else(|| {
                warn!(value = ?value, "Unrecognised vibration flag, using true");
                true
            }),
        };

        Self {
            quiet,
            mode,
            overrides: parse_overrides(settings),
            vibration,
        }
    }

    /// The mode that applies to `route_id`: its override if any, else global.
    pub fn effective_mode(&self, route_id: Option<&str>) -> NotificationMode {
        route_id
            .and_then(|id| RouteId::parse(id).ok())
            .and_then(|id| self.overrides.get(&id).copied())
            .unwrap_or(self.mode)
    }

    /// Whether a notification for `route_id` may be shown at `now`.
    pub fn evaluate(
        &self,
        route_id: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EligibilityError> {
        match self.quiet {
            QuietMode::Disabled => return Ok(false),
            QuietMode::Enabled => {}
            QuietMode::SuppressedUntil(until) => {
                if DateTime::from_timestamp_millis(until).is_none() {
                    return Err(EligibilityError::InvalidQuietUntil(until));
                }
                if now.timestamp_millis() < until {
                    return Ok(false);
                }
            }
        }

        Ok(self.effective_mode(route_id).allows(now.weekday()))
    }
}

fn parse_quiet(settings: &HashMap<String, PreferenceValue>) -> QuietMode {
    let Some(value) = settings.get(KEY_QUIET_MODE) else {
        return QuietMode::Enabled;
    };
    let name = value.as_text().map(|s| s.trim().to_ascii_uppercase());

    match name.as_deref() {
        Some("DISABLED") => QuietMode::Disabled,
        Some("ENABLED") => QuietMode::Enabled,
        Some("SUPPRESSED_UNTIL") => match settings.get(KEY_QUIET_UNTIL).and_then(|v| v.as_int()) {
            Some(until) => QuietMode::SuppressedUntil(until),
            None => {
                warn!("Quiet mode SUPPRESSED_UNTIL without a timestamp, using ENABLED");
                QuietMode::Enabled
            }
        },
        _ => {
            warn!(value = ?value, "Unrecognised quiet mode, using ENABLED");
            QuietMode::Enabled
        }
    }
}

fn parse_days(value: Option<&PreferenceValue>) -> DaySet {
    let Some(names) = value.and_then(|v| v.as_text_set()) else {
        return DaySet::empty();
    };
    let set = DaySet::from_names(names.iter().copied());
    if set.len() < names.iter().filter(|n| !n.is_empty()).count() {
        warn!(value = ?value, "Ignoring unrecognised weekday names");
    }
    set
}

fn parse_overrides(
    settings: &HashMap<String, PreferenceValue>,
) -> HashMap<RouteId, NotificationMode> {
    let mut overrides = HashMap::new();

    for (key, value) in settings {
        let Some(raw_id) = key
            .strip_prefix(OVERRIDE_PREFIX)
            .and_then(|rest| rest.strip_suffix(OVERRIDE_MODE_SUFFIX))
        else {
            continue;
        };
        let Ok(route_id) = RouteId::parse(raw_id) else {
            warn!(key = %key, "Ignoring route override with blank route id");
            continue;
        };

        let days = settings.get(&override_days_key(&route_id));
        match value.as_text().and_then(|name| NotificationMode::parse(name, days)) {
            Some(mode) => {
                overrides.insert(route_id, mode);
            }
            None => {
                warn!(route_id = %route_id, value = ?value, "Ignoring unrecognised route override");
            }
        }
    }

    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn settings(pairs: &[(&str, PreferenceValue)]) -> HashMap<String, PreferenceValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn text(s: &str) -> PreferenceValue {
        PreferenceValue::Text(s.to_string())
    }

    fn days(names: &[&str]) -> PreferenceValue {
        PreferenceValue::TextSet(names.iter().map(|s| s.to_string()).collect())
    }

    // 2024-03-18 is a Monday.
    fn monday() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-18T09:00:00+00:00").unwrap()
    }

    fn tuesday() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-19T09:00:00+00:00").unwrap()
    }

    fn saturday() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-23T09:00:00+00:00").unwrap()
    }

    #[test]
    fn empty_settings_give_defaults() {
        let policy = NotificationPolicy::from_settings(&HashMap::new());
        assert_eq!(policy, NotificationPolicy::default());
        assert!(policy.vibration);
    }

    #[test]
    fn parses_every_global_key() {
        let policy = NotificationPolicy::from_settings(&settings(&[
            (KEY_QUIET_MODE, text("SUPPRESSED_UNTIL")),
            (KEY_QUIET_UNTIL, PreferenceValue::Int(1_710_756_000_000)),
            (KEY_MODE, text("SELECTED_DAYS")),
            (KEY_SELECTED_DAYS, days(&["MONDAY", "FRIDAY"])),
            (KEY_VIBRATION, PreferenceValue::Bool(false)),
        ]));

        assert_eq!(policy.quiet, QuietMode::SuppressedUntil(1_710_756_000_000));
        assert_eq!(
            policy.mode,
            NotificationMode::SelectedDays(DaySet::empty().with(Weekday::Mon).with(Weekday::Fri))
        );
        assert!(!policy.vibration);
    }

    #[test]
    fn corrupt_enums_fall_back() {
        let policy = NotificationPolicy::from_settings(&settings(&[
            (KEY_QUIET_MODE, text("SOMETIMES")),
            (KEY_MODE, PreferenceValue::Int(3)),
            (KEY_VIBRATION, text("yes")),
        ]));

        assert_eq!(policy.quiet, QuietMode::Enabled);
        assert_eq!(policy.mode, NotificationMode::AllDays);
        assert!(policy.vibration);
    }

    #[test]
    fn suppressed_without_timestamp_is_enabled() {
        let policy =
            NotificationPolicy::from_settings(&settings(&[(KEY_QUIET_MODE, text("SUPPRESSED_UNTIL"))]));
        assert_eq!(policy.quiet, QuietMode::Enabled);
    }

    #[test]
    fn enum_names_are_case_insensitive() {
        let policy = NotificationPolicy::from_settings(&settings(&[
            (KEY_QUIET_MODE, text("disabled")),
            (KEY_MODE, text(" weekdays ")),
        ]));
        assert_eq!(policy.quiet, QuietMode::Disabled);
        assert_eq!(policy.mode, NotificationMode::Weekdays);
    }

    #[test]
    fn parses_route_overrides() {
        let x = RouteId::parse("X").unwrap();
        let policy = NotificationPolicy::from_settings(&settings(&[
            (override_mode_key(&x).as_str(), text("SELECTED_DAYS")),
            (override_days_key(&x).as_str(), days(&["SATURDAY"])),
            ("route_notification.Y.mode", text("DISABLED")),
            ("route_notification.Z.mode", text("BOGUS")),
            ("route_notification. .mode", text("DISABLED")),
        ]));

        assert_eq!(policy.overrides.len(), 2);
        assert_eq!(
            policy.overrides[&x],
            NotificationMode::SelectedDays(DaySet::empty().with(Weekday::Sat))
        );
        assert_eq!(
            policy.overrides[&RouteId::parse("Y").unwrap()],
            NotificationMode::Disabled
        );
    }

    #[test]
    fn quiet_disabled_blocks_everything() {
        let policy = NotificationPolicy {
            quiet: QuietMode::Disabled,
            ..Default::default()
        };
        assert_eq!(policy.evaluate(None, monday()), Ok(false));
        assert_eq!(policy.evaluate(Some("r1"), monday()), Ok(false));
    }

    #[test]
    fn suppressed_until_blocks_only_before_deadline() {
        let deadline = monday().timestamp_millis() + 60_000;
        let policy = NotificationPolicy {
            quiet: QuietMode::SuppressedUntil(deadline),
            ..Default::default()
        };

        assert_eq!(policy.evaluate(None, monday()), Ok(false));
        let later = monday() + chrono::Duration::minutes(1);
        assert_eq!(policy.evaluate(None, later), Ok(true));
    }

    #[test]
    fn out_of_range_deadline_is_an_error() {
        let policy = NotificationPolicy {
            quiet: QuietMode::SuppressedUntil(i64::MAX),
            ..Default::default()
        };
        assert_eq!(
            policy.evaluate(None, monday()),
            Err(EligibilityError::InvalidQuietUntil(i64::MAX))
        );
    }

    #[test]
    fn global_modes() {
        let with_mode = |mode| NotificationPolicy {
            mode,
            ..Default::default()
        };

        assert_eq!(with_mode(NotificationMode::Disabled).evaluate(None, monday()), Ok(false));
        assert_eq!(with_mode(NotificationMode::AllDays).evaluate(None, saturday()), Ok(true));
        assert_eq!(with_mode(NotificationMode::Weekdays).evaluate(None, monday()), Ok(true));
        assert_eq!(with_mode(NotificationMode::Weekdays).evaluate(None, saturday()), Ok(false));

        let mondays = with_mode(NotificationMode::SelectedDays(DaySet::empty().with(Weekday::Mon)));
        assert_eq!(mondays.evaluate(None, monday()), Ok(true));
        assert_eq!(mondays.evaluate(None, tuesday()), Ok(false));

        let none = with_mode(NotificationMode::SelectedDays(DaySet::empty()));
        assert_eq!(none.evaluate(None, monday()), Ok(false));
    }

    #[test]
    fn override_replaces_global_mode_for_that_route_only() {
        let policy = NotificationPolicy {
            mode: NotificationMode::AllDays,
            overrides: HashMap::from([(RouteId::parse("X").unwrap(), NotificationMode::Disabled)]),
            ..Default::default()
        };

        assert_eq!(policy.evaluate(Some("X"), monday()), Ok(false));
        assert_eq!(policy.evaluate(Some(" X "), monday()), Ok(false));
        assert_eq!(policy.evaluate(Some("Y"), monday()), Ok(true));
        assert_eq!(policy.evaluate(None, monday()), Ok(true));
        assert_eq!(policy.evaluate(Some(""), monday()), Ok(true));
    }

    #[test]
    fn override_can_enable_a_globally_disabled_route() {
        let policy = NotificationPolicy {
            mode: NotificationMode::Disabled,
            overrides: HashMap::from([(RouteId::parse("X").unwrap(), NotificationMode::AllDays)]),
            ..Default::default()
        };

        assert_eq!(policy.evaluate(Some("X"), saturday()), Ok(true));
        assert_eq!(policy.evaluate(Some("Y"), saturday()), Ok(false));
    }

    #[test]
    fn quiet_mode_wins_over_overrides() {
        let policy = NotificationPolicy {
            quiet: QuietMode::Disabled,
            overrides: HashMap::from([(RouteId::parse("X").unwrap(), NotificationMode::AllDays)]),
            ..Default::default()
        };
        assert_eq!(policy.evaluate(Some("X"), monday()), Ok(false));
    }
}
