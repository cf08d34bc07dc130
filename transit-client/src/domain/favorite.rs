//! Saved departure reminders.

use chrono::Weekday;

use super::route::RouteId;
use super::time::DepartureTime;

/// A validated favorite departure the user wants to be reminded about.
///
/// Route number and name are copied from the catalog when the favorite is
/// saved, so a reminder can still be labelled after its route disappears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteReminder {
    pub id: i64,
    pub route_id: RouteId,
    pub route_number: String,
    pub route_name: String,
    pub stop_name: String,
    pub departure_time: DepartureTime,
    pub day: Weekday,
    pub departure_point: String,
    /// Creation time, epoch milliseconds.
    pub added_at: i64,
    pub active: bool,
}

impl FavoriteReminder {
    /// Label built from the denormalized route fields.
    ///
    /// Returns `None` when neither number nor name was saved.
    pub fn saved_route_label(&self) -> Option<String> {
        let number = self.route_number.trim();
        let name = self.route_name.trim();
        match (number.is_empty(), name.is_empty()) {
            (true, true) => None,
            (false, true) => Some(number.to_string()),
            (true, false) => Some(name.to_string()),
            (false, false) => Some(format!("{number} - {name}")),
        }
    }
}
