//! Scheduled departures.

use serde::Serialize;

use super::day::ServiceDays;
use super::route::RouteId;
use super::time::DepartureTime;

/// One scheduled departure of a route from a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub route_id: RouteId,
    pub stop_name: String,
    pub departure_time: DepartureTime,
    #[serde(skip)]
    pub days: ServiceDays,
    pub departure_point: String,
    pub notes: Option<String>,
}

/// Sort entries by departure time, keeping source order for ties.
pub fn sort_by_departure(entries: &mut [ScheduleEntry]) {
    entries.sort_by_key(|e| e.departure_time);
}
