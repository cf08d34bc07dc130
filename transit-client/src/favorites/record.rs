//! Persisted favorite records and their validation.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DepartureTime, FavoriteReminder, RouteId, weekday_from_storage, weekday_to_storage,
};
use crate::error::ValidationError;

/// A favorite as it is stored, before validation.
///
/// `day_of_week` uses the storage numbering (1 = Sunday ... 7 = Saturday).
/// Missing fields deserialize to blanks and are rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub route_id: String,
    #[serde(default)]
    pub route_number: String,
    #[serde(default)]
    pub route_name: String,
    #[serde(default)]
    pub stop_name: String,
    #[serde(default)]
    pub departure_time: String,
    #[serde(default)]
    pub day_of_week: i64,
    #[serde(default)]
    pub departure_point: String,
    #[serde(default)]
    pub added_at: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl FavoriteRecord {
    /// A record carrying only the id and active flag of an entry that could
    /// not be read. It never passes validation.
    pub(crate) fn unreadable(id: i64, active: bool) -> Self {
        FavoriteRecord {
            id,
            route_id: String::new(),
            route_number: String::new(),
            route_name: String::new(),
            stop_name: String::new(),
            departure_time: String::new(),
            day_of_week: 0,
            departure_point: String::new(),
            added_at: 0,
            active,
        }
    }
}

impl TryFrom<&FavoriteRecord> for FavoriteReminder {
    type Error = ValidationError;

    fn try_from(record: &FavoriteRecord) -> Result<Self, Self::Error> {
        Ok(FavoriteReminder {
            id: record.id,
            route_id: RouteId::parse(&record.route_id)?,
            route_number: record.route_number.clone(),
            route_name: record.route_name.clone(),
            stop_name: record.stop_name.clone(),
            departure_time: DepartureTime::parse_hhmm(&record.departure_time)?,
            day: weekday_from_storage(record.day_of_week)?,
            departure_point: record.departure_point.clone(),
            added_at: record.added_at,
            active: record.active,
        })
    }
}

impl From<&FavoriteReminder> for FavoriteRecord {
    fn from(favorite: &FavoriteReminder) -> Self {
        FavoriteRecord {
            id: favorite.id,
            route_id: favorite.route_id.as_str().to_string(),
            route_number: favorite.route_number.clone(),
            route_name: favorite.route_name.clone(),
            stop_name: favorite.stop_name.clone(),
            departure_time: favorite.departure_time.to_string(),
            day_of_week: weekday_to_storage(favorite.day),
            departure_point: favorite.departure_point.clone(),
            added_at: favorite.added_at,
            active: favorite.active,
        }
    }
}
