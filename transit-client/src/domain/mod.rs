//! Domain types for the transit client.
//!
//! All types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

pub mod day;
mod favorite;
mod route;
mod schedule;
mod time;

pub use day::{DaySet, InvalidStorageDay, ServiceDays, weekday_from_storage, weekday_to_storage};
pub use favorite::FavoriteReminder;
pub use route::{DEFAULT_ROUTE_COLOR, InvalidRoute, Route, RouteId};
pub use schedule::{ScheduleEntry, sort_by_departure};
pub use time::{DepartureTime, TimeError};
