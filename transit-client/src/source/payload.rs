//! Route data JSON schema and conversion to domain types.
//!
//! The same document shape is used by the remote endpoint, the disk cache and
//! the bundled data file.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    DepartureTime, Route, RouteId, ScheduleEntry, ServiceDays, sort_by_departure,
};
use crate::error::SourceError;

/// Which tier produced a payload, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Remote,
    DiskCache,
    Bundled,
    BuiltIn,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Tier::Remote => "remote",
            Tier::DiskCache => "disk cache",
            Tier::Bundled => "bundled",
            Tier::BuiltIn => "built-in",
        })
    }
}

/// Top-level document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PayloadDto {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    pub routes: Vec<RouteDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteDto {
    pub id: String,
    pub route_number: String,
    pub name: String,
    pub description: String,
    pub color: Option<String>,
    pub travel_time: String,
    pub price_primary: String,
    pub price_secondary: String,
    pub payment_methods: String,
    pub schedules: Vec<ScheduleDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleDto {
    pub id: String,
    pub stop_name: String,
    pub departure_time: String,
    pub departure_point: String,
    pub notes: Option<String>,
    pub day_of_week: Option<String>,
}

/// Parsed route data from one tier.
#[derive(Debug, Clone)]
pub struct SourcePayload {
    pub version: Option<String>,
    pub last_updated: Option<String>,
    /// Valid routes, in document order.
    pub routes: Vec<Route>,
    /// Departures per route, sorted by time.
    pub schedules: HashMap<RouteId, Vec<ScheduleEntry>>,
    pub origin: Tier,
}

impl SourcePayload {
    /// Parse a JSON document. Invalid routes and schedule entries are dropped.
    pub fn parse(body: &str, origin: Tier) -> Result<Self, SourceError> {
        let dto: PayloadDto = serde_json::from_str(body)?;
        Ok(Self::from_dto(dto, origin))
    }

    /// Convert a document, dropping routes that fail validation.
    pub fn from_dto(dto: PayloadDto, origin: Tier) -> Self {
        let mut routes = Vec::with_capacity(dto.routes.len());
        let mut schedules = HashMap::new();
        let mut seen = HashSet::new();

        for route_dto in dto.routes {
            let Some((route, entries)) = convert_route(route_dto, origin) else {
                continue;
            };
            if !seen.insert(route.id.clone()) {
                warn!(route_id = %route.id, tier = %origin, "Duplicate route id, keeping first");
                continue;
            }
            if !entries.is_empty() {
                schedules.insert(route.id.clone(), entries);
            }
            routes.push(route);
        }

        Self {
            version: dto.version.filter(|v| !v.trim().is_empty()),
            last_updated: dto.last_updated.filter(|v| !v.trim().is_empty()),
            routes,
            schedules,
            origin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Departures for one route, empty if the payload has none.
    pub fn schedules_for(&self, route_id: &RouteId) -> &[ScheduleEntry] {
        self.schedules
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Extract only the `version` field of a document.
pub fn peek_version(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct VersionOnly {
        #[serde(default)]
        version: Option<String>,
    }

    serde_json::from_str::<VersionOnly>(body)
        .ok()
        .and_then(|v| v.version)
        .filter(|v| !v.trim().is_empty())
}

fn convert_route(dto: RouteDto, origin: Tier) -> Option<(Route, Vec<ScheduleEntry>)> {
    let route = match Route::new(&dto.id, &dto.route_number, dto.name, dto.description) {
        Ok(route) => route
            .with_color(dto.color.as_deref().unwrap_or_default())
            .with_details(
                &dto.travel_time,
                &dto.price_primary,
                &dto.price_secondary,
                &dto.payment_methods,
            ),
        Err(e) => {
            warn!(route_id = %dto.id, tier = %origin, error = %e, "Dropping invalid route");
            return None;
        }
    };

    let mut entries: Vec<ScheduleEntry> = dto
        .schedules
        .into_iter()
        .enumerate()
        .filter_map(|(idx, s)| convert_schedule(&route.id, idx, s))
        .collect();
    sort_by_departure(&mut entries);

    Some((route, entries))
}

fn convert_schedule(route_id: &RouteId, idx: usize, dto: ScheduleDto) -> Option<ScheduleEntry> {
    let departure_time = match DepartureTime::parse_hhmm(&dto.departure_time) {
        Ok(t) => t,
        Err(e) => {
            warn!(
                route_id = %route_id,
                schedule_id = %dto.id,
                error = %e,
                "Dropping schedule entry"
            );
            return None;
        }
    };

    let days = match dto.day_of_week.as_deref() {
        None => ServiceDays::Daily,
        Some(tag) => ServiceDays::parse(tag).unwrap_or_else(|| {
            warn!(route_id = %route_id, tag, "Unknown day tag, treating as daily");
            ServiceDays::Daily
        }),
    };

    let id = if dto.id.trim().is_empty() {
        format!("{route_id}-{idx}")
    } else {
        dto.id
    };

    Some(ScheduleEntry {
        id,
        route_id: route_id.clone(),
        stop_name: dto.stop_name,
        departure_time,
        days,
        departure_point: dto.departure_point,
        notes: dto.notes.filter(|n| !n.trim().is_empty()),
    })
}
