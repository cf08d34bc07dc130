//! Hand-authored route list used when every other tier fails.

use super::payload::{PayloadDto, RouteDto, ScheduleDto, SourcePayload, Tier};

/// Version tag reported for the built-in data.
pub const BUILT_IN_VERSION: &str = "built-in";

fn route(
    id: &str,
    number: &str,
    name: &str,
    description: &str,
    color: &str,
    departures: &[(&str, &str, &str)], // (stop, time, departure point)
) -> RouteDto {
    RouteDto {
        id: id.to_string(),
        route_number: number.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        color: Some(color.to_string()),
        schedules: departures
            .iter()
            .enumerate()
            .map(|(idx, (stop, time, point))| ScheduleDto {
                id: format!("{id}-builtin-{idx}"),
                stop_name: (*stop).to_string(),
                departure_time: (*time).to_string(),
                departure_point: (*point).to_string(),
                ..ScheduleDto::default()
            })
            .collect(),
        ..RouteDto::default()
    }
}

/// The built-in document. Never empty after validation.
pub fn built_in_payload() -> SourcePayload {
    let dto = PayloadDto {
        version: Some(BUILT_IN_VERSION.to_string()),
        last_updated: None,
        routes: vec![
            route(
                "r1",
                "1",
                "Centro - Terminal Norte",
                "Downtown to the north bus terminal",
                "#E53935",
                &[
                    ("Plaza Mayor", "06:00", "Centro"),
                    ("Plaza Mayor", "07:00", "Centro"),
                    ("Terminal Norte", "18:00", "Terminal Norte"),
                ],
            ),
            route(
                "r2",
                "2",
                "Centro - Hospital",
                "Downtown to the regional hospital",
                "#43A047",
                &[("Mercado", "06:15", "Centro"), ("Mercado", "08:15", "Centro")],
            ),
            route(
                "r10",
                "10",
                "Universidad",
                "Express service to the university campus",
                "#8E24AA",
                &[("Campus", "07:00", "Centro")],
            ),
        ],
    };

    SourcePayload::from_dto(dto, Tier::BuiltIn)
}
