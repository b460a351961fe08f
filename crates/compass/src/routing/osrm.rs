use serde::Deserialize;
use std::time::Duration;

use super::{Route, RouteStep, RoutingError, RoutingService};
use crate::coord::Coordinate;

pub const DEFAULT_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_PROFILE: &str = "driving";
const USER_AGENT: &str = concat!("compass/", env!("CARGO_PKG_VERSION"));

/// Client for an OSRM-compatible `route/v1` endpoint.
pub struct OsrmClient {
    agent: ureq::Agent,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(base_url: &str, profile: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
        }
    }

    pub fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url,
            self.profile,
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat
        )
    }
}

impl RoutingService for OsrmClient {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, RoutingError> {
        let url = self.route_url(origin, destination);
        tracing::debug!(%url, "requesting route");

        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| RoutingError::Transport(e.to_string()))?;
        let status = response.status();
        let body: OsrmResponse = response.body_mut().read_json().map_err(|e| {
            if status.is_success() {
                RoutingError::Malformed(e.to_string())
            } else {
                RoutingError::Transport(format!("HTTP {status}"))
            }
        })?;
        parse_response(body)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    #[serde(default)]
    bearing_after: Option<f64>,
    #[serde(default)]
    exit: Option<u32>,
}

pub(crate) fn parse_response(body: OsrmResponse) -> Result<Route, RoutingError> {
    if body.code != "Ok" {
        if body.code == "NoRoute" {
            return Err(RoutingError::NoRoute);
        }
        return Err(RoutingError::Service {
            message: body.message.unwrap_or_default(),
            code: body.code,
        });
    }

    let route = body.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
    let path: Vec<Coordinate> = route
        .geometry
        .coordinates
        .iter()
        .map(|[lng, lat]| Coordinate::new(*lat, *lng))
        .collect();
    if path.len() < 2 {
        return Err(RoutingError::NoRoute);
    }

    let steps = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| RouteStep {
            instruction: instruction_text(step),
            distance_m: step.distance,
        })
        .collect();

    Ok(Route {
        path,
        steps,
        distance_m: route.distance,
        duration_s: route.duration,
    })
}

fn cardinal(bearing: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let idx = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    NAMES[idx]
}

fn turn_phrase(modifier: &str) -> String {
    match modifier {
        "uturn" => "Make a U-turn".to_string(),
        "straight" => "Continue straight".to_string(),
        "slight left" | "slight right" => format!("Make a {modifier}"),
        "sharp left" | "sharp right" => format!("Make a {modifier}"),
        other => format!("Turn {other}"),
    }
}

fn onto(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!(" onto {name}")
    }
}

fn instruction_text(step: &OsrmStep) -> String {
    let m = &step.maneuver;
    let modifier = m.modifier.as_deref().unwrap_or("straight");
    let name = step.name.as_str();
    match m.kind.as_str() {
        "depart" => {
            let heading = m.bearing_after.map(cardinal).unwrap_or("out");
            if name.is_empty() {
                format!("Head {heading}")
            } else {
                format!("Head {heading} on {name}")
            }
        }
        "arrive" => "You have arrived at your destination".to_string(),
        "continue" | "new name" => format!("Continue{}", onto(name)),
        "merge" => format!("Merge{}", onto(name)),
        "on ramp" => format!("Take the ramp{}", onto(name)),
        "off ramp" => format!("Take the exit{}", onto(name)),
        "fork" => {
            let side = if modifier.contains("left") { "left" } else { "right" };
            format!("Keep {side} at the fork{}", onto(name))
        }
        "roundabout" | "rotary" => match m.exit {
            Some(exit) => format!("Enter the roundabout and take exit {exit}{}", onto(name)),
            None => format!("Enter the roundabout{}", onto(name)),
        },
        _ => format!("{}{}", turn_phrase(modifier), onto(name)),
    }
}
