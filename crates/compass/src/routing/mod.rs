pub mod osrm;

use thiserror::Error;

use crate::coord::{Bounds, Coordinate};

pub use osrm::OsrmClient;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Routing request failed: {0}")]
    Transport(String),
    #[error("Routing service answered {code}: {message}")]
    Service { code: String, message: String },
    #[error("No route found between the two points")]
    NoRoute,
    #[error("Unexpected routing response: {0}")]
    Malformed(String),
}

/// One turn-by-turn instruction of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_m: f64,
}

/// A computed path with its step list and summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub steps: Vec<RouteStep>,
    pub distance_m: f64,
    pub duration_s: f64,
}

impl Route {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.path)
    }

    /// Distance in kilometres rounded to one decimal.
    pub fn distance_km(&self) -> f64 {
        (self.distance_m / 100.0).round() / 10.0
    }

    /// Duration in whole minutes.
    pub fn duration_min(&self) -> u64 {
        (self.duration_s / 60.0).round().max(0.0) as u64
    }
}

/// External service computing a travel path between two coordinates.
pub trait RoutingService: Send + Sync {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, RoutingError>;
}
