use thiserror::Error;

/// Failures surfaced by the navigation core.
///
/// Every variant is recovered where it occurs; none of them ends the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("Your location is not available.")]
    LocationUnavailable,
    #[error("Routing failed: {0}")]
    RoutingFailed(String),
    #[error("Map surface is not ready")]
    MapInitFailed,
    #[error("Invalid location details: {0}")]
    MalformedPoiInput(String),
}
