use thiserror::Error;

use crate::coord::Coordinate;
use crate::error::NavError;
use crate::notice::Notice;

/// Campus centre used when the device position cannot be obtained.
pub const FALLBACK_LOCATION: Coordinate = Coordinate::new(0.3475, 32.5823);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location access denied")]
    Denied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Geolocation is not supported on this platform")]
    Unsupported,
}

/// Platform source of the device position.
pub trait Locator: Send {
    fn locate(&self) -> Result<Coordinate, LocationError>;
}

/// A device position supplied up front (command line or config).
pub struct FixedLocator(pub Coordinate);

impl Locator for FixedLocator {
    fn locate(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Used when no position source is configured.
pub struct UnsupportedLocator;

impl Locator for UnsupportedLocator {
    fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Pick the locator for an optional configured device position.
pub fn locator_for(device: Option<Coordinate>) -> Box<dyn Locator> {
    match device {
        Some(c) => Box::new(FixedLocator(c)),
        None => Box::new(UnsupportedLocator),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub source: LocationSource,
}

/// One-shot, session-cached acquisition of the user's position.
#[derive(Debug, Clone)]
pub struct GeolocationProvider {
    fallback: Coordinate,
    fix: Option<Fix>,
}

impl Default for GeolocationProvider {
    fn default() -> Self {
        Self::new(FALLBACK_LOCATION)
    }
}

impl GeolocationProvider {
    pub fn new(fallback: Coordinate) -> Self {
        Self {
            fallback,
            fix: None,
        }
    }

    /// Query the locator once; later calls return the cached fix.
    pub fn acquire(&mut self, locator: &dyn Locator) -> (Coordinate, Option<Notice>) {
        if let Some(fix) = self.fix {
            return (fix.coordinate, None);
        }
        self.resolve(locator.locate())
    }

    /// Record the outcome of a locator call made elsewhere (e.g. on a worker thread).
    ///
    /// Only the first outcome is kept. A failure yields the fallback position and
    /// exactly one informational notice.
    pub fn resolve(
        &mut self,
        outcome: Result<Coordinate, LocationError>,
    ) -> (Coordinate, Option<Notice>) {
        if let Some(fix) = self.fix {
            return (fix.coordinate, None);
        }
        match outcome {
            Ok(coordinate) => {
                tracing::debug!(%coordinate, "user location obtained");
                self.fix = Some(Fix {
                    coordinate,
                    source: LocationSource::Device,
                });
                (coordinate, None)
            }
            Err(e) => {
                tracing::info!(error = %e, fallback = %self.fallback, "using fallback location");
                self.fix = Some(Fix {
                    coordinate: self.fallback,
                    source: LocationSource::Fallback,
                });
                (
                    self.fallback,
                    Some(Notice::info(
                        "Location",
                        "Using campus center as starting point for directions",
                    )),
                )
            }
        }
    }

    pub fn fix(&self) -> Option<Fix> {
        self.fix
    }

    pub fn current(&self) -> Option<Coordinate> {
        self.fix.map(|f| f.coordinate)
    }

    /// The cached position, or `LocationUnavailable` before acquisition finished.
    pub fn require(&self) -> Result<Coordinate, NavError> {
        self.current().ok_or(NavError::LocationUnavailable)
    }
}
