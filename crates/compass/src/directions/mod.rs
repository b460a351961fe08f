//! Directions lifecycle: request a route to a POI, draw the result (or a straight
//! line when routing fails) and read the instructions aloud.

pub mod narration;

#[cfg(test)]
mod tests;

pub use narration::{Narrator, clean_instruction, direct_heading};

use crate::coord::Coordinate;
use crate::error::NavError;
use crate::map::adapter::FIT_PADDING;
use crate::map::{MapAdapter, Overlay};
use crate::notice::Notice;
use crate::poi::Poi;
use crate::routing::{Route, RoutingError, RoutingService};

pub const FALLBACK_MESSAGE: &str = "Could not find route. Showing direct line instead.";

#[derive(Debug, Clone, PartialEq)]
pub enum DirectionsState {
    Idle,
    Requesting {
        seq: u64,
        origin: Coordinate,
        destination: Poi,
    },
    RouteFound {
        destination: Poi,
        route: Route,
    },
    RouteError {
        destination: Poi,
        reason: String,
    },
}

impl DirectionsState {
    pub fn destination(&self) -> Option<&Poi> {
        match self {
            Self::Idle => None,
            Self::Requesting { destination, .. }
            | Self::RouteFound { destination, .. }
            | Self::RouteError { destination, .. } => Some(destination),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// One issued route computation. The result must be handed back to
/// [`DirectionsController::complete`] together with `seq`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub seq: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

pub struct DirectionsController {
    state: DirectionsState,
    seq: u64,
    narrator: Narrator,
}

impl DirectionsController {
    pub fn new(narrator: Narrator) -> Self {
        Self {
            state: DirectionsState::Idle,
            seq: 0,
            narrator,
        }
    }

    pub fn state(&self) -> &DirectionsState {
        &self.state
    }

    pub fn narrator_mut(&mut self) -> &mut Narrator {
        &mut self.narrator
    }

    /// Start a request to `destination` from the user's position.
    ///
    /// Any overlay already on the map is removed and the destination pin moved to
    /// `destination` before the ticket is returned.
    pub fn begin(
        &mut self,
        destination: &Poi,
        user: Option<Coordinate>,
        map: &mut MapAdapter,
    ) -> Result<RouteTicket, NavError> {
        let origin = user.ok_or(NavError::LocationUnavailable)?;

        map.remove_overlay();
        map.set_destination(destination);
        self.narrator.stop();
        self.seq += 1;
        self.state = DirectionsState::Requesting {
            seq: self.seq,
            origin,
            destination: destination.clone(),
        };
        tracing::info!(seq = self.seq, to = %destination.name, %origin, "route requested");

        Ok(RouteTicket {
            seq: self.seq,
            origin,
            destination: destination.coordinates,
        })
    }

    /// Apply the outcome of the request numbered `seq`.
    ///
    /// Returns `None` when the response is stale (superseded or cleared) and was dropped.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<Route, RoutingError>,
        map: &mut MapAdapter,
    ) -> Option<Notice> {
        let (origin, destination) = match &self.state {
            DirectionsState::Requesting {
                seq: current,
                origin,
                destination,
            } if *current == seq => (*origin, destination.clone()),
            _ => {
                tracing::debug!(seq, latest = self.seq, "dropping stale route response");
                return None;
            }
        };

        let result = result.and_then(|route| {
            if route.path.len() < 2 {
                Err(RoutingError::NoRoute)
            } else {
                Ok(route)
            }
        });

        map.remove_overlay();
        match result {
            Ok(route) => {
                map.set_overlay(Overlay::route(route.path.clone()));
                if let Some(bounds) = route.bounds() {
                    map.fit_bounds(bounds, FIT_PADDING);
                }
                self.narrator.narrate_steps(&route.steps);

                let notice = Notice::success(
                    "Directions",
                    format!(
                        "Route to {} loaded! {:.1} km, about {} min",
                        destination.name,
                        route.distance_km(),
                        route.duration_min()
                    ),
                );
                tracing::info!(
                    seq,
                    km = route.distance_km(),
                    min = route.duration_min(),
                    steps = route.steps.len(),
                    "route found"
                );
                self.state = DirectionsState::RouteFound { destination, route };
                Some(notice)
            }
            Err(e) => {
                let reason = NavError::RoutingFailed(e.to_string()).to_string();
                tracing::warn!(seq, error = %e, "no route, drawing direct line");

                let overlay = Overlay::direct(origin, destination.coordinates);
                if let Some(bounds) = overlay.bounds() {
                    map.fit_bounds(bounds, FIT_PADDING);
                }
                map.set_overlay(overlay);
                self.narrator.say(&direct_heading(&destination.name));

                self.state = DirectionsState::RouteError {
                    destination,
                    reason,
                };
                Some(Notice::error("Directions", FALLBACK_MESSAGE))
            }
        }
    }

    /// Issue a request and wait for the routing service on the calling thread.
    pub fn request(
        &mut self,
        routing: &dyn RoutingService,
        destination: &Poi,
        user: Option<Coordinate>,
        map: &mut MapAdapter,
    ) -> Result<Option<Notice>, NavError> {
        let ticket = self.begin(destination, user, map)?;
        let result = routing.route(ticket.origin, ticket.destination);
        Ok(self.complete(ticket.seq, result, map))
    }

    /// Drop the overlay, the destination pin and any speech and go back to `Idle`.
    ///
    /// A response still in flight becomes stale.
    pub fn clear(&mut self, map: &mut MapAdapter) {
        map.remove_overlay();
        map.clear_destination();
        self.narrator.stop();
        if !self.state.is_idle() {
            tracing::debug!("directions cleared");
        }
        self.state = DirectionsState::Idle;
    }

    pub fn set_narration(&mut self, enabled: bool) {
        self.narrator.set_enabled(enabled);
    }

    pub fn narration_enabled(&self) -> bool {
        self.narrator.is_enabled()
    }
}
