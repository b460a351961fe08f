mod overlay;
mod stale;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{DirectionsController, Narrator};
use crate::coord::Coordinate;
use crate::map::adapter::Surface;
use crate::map::{MapAdapter, MapOptions};
use crate::poi::{Poi, seed_pois};
use crate::routing::{Route, RouteStep, RoutingError, RoutingService};
use crate::speech::{SpeechSynthesizer, Utterance, VoiceSettings};

const USER: Coordinate = Coordinate::new(0.3475, 32.5823);

/// What the recording synthesizer was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
enum Speech {
    Speak(String),
    Cancel,
}

type SpeechLog = Arc<Mutex<Vec<Speech>>>;

struct RecordingSpeech {
    log: SpeechLog,
    speaking: bool,
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&mut self, utterance: &Utterance) {
        self.speaking = true;
        self.log
            .lock()
            .unwrap()
            .push(Speech::Speak(utterance.text.clone()));
    }

    fn cancel(&mut self) {
        self.speaking = false;
        self.log.lock().unwrap().push(Speech::Cancel);
    }

    fn is_speaking(&mut self) -> bool {
        self.speaking
    }
}

/// Routing service answering every request with a fixed result.
struct FakeRouter {
    result: Result<Route, RoutingError>,
    calls: AtomicUsize,
}

impl FakeRouter {
    fn ok(route: Route) -> Self {
        Self {
            result: Ok(route),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: RoutingError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingService for FakeRouter {
    fn route(&self, _origin: Coordinate, _destination: Coordinate) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Controller with narration on, plus the log of everything it said.
fn controller() -> (DirectionsController, SpeechLog) {
    let log: SpeechLog = Arc::new(Mutex::new(Vec::new()));
    let synth = RecordingSpeech {
        log: Arc::clone(&log),
        speaking: false,
    };
    let narrator = Narrator::new(Box::new(synth), VoiceSettings::default(), true);
    (DirectionsController::new(narrator), log)
}

fn spoken(log: &SpeechLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|s| match s {
            Speech::Speak(text) => Some(text.clone()),
            Speech::Cancel => None,
        })
        .collect()
}

fn mounted_map() -> MapAdapter {
    let mut map = MapAdapter::new(MapOptions::default());
    assert!(map.mount(Some(Surface::new(800.0, 600.0))));
    map
}

fn poi(name: &str) -> Poi {
    seed_pois()
        .into_iter()
        .find(|p| p.name == name)
        .unwrap()
}

fn sample_route(to: Coordinate) -> Route {
    Route {
        path: vec![USER, Coordinate::new(0.3476, 32.5824), to],
        steps: vec![
            RouteStep {
                instruction: "Head east on <b>University Rd</b> (120 m)".to_string(),
                distance_m: 120.0,
            },
            RouteStep {
                instruction: "TL onto Main St".to_string(),
                distance_m: 200.0,
            },
            RouteStep {
                instruction: "You have arrived at your destination".to_string(),
                distance_m: 0.0,
            },
        ],
        distance_m: 320.0,
        duration_s: 75.0,
    }
}
