use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use super::print_notice;
use crate::config::Config;
use crate::coord::Coordinate;
use crate::directions::{DirectionsController, DirectionsState, Narrator, clean_instruction};
use crate::location::{GeolocationProvider, LocationSource, locator_for};
use crate::map::MapAdapter;
use crate::poi::PoiStore;
use crate::routing::OsrmClient;
use crate::speech::{SilentSpeech, SpeechSynthesizer, system_synthesizer};

pub fn run(destination: &str, from: Option<Coordinate>, speak: bool) -> Result<()> {
    let config = Config::load_or_default();
    let store = PoiStore::seeded();
    let poi = store.find(destination).cloned().ok_or_else(|| {
        anyhow::anyhow!("No location named '{destination}'. Run `compass pois` to list them.")
    })?;

    let mut geolocation = GeolocationProvider::default();
    let locator = locator_for(from.or(config.device_location()));
    let (origin, notice) = geolocation.acquire(locator.as_ref());
    if let Some(notice) = notice {
        print_notice(&notice);
    }

    let routing = config.routing_settings();
    let client = OsrmClient::new(&routing.url, &routing.profile, routing.timeout);
    let synth: Box<dyn SpeechSynthesizer> = if speak {
        system_synthesizer(config.voice_command())
    } else {
        Box::new(SilentSpeech)
    };
    let mut controller =
        DirectionsController::new(Narrator::new(synth, config.voice_settings(), speak));
    // There is no map surface in a terminal; the adapter stays unmounted.
    let mut map = MapAdapter::new(config.map_options());

    let start = match geolocation.fix().map(|f| f.source) {
        Some(LocationSource::Fallback) => format!("from the campus centre ({origin})"),
        _ => format!("from {origin}"),
    };
    println!(
        "{} Directions to {} {}",
        poi.category.icon(),
        poi.name.bold(),
        start.dimmed()
    );
    if let Some(notice) = controller.request(&client, &poi, Some(origin), &mut map)? {
        print_notice(&notice);
    }

    match controller.state() {
        DirectionsState::RouteFound { route, .. } => {
            println!();
            for (i, step) in route.steps.iter().enumerate() {
                let text = clean_instruction(&step.instruction);
                if text.is_empty() {
                    continue;
                }
                let distance = if step.distance_m > 0.0 {
                    format_distance(step.distance_m).dimmed().to_string()
                } else {
                    String::new()
                };
                println!("{:>3}. {text} {distance}", i + 1);
            }
        }
        DirectionsState::RouteError { reason, .. } => {
            tracing::debug!(%reason, "showing direct heading");
            println!(
                "   Head directly towards {} ({})",
                poi.name,
                poi.coordinates
            );
        }
        DirectionsState::Idle | DirectionsState::Requesting { .. } => {}
    }

    if speak {
        while controller.narrator_mut().is_speaking() {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
    Ok(())
}

/// Metres below one kilometre, otherwise kilometres with one decimal.
pub fn format_distance(metres: f64) -> String {
    if metres < 1000.0 {
        format!("{metres:.0} m")
    } else {
        format!("{:.1} km", metres / 1000.0)
    }
}
