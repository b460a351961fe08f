use colored::Colorize;

use crate::filter::{CategoryFilter, filter_pois};
use crate::poi::{Poi, PoiStore};

pub fn run(search: Option<&str>, category: CategoryFilter, essential: bool, accessible: bool) {
    let store = PoiStore::seeded();
    let shown = filter_pois(
        store.all(),
        search.unwrap_or_default(),
        category,
        essential,
        accessible,
    );

    println!(
        "{} {} ({} of {})",
        category.icon(),
        category.display_name().bold(),
        shown.len(),
        store.len()
    );
    if shown.is_empty() {
        println!("{}", "No locations match these filters.".dimmed());
        return;
    }
    println!();
    for poi in shown {
        print_poi(poi);
    }
}

fn print_poi(poi: &Poi) {
    let mut badges = Vec::new();
    if poi.is_essential {
        badges.push("★ essential".yellow().to_string());
    }
    if poi.is_accessible {
        badges.push("♿ accessible".green().to_string());
    }
    println!(
        "{} {} {} {}",
        poi.category.icon(),
        poi.name.bold(),
        format!("[{}]", poi.category.display_name()).cyan(),
        badges.join(" ")
    );
    if !poi.description.is_empty() {
        println!("   {}", poi.description.dimmed());
    }
    let mut details = vec![format!("id {}", poi.id), poi.coordinates.to_string()];
    if let Some(hours) = &poi.hours {
        details.push(hours.clone());
    }
    if let Some(floor) = &poi.floor {
        details.push(format!("floor {floor}"));
    }
    println!("   {}", details.join(" · ").dimmed());
}
