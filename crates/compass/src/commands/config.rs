use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!(
                "{} {} = {} ({})",
                "✓".green().bold(),
                key.bold(),
                value,
                path.display().to_string().dimmed()
            );
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = if path.exists() {
        println!("{} {}", "Config file:".bold(), path.display());
        Config::load_from(&path)?
    } else {
        println!(
            "{} {} {}",
            "Config file:".bold(),
            path.display(),
            "(not created yet, showing defaults)".dimmed()
        );
        Config::default()
    };
    println!();
    for (key, value) in effective_values(&config) {
        println!("  {:<22} {}", key.cyan(), value);
    }
    Ok(())
}

/// Every settable key with the value in effect.
pub fn effective_values(config: &Config) -> Vec<(&'static str, String)> {
    let map = config.map_options();
    let routing = config.routing_settings();
    let voice = config.voice_settings();
    vec![
        ("map.center", format!("{},{}", map.center.lat, map.center.lng)),
        ("map.zoom", map.zoom.to_string()),
        ("map.tile_url", map.tile_url),
        ("map.attribution", map.attribution),
        ("routing.url", routing.url),
        ("routing.profile", routing.profile),
        ("routing.timeout_secs", routing.timeout.as_secs().to_string()),
        ("voice.enabled", config.voice_enabled().to_string()),
        ("voice.rate", voice.rate.to_string()),
        ("voice.volume", voice.volume.to_string()),
        ("voice.pitch", voice.pitch.to_string()),
        ("voice.lang", voice.lang),
        (
            "voice.command",
            config.voice_command().unwrap_or("auto").to_string(),
        ),
        (
            "location.device",
            config
                .device_location()
                .map(|c| format!("{},{}", c.lat, c.lng))
                .unwrap_or_else(|| "none".to_string()),
        ),
    ]
}
