use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coord::Coordinate;
use crate::map::MapOptions;
use crate::map::projection::{MAX_ZOOM, MIN_ZOOM};
use crate::routing::osrm::{DEFAULT_PROFILE, DEFAULT_URL};
use crate::speech::{SpeechEngine, VoiceSettings};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "compass";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const VALID_KEYS: &[&str] = &[
    "map.center",
    "map.zoom",
    "map.tile_url",
    "map.attribution",
    "routing.url",
    "routing.profile",
    "routing.timeout_secs",
    "voice.enabled",
    "voice.rate",
    "voice.volume",
    "voice.pitch",
    "voice.lang",
    "voice.command",
    "location.device",
];

const PROFILES: &[&str] = &["driving", "car", "walking", "foot", "cycling", "bike"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,

    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Speech command to prefer (`espeak-ng`, `espeak`, `spd-say` or `say`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed device position reported by the locator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Coordinate>,
}

/// Effective routing service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSettings {
    pub url: String,
    pub profile: String,
    pub timeout: Duration,
}

fn parse_coordinate(key: &str, value: &str) -> Result<Coordinate> {
    let c: Coordinate = value
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid {key}: {e}"))?;
    if !c.is_in_range() {
        anyhow::bail!("Invalid {key}: {value} is outside latitude/longitude range.");
    }
    Ok(c)
}

fn parse_ranged(key: &str, value: &str, min: f32, max: f32) -> Result<f32> {
    let v: f32 = value
        .parse()
        .with_context(|| format!("Invalid {key}: {value}. Must be a number."))?;
    if !(min..=max).contains(&v) {
        anyhow::bail!("Invalid {key}: {value}. Must be between {min} and {max}.");
    }
    Ok(v)
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `compass config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# Campus Compass configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "map.center" => {
                let c = parse_coordinate(key, value)?;
                self.map.get_or_insert_with(MapConfig::default).center = Some(c);
            }
            "map.zoom" => {
                let zoom: u8 = value
                    .parse()
                    .ok()
                    .filter(|z| (MIN_ZOOM..=MAX_ZOOM).contains(z))
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid map.zoom: {value}. Must be a whole number from {MIN_ZOOM} to {MAX_ZOOM}."
                        )
                    })?;
                self.map.get_or_insert_with(MapConfig::default).zoom = Some(zoom);
            }
            "map.tile_url" => {
                if !["{z}", "{x}", "{y}"].iter().all(|p| value.contains(p)) {
                    anyhow::bail!(
                        "Invalid map.tile_url: {value}. Must contain {{z}}, {{x}} and {{y}}."
                    );
                }
                self.map.get_or_insert_with(MapConfig::default).tile_url = Some(value.to_string());
            }
            "map.attribution" => {
                self.map.get_or_insert_with(MapConfig::default).attribution =
                    Some(value.to_string());
            }
            "routing.url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!(
                        "Invalid routing.url: {value}. Must start with http:// or https://."
                    );
                }
                self.routing.get_or_insert_with(RoutingConfig::default).url =
                    Some(value.trim_end_matches('/').to_string());
            }
            "routing.profile" => {
                if !PROFILES.contains(&value) {
                    anyhow::bail!(
                        "Invalid routing.profile: {value}. Must be one of: {}.",
                        PROFILES.join(", ")
                    );
                }
                self.routing.get_or_insert_with(RoutingConfig::default).profile =
                    Some(value.to_string());
            }
            "routing.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .ok()
                    .filter(|s| (1..=120).contains(s))
                    .ok_or_else(|| {
                        anyhow::anyhow!("Invalid routing.timeout_secs: {value}. Must be 1 to 120.")
                    })?;
                self.routing
                    .get_or_insert_with(RoutingConfig::default)
                    .timeout_secs = Some(secs);
            }
            "voice.enabled" => {
                let enabled = match value {
                    "true" | "on" | "yes" => true,
                    "false" | "off" | "no" => false,
                    _ => {
                        anyhow::bail!("Invalid voice.enabled: {value}. Must be 'true' or 'false'.")
                    }
                };
                self.voice.get_or_insert_with(VoiceConfig::default).enabled = Some(enabled);
            }
            "voice.rate" => {
                let rate = parse_ranged(key, value, 0.1, 10.0)?;
                self.voice.get_or_insert_with(VoiceConfig::default).rate = Some(rate);
            }
            "voice.volume" => {
                let volume = parse_ranged(key, value, 0.0, 1.0)?;
                self.voice.get_or_insert_with(VoiceConfig::default).volume = Some(volume);
            }
            "voice.pitch" => {
                let pitch = parse_ranged(key, value, 0.0, 2.0)?;
                self.voice.get_or_insert_with(VoiceConfig::default).pitch = Some(pitch);
            }
            "voice.lang" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid voice.lang: must not be empty.");
                }
                self.voice.get_or_insert_with(VoiceConfig::default).lang = Some(value.to_string());
            }
            "voice.command" => {
                if SpeechEngine::from_name(value).is_none() {
                    let names: Vec<&str> =
                        SpeechEngine::all().iter().map(|e| e.binary_name()).collect();
                    anyhow::bail!(
                        "Invalid voice.command: {value}. Must be one of: {}.",
                        names.join(", ")
                    );
                }
                self.voice.get_or_insert_with(VoiceConfig::default).command =
                    Some(value.to_string());
            }
            "location.device" => {
                let device = if value == "none" {
                    None
                } else {
                    Some(parse_coordinate(key, value)?)
                };
                self.location
                    .get_or_insert_with(LocationConfig::default)
                    .device = device;
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    pub fn map_options(&self) -> MapOptions {
        let defaults = MapOptions::default();
        let Some(map) = &self.map else {
            return defaults;
        };
        MapOptions {
            center: map.center.unwrap_or(defaults.center),
            zoom: map.zoom.unwrap_or(defaults.zoom),
            tile_url: map.tile_url.clone().unwrap_or(defaults.tile_url),
            attribution: map.attribution.clone().unwrap_or(defaults.attribution),
        }
    }

    pub fn routing_settings(&self) -> RoutingSettings {
        let routing = self.routing.clone().unwrap_or_default();
        RoutingSettings {
            url: routing.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            profile: routing.profile.unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            timeout: Duration::from_secs(routing.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        let defaults = VoiceSettings::default();
        let Some(voice) = &self.voice else {
            return defaults;
        };
        VoiceSettings {
            rate: voice.rate.unwrap_or(defaults.rate),
            volume: voice.volume.unwrap_or(defaults.volume),
            pitch: voice.pitch.unwrap_or(defaults.pitch),
            lang: voice.lang.clone().unwrap_or(defaults.lang),
        }
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice.as_ref().and_then(|v| v.enabled).unwrap_or(true)
    }

    pub fn voice_command(&self) -> Option<&str> {
        self.voice.as_ref().and_then(|v| v.command.as_deref())
    }

    pub fn device_location(&self) -> Option<Coordinate> {
        self.location.as_ref().and_then(|l| l.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let map = config.map_options();
        assert_eq!(map.center, Coordinate::new(0.3476, 32.5825));
        assert_eq!(map.zoom, 18);
        let routing = config.routing_settings();
        assert_eq!(routing.url, "https://router.project-osrm.org");
        assert_eq!(routing.timeout, Duration::from_secs(10));
        assert!(config.voice_enabled());
        assert_eq!(config.voice_settings().lang, "en");
        assert_eq!(config.device_location(), None);
    }

    #[test]
    fn test_set_valid_values() {
        let mut config = Config::default();
        config.set("map.center", "0.35, 32.6").unwrap();
        config.set("map.zoom", "16").unwrap();
        config.set("routing.url", "http://localhost:5000/").unwrap();
        config.set("routing.profile", "foot").unwrap();
        config.set("voice.enabled", "off").unwrap();
        config.set("voice.rate", "1.2").unwrap();
        config.set("voice.command", "spd-say").unwrap();
        config.set("location.device", "0.3480,32.5830").unwrap();

        assert_eq!(config.map_options().center, Coordinate::new(0.35, 32.6));
        assert_eq!(config.map_options().zoom, 16);
        assert_eq!(config.routing_settings().url, "http://localhost:5000");
        assert_eq!(config.routing_settings().profile, "foot");
        assert!(!config.voice_enabled());
        assert_eq!(config.voice_settings().rate, 1.2);
        assert_eq!(config.voice_command(), Some("spd-say"));
        assert_eq!(
            config.device_location(),
            Some(Coordinate::new(0.3480, 32.5830))
        );

        config.set("location.device", "none").unwrap();
        assert_eq!(config.device_location(), None);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("map.zoom", "0").is_err());
        assert!(config.set("map.zoom", "20").is_err());
        assert!(config.set("map.center", "north").is_err());
        assert!(config.set("map.center", "95,10").is_err());
        assert!(config.set("map.tile_url", "https://tiles.example/{z}.png").is_err());
        assert!(config.set("routing.url", "ftp://x").is_err());
        assert!(config.set("routing.profile", "teleport").is_err());
        assert!(config.set("routing.timeout_secs", "0").is_err());
        assert!(config.set("voice.volume", "1.5").is_err());
        assert!(config.set("voice.enabled", "maybe").is_err());
        assert!(config.set("voice.command", "festival").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_unknown_key_lists_valid_keys() {
        let mut config = Config::default();
        let err = config.set("map.theme", "dark").unwrap_err().to_string();
        assert!(err.contains("Unknown config key: map.theme"));
        assert!(err.contains("routing.profile"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);
        let mut config = Config::default();
        config.set("map.zoom", "17").unwrap();
        config.set("voice.lang", "en-GB").unwrap();
        config.save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Campus Compass configuration"));
        assert!(!text.contains("routing"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("No config found"));
    }
}
