use anyhow::{Context, Result};
use eframe::egui::{self, ColorImage, TextureHandle, TextureId, TextureOptions};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use super::projection::TileId;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";
const USER_AGENT: &str = concat!("compass/", env!("CARGO_PKG_VERSION"));

const CACHE_CAPACITY: usize = 256;
const MAX_IN_FLIGHT: usize = 8;

type Delivery = (TileId, Result<ColorImage, String>);

/// In-memory tile imagery for one mounted map.
///
/// Downloads run on short-lived threads and land in a channel that is drained
/// whenever a tile is looked up, so the UI thread never waits on the network.
pub struct TileCache {
    url_template: String,
    agent: ureq::Agent,
    textures: LruCache<TileId, TextureHandle>,
    pending: HashSet<TileId>,
    failed: HashSet<TileId>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl TileCache {
    pub fn new(url_template: &str) -> Self {
        Self::with_capacity(url_template, CACHE_CAPACITY)
    }

    pub fn with_capacity(url_template: &str, capacity: usize) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(15)))
            .build();
        let (tx, rx) = mpsc::channel();
        Self {
            url_template: url_template.to_string(),
            agent: ureq::Agent::new_with_config(config),
            textures: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            pending: HashSet::new(),
            failed: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Texture for `id` if already loaded; otherwise schedules a download.
    pub fn get(&mut self, ctx: &egui::Context, id: TileId) -> Option<TextureId> {
        self.receive(ctx);
        if let Some(texture) = self.textures.get(&id) {
            return Some(texture.id());
        }
        self.request(ctx, id);
        None
    }

    fn request(&mut self, ctx: &egui::Context, id: TileId) {
        if self.pending.contains(&id)
            || self.failed.contains(&id)
            || self.pending.len() >= MAX_IN_FLIGHT
        {
            return;
        }
        self.pending.insert(id);

        let url = id.url(&self.url_template);
        let agent = self.agent.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = fetch_tile(&agent, &url).map_err(|e| format!("{e:#}"));
            // The receiver is gone once the map has been unmounted.
            if tx.send((id, result)).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    fn receive(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.rx.try_recv() {
            self.pending.remove(&id);
            match result {
                Ok(image) => {
                    let name = format!("tile-{}-{}-{}", id.z, id.x, id.y);
                    let texture = ctx.load_texture(name, image, TextureOptions::LINEAR);
                    self.textures.put(id, texture);
                }
                Err(e) => {
                    tracing::warn!(z = id.z, x = id.x, y = id.y, error = %e, "tile fetch failed");
                    self.failed.insert(id);
                }
            }
        }
    }
}

fn fetch_tile(agent: &ureq::Agent, url: &str) -> Result<ColorImage> {
    tracing::trace!(%url, "fetching tile");
    let mut response = agent
        .get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .with_context(|| format!("GET {url}"))?;
    let bytes = response
        .body_mut()
        .read_to_vec()
        .context("Failed to read tile body")?;
    decode_tile(&bytes)
}

/// Decode PNG or JPEG tile bytes into an RGBA image.
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage> {
    let image = image::load_from_memory(bytes).context("Failed to decode tile image")?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_png_tile() {
        let mut img = image::RgbaImage::new(4, 2);
        img.put_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_tile(&bytes).unwrap();
        assert_eq!(decoded.size, [4, 2]);
        assert_eq!(decoded.pixels[4 + 1], egui::Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_tile(b"not an image").is_err());
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = TileCache::with_capacity(DEFAULT_TILE_URL, 0);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.in_flight(), 0);
    }
}
