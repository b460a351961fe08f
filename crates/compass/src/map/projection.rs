//! Web-Mercator ("slippy map") arithmetic for a map viewport.

use std::f64::consts::PI;

use crate::coord::{Bounds, Coordinate};

pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 19;

/// Latitude limit of the square Web-Mercator world.
const MAX_LATITUDE: f64 = 85.051_128_78;

fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(zoom as i32)
}

/// Coordinate to world pixels at `zoom`.
pub fn project(c: Coordinate, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = c.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (c.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// World pixels at `zoom` back to a coordinate.
pub fn unproject(x: f64, y: f64, zoom: u8) -> Coordinate {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    Coordinate::new(lat, lng)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fill a `{z}/{x}/{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// Centre, integer zoom level and pixel size of the visible map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub width: f32,
    pub height: f32,
}

impl MapView {
    pub fn new(center: Coordinate, zoom: u8, width: f32, height: f32) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    fn origin(&self) -> (f64, f64) {
        let (cx, cy) = project(self.center, self.zoom);
        (cx - self.width as f64 / 2.0, cy - self.height as f64 / 2.0)
    }

    /// Position relative to the top-left corner of the viewport.
    pub fn to_screen(&self, c: Coordinate) -> [f32; 2] {
        let (ox, oy) = self.origin();
        let (x, y) = project(c, self.zoom);
        [(x - ox) as f32, (y - oy) as f32]
    }

    pub fn from_screen(&self, pos: [f32; 2]) -> Coordinate {
        let (ox, oy) = self.origin();
        unproject(ox + pos[0] as f64, oy + pos[1] as f64, self.zoom)
    }

    pub fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Move the content by a screen delta (a drag).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let (cx, cy) = project(self.center, self.zoom);
        self.center = unproject(cx - dx as f64, cy - dy as f64, self.zoom);
    }

    /// Change zoom by `delta` levels keeping the point under `anchor` fixed on screen.
    pub fn zoom_around(&mut self, delta: i32, anchor: [f32; 2]) {
        let target = (self.zoom as i32 + delta).clamp(MIN_ZOOM as i32, MAX_ZOOM as i32) as u8;
        if target == self.zoom {
            return;
        }
        let anchored = self.from_screen(anchor);
        self.zoom = target;
        let (ax, ay) = project(anchored, target);
        let cx = ax - (anchor[0] as f64 - self.width as f64 / 2.0);
        let cy = ay - (anchor[1] as f64 - self.height as f64 / 2.0);
        self.center = unproject(cx, cy, target);
    }

    /// Centre on `bounds` at the deepest zoom that shows it with `padding` pixels to spare.
    pub fn fit_bounds(&mut self, bounds: Bounds, padding: f32) {
        let avail_w = (self.width - 2.0 * padding).max(1.0) as f64;
        let avail_h = (self.height - 2.0 * padding).max(1.0) as f64;

        let zoom = (MIN_ZOOM..=MAX_ZOOM)
            .rev()
            .find(|&z| {
                let (x0, y0) = project(bounds.south_west, z);
                let (x1, y1) = project(bounds.north_east, z);
                (x1 - x0).abs() <= avail_w && (y1 - y0).abs() <= avail_h
            })
            .unwrap_or(MIN_ZOOM);

        let (x0, y0) = project(bounds.south_west, zoom);
        let (x1, y1) = project(bounds.north_east, zoom);
        self.zoom = zoom;
        self.center = unproject((x0 + x1) / 2.0, (y0 + y1) / 2.0, zoom);
    }

    /// Tiles covering the viewport with the screen position of each tile's top-left corner.
    pub fn visible_tiles(&self) -> Vec<(TileId, [f32; 2])> {
        let (ox, oy) = self.origin();
        let count = 1i64 << self.zoom;
        let first_x = (ox / TILE_SIZE).floor() as i64;
        let last_x = ((ox + self.width as f64) / TILE_SIZE).floor() as i64;
        let first_y = (oy / TILE_SIZE).floor() as i64;
        let last_y = ((oy + self.height as f64) / TILE_SIZE).floor() as i64;

        let mut tiles = Vec::new();
        for ty in first_y.max(0)..=last_y.min(count - 1) {
            for tx in first_x..=last_x {
                let id = TileId {
                    z: self.zoom,
                    x: tx.rem_euclid(count) as u32,
                    y: ty as u32,
                };
                let pos = [
                    (tx as f64 * TILE_SIZE - ox) as f32,
                    (ty as f64 * TILE_SIZE - oy) as f32,
                ];
                tiles.push((id, pos));
            }
        }
        tiles
    }
}
