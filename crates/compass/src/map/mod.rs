//! The interactive tile map: viewport math, tile imagery, the owned map state and
//! its egui rendering.

pub mod adapter;
pub mod projection;
pub mod render;
pub mod tiles;

pub use adapter::{MapAdapter, MapEvent, MapOptions, MarkerSync, Overlay};
