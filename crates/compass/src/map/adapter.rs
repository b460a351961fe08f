use eframe::egui::Color32;

use super::projection::{MAX_ZOOM, MIN_ZOOM, MapView};
use super::tiles::{ATTRIBUTION, DEFAULT_TILE_URL, TileCache};
use crate::coord::{Bounds, Coordinate};
use crate::error::NavError;
use crate::filter::PoiFilter;
use crate::poi::{Poi, PoiStore};
use crate::theme::{self, ROUTE_COLOR};

pub const DEFAULT_CENTER: Coordinate = Coordinate::new(0.3476, 32.5825);
pub const DEFAULT_ZOOM: u8 = 18;
/// Zoom used when a POI is picked from the list.
pub const FOCUS_ZOOM: u8 = 19;
/// Zoom used when recentring on the user.
pub const LOCATE_ZOOM: u8 = 18;
pub const FIT_PADDING: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: ATTRIBUTION.to_string(),
        }
    }
}

/// Pixel area the map is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Something the user asked for by interacting with the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    SelectPoi(String),
    GetDirections(String),
    CreatePoiAt(Coordinate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Color32,
    pub opacity: f32,
    pub weight: f32,
    /// Dash and gap lengths in pixels, solid when `None`.
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    pub fn route() -> Self {
        Self {
            color: ROUTE_COLOR,
            opacity: 0.8,
            weight: 6.0,
            dash: None,
        }
    }

    pub fn direct() -> Self {
        Self {
            dash: Some([10.0, 10.0]),
            ..Self::route()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Route,
    DirectLine,
}

/// A line drawn on top of the tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub path: Vec<Coordinate>,
    pub style: LineStyle,
}

impl Overlay {
    pub fn route(path: Vec<Coordinate>) -> Self {
        Self {
            kind: OverlayKind::Route,
            path,
            style: LineStyle::route(),
        }
    }

    pub fn direct(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            kind: OverlayKind::DirectLine,
            path: vec![origin, destination],
            style: LineStyle::direct(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub category: &'static str,
    pub description: String,
    pub hours: Option<String>,
    pub floor: Option<String>,
    pub essential: bool,
    pub accessible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiMarker {
    pub poi_id: String,
    pub position: Coordinate,
    pub color: Color32,
    pub glyph: &'static str,
    pub essential: bool,
    pub popup: Popup,
}

impl PoiMarker {
    pub fn for_poi(poi: &Poi) -> Self {
        Self {
            poi_id: poi.id.clone(),
            position: poi.coordinates,
            color: theme::category_color(poi.category),
            glyph: poi.category.icon(),
            essential: poi.is_essential,
            popup: Popup {
                title: poi.name.clone(),
                category: poi.category.display_name(),
                description: poi.description.clone(),
                hours: poi.hours.clone(),
                floor: poi.floor.clone(),
                essential: poi.is_essential,
                accessible: poi.is_accessible,
            },
        }
    }
}

/// Pin on the end point of the directions being shown.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationMarker {
    pub position: Coordinate,
    pub name: String,
}

/// Everything that only exists while the map is mounted.
pub(crate) struct LiveMap {
    pub(crate) view: MapView,
    pub(crate) tiles: TileCache,
    markers: Vec<PoiMarker>,
    user: Option<Coordinate>,
    destination: Option<DestinationMarker>,
    overlay: Option<Overlay>,
    placing: bool,
    open_popup: Option<String>,
}

/// Owner of the one map instance, its markers and its route overlay.
///
/// Starts unmounted. Every operation on an unmounted adapter does nothing.
pub struct MapAdapter {
    options: MapOptions,
    live: Option<LiveMap>,
    /// Incremented on every successful mount.
    generation: u64,
}

impl MapAdapter {
    pub fn new(mut options: MapOptions) -> Self {
        options.zoom = options.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            options,
            live: None,
            generation: 0,
        }
    }

    pub fn attribution(&self) -> &str {
        &self.options.attribution
    }

    pub fn is_mounted(&self) -> bool {
        self.live.is_some()
    }

    /// Create the map on `surface`. Returns whether a map is live afterwards.
    ///
    /// A missing or empty surface leaves the adapter unmounted; a later call may succeed.
    pub fn mount(&mut self, surface: Option<Surface>) -> bool {
        if let Some(live) = self.live.as_mut() {
            if let Some(s) = surface {
                live.view.resize(s.width, s.height);
            }
            return true;
        }
        match self.create(surface) {
            Ok(live) => {
                tracing::debug!(
                    center = %self.options.center,
                    zoom = self.options.zoom,
                    "map mounted"
                );
                self.live = Some(live);
                self.generation += 1;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "map not mounted");
                false
            }
        }
    }

    fn create(&self, surface: Option<Surface>) -> Result<LiveMap, NavError> {
        let surface = surface.ok_or(NavError::MapInitFailed)?;
        if !(surface.width > 0.0 && surface.height > 0.0) {
            return Err(NavError::MapInitFailed);
        }
        Ok(LiveMap {
            view: MapView::new(
                self.options.center,
                self.options.zoom,
                surface.width,
                surface.height,
            ),
            tiles: TileCache::new(&self.options.tile_url),
            markers: Vec::new(),
            user: None,
            destination: None,
            overlay: None,
            placing: false,
            open_popup: None,
        })
    }

    /// Destroy the map, its tile cache and any pending placement.
    pub fn unmount(&mut self) {
        if self.live.take().is_some() {
            tracing::debug!("map unmounted");
        }
    }

    pub(crate) fn live_mut(&mut self) -> Option<&mut LiveMap> {
        self.live.as_mut()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.live.as_ref().map(|l| &l.view)
    }

    // --- markers ---

    /// Replace every POI marker with one per entry of `pois`. Returns the marker count.
    pub fn show_markers(&mut self, pois: &[&Poi]) -> usize {
        let Some(live) = self.live.as_mut() else {
            return 0;
        };
        live.markers.clear();
        live.markers.extend(pois.iter().map(|p| PoiMarker::for_poi(p)));
        let still_shown = live
            .open_popup
            .as_ref()
            .is_some_and(|open| live.markers.iter().any(|m| &m.poi_id == open));
        if !still_shown {
            live.open_popup = None;
        }
        live.markers.len()
    }

    pub fn markers(&self) -> &[PoiMarker] {
        self.live.as_ref().map(|l| l.markers.as_slice()).unwrap_or(&[])
    }

    pub fn set_user_location(&mut self, at: Coordinate) {
        if let Some(live) = self.live.as_mut() {
            live.user = Some(at);
        }
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.live.as_ref().and_then(|l| l.user)
    }

    /// Mark `poi` as the destination of the current directions.
    pub fn set_destination(&mut self, poi: &Poi) {
        if let Some(live) = self.live.as_mut() {
            live.destination = Some(DestinationMarker {
                position: poi.coordinates,
                name: poi.name.clone(),
            });
        }
    }

    pub fn clear_destination(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.destination = None;
        }
    }

    pub fn destination(&self) -> Option<&DestinationMarker> {
        self.live.as_ref().and_then(|l| l.destination.as_ref())
    }

    // --- popups ---

    pub fn open_popup(&mut self, poi_id: &str) {
        if let Some(live) = self.live.as_mut() {
            if live.markers.iter().any(|m| m.poi_id == poi_id) {
                live.open_popup = Some(poi_id.to_string());
            }
        }
    }

    pub fn close_popup(&mut self) {
        if let Some(live) = self.live.as_mut() {
            live.open_popup = None;
        }
    }

    pub fn open_popup_marker(&self) -> Option<&PoiMarker> {
        let live = self.live.as_ref()?;
        let id = live.open_popup.as_deref()?;
        live.markers.iter().find(|m| m.poi_id == id)
    }

    // --- placement ---

    pub fn set_placing(&mut self, placing: bool) {
        if let Some(live) = self.live.as_mut() {
            live.placing = placing;
        }
    }

    pub fn is_placing(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.placing)
    }

    // --- view ---

    pub fn set_view(&mut self, center: Coordinate, zoom: u8) {
        if let Some(live) = self.live.as_mut() {
            live.view.set_view(center, zoom);
        }
    }

    pub fn fit_bounds(&mut self, bounds: Bounds, padding: f32) {
        if let Some(live) = self.live.as_mut() {
            live.view.fit_bounds(bounds, padding);
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if let Some(live) = self.live.as_mut() {
            live.view.pan(dx, dy);
        }
    }

    pub fn zoom_around(&mut self, delta: i32, anchor: [f32; 2]) {
        if let Some(live) = self.live.as_mut() {
            live.view.zoom_around(delta, anchor);
        }
    }

    /// Centre on a POI and open its popup.
    pub fn focus_poi(&mut self, poi: &Poi) {
        self.set_view(poi.coordinates, FOCUS_ZOOM);
        self.open_popup(&poi.id);
    }

    // --- overlay ---

    /// Draw `overlay`, replacing any previous one.
    pub fn set_overlay(&mut self, overlay: Overlay) {
        if let Some(live) = self.live.as_mut() {
            live.overlay = Some(overlay);
        }
    }

    /// Returns whether an overlay was removed.
    pub fn remove_overlay(&mut self) -> bool {
        self.live
            .as_mut()
            .and_then(|l| l.overlay.take())
            .is_some()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.live.as_ref().and_then(|l| l.overlay.as_ref())
    }

    // --- interaction ---

    /// A click on empty map at `at`.
    pub fn click_map(&mut self, at: Coordinate) -> Option<MapEvent> {
        let live = self.live.as_mut()?;
        if live.placing {
            live.placing = false;
            tracing::debug!(%at, "placement captured");
            return Some(MapEvent::CreatePoiAt(at));
        }
        live.open_popup = None;
        None
    }

    pub fn click_marker(&mut self, poi_id: &str) -> Option<MapEvent> {
        let live = self.live.as_mut()?;
        if !live.markers.iter().any(|m| m.poi_id == poi_id) {
            return None;
        }
        live.open_popup = Some(poi_id.to_string());
        Some(MapEvent::SelectPoi(poi_id.to_string()))
    }

    /// The "Get Directions" button of an open popup.
    pub fn popup_directions(&mut self) -> Option<MapEvent> {
        let id = self.open_popup_marker()?.poi_id.clone();
        Some(MapEvent::GetDirections(id))
    }
}

/// Keeps the marker layer equal to the filtered POI list.
///
/// Markers are rebuilt when the filter changes, when a POI is added (the store only grows)
/// and when the map is mounted again.
#[derive(Debug, Default)]
pub struct MarkerSync {
    shown: Option<(PoiFilter, usize, u64)>,
}

impl MarkerSync {
    /// Returns whether the markers were rebuilt.
    pub fn sync(&mut self, map: &mut MapAdapter, store: &PoiStore, filter: &PoiFilter) -> bool {
        if !map.is_mounted() {
            self.shown = None;
            return false;
        }
        let key = (filter.clone(), store.len(), map.generation);
        if self.shown.as_ref() == Some(&key) {
            return false;
        }
        let count = map.show_markers(&filter.apply(store.all()));
        tracing::trace!(count, "markers rebuilt");
        self.shown = Some(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CategoryFilter;
    use crate::poi::{Category, PoiDraft, seed_pois};

    fn mounted() -> MapAdapter {
        let mut map = MapAdapter::new(MapOptions::default());
        assert!(map.mount(Some(Surface::new(800.0, 600.0))));
        map
    }

    #[test]
    fn test_mount_without_surface_is_silent_noop() {
        let mut map = MapAdapter::new(MapOptions::default());
        assert!(!map.mount(None));
        assert!(!map.is_mounted());
        assert!(!map.mount(Some(Surface::new(0.0, 300.0))));
        assert!(map.mount(Some(Surface::new(400.0, 300.0))));
    }

    #[test]
    fn test_mount_uses_configured_view() {
        let map = mounted();
        let view = map.view().unwrap();
        assert_eq!(view.center, DEFAULT_CENTER);
        assert_eq!(view.zoom, DEFAULT_ZOOM);
        assert_eq!(map.attribution(), "© OpenStreetMap contributors");
    }

    #[test]
    fn test_operations_on_unmounted_adapter_do_nothing() {
        let mut map = MapAdapter::new(MapOptions::default());
        let pois = seed_pois();
        let refs: Vec<&Poi> = pois.iter().collect();
        assert_eq!(map.show_markers(&refs), 0);
        map.set_overlay(Overlay::direct(DEFAULT_CENTER, DEFAULT_CENTER));
        map.set_placing(true);
        assert!(map.overlay().is_none());
        assert!(!map.is_placing());
        assert_eq!(map.click_map(DEFAULT_CENTER), None);
        assert!(map.view().is_none());
    }

    #[test]
    fn test_show_markers_replaces_previous_set() {
        let mut map = mounted();
        let pois = seed_pois();
        let all: Vec<&Poi> = pois.iter().collect();
        assert_eq!(map.show_markers(&all), 7);
        let one = vec![&pois[3]];
        assert_eq!(map.show_markers(&one), 1);
        assert_eq!(map.markers()[0].poi_id, "4");
        assert_eq!(map.markers()[0].glyph, "🍽");
    }

    #[test]
    fn test_popup_closes_when_marker_filtered_away() {
        let mut map = mounted();
        let pois = seed_pois();
        let all: Vec<&Poi> = pois.iter().collect();
        map.show_markers(&all);
        assert_eq!(map.click_marker("2"), Some(MapEvent::SelectPoi("2".to_string())));
        assert_eq!(
            map.popup_directions(),
            Some(MapEvent::GetDirections("2".to_string()))
        );
        map.show_markers(&[&pois[0]]);
        assert!(map.open_popup_marker().is_none());
        assert_eq!(map.click_marker("2"), None);
    }

    #[test]
    fn test_placement_mode_captures_one_click() {
        let mut map = mounted();
        let spot = Coordinate::new(0.3481, 32.5829);
        assert_eq!(map.click_map(spot), None);
        map.set_placing(true);
        assert_eq!(map.click_map(spot), Some(MapEvent::CreatePoiAt(spot)));
        assert!(!map.is_placing());
        assert_eq!(map.click_map(spot), None);
    }

    #[test]
    fn test_at_most_one_overlay() {
        let mut map = mounted();
        map.set_overlay(Overlay::route(vec![DEFAULT_CENTER, Coordinate::new(0.348, 32.583)]));
        map.set_overlay(Overlay::direct(DEFAULT_CENTER, Coordinate::new(0.347, 32.582)));
        assert_eq!(map.overlay().unwrap().kind, OverlayKind::DirectLine);
        assert!(map.remove_overlay());
        assert!(!map.remove_overlay());
    }

    #[test]
    fn test_line_styles() {
        let route = LineStyle::route();
        assert_eq!(route.opacity, 0.8);
        assert_eq!(route.weight, 6.0);
        assert_eq!(route.dash, None);
        assert_eq!(LineStyle::direct().dash, Some([10.0, 10.0]));
    }

    #[test]
    fn test_focus_poi_zooms_in_and_opens_popup() {
        let mut map = mounted();
        let pois = seed_pois();
        map.show_markers(&pois.iter().collect::<Vec<_>>());
        map.focus_poi(&pois[4]);
        let view = map.view().unwrap();
        assert_eq!(view.zoom, FOCUS_ZOOM);
        assert_eq!(view.center, pois[4].coordinates);
        assert_eq!(map.open_popup_marker().unwrap().popup.title, "Sports Complex");
    }

    #[test]
    fn test_unmount_discards_state() {
        let mut map = mounted();
        map.set_placing(true);
        map.set_user_location(DEFAULT_CENTER);
        map.unmount();
        assert!(!map.is_placing());
        assert!(map.user_location().is_none());
        assert!(map.mount(Some(Surface::new(10.0, 10.0))));
        assert!(map.user_location().is_none());
    }

    fn marker_ids(map: &MapAdapter) -> Vec<String> {
        map.markers().iter().map(|m| m.poi_id.clone()).collect()
    }

    fn filtered_ids(store: &PoiStore, filter: &PoiFilter) -> Vec<String> {
        filter
            .apply(store.all())
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }

    #[test]
    fn test_marker_sync_follows_filter_changes() {
        let mut map = mounted();
        let store = PoiStore::seeded();
        let mut filter = PoiFilter::default();
        let mut sync = MarkerSync::default();

        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map).len(), 7);
        assert!(!sync.sync(&mut map, &store, &filter));

        filter.query = "center".to_string();
        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map), vec!["2", "6"]);

        filter.accessible_only = true;
        filter.category = CategoryFilter::Only(Category::Emergency);
        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map), filtered_ids(&store, &filter));
        assert_eq!(marker_ids(&map), vec!["6"]);
    }

    #[test]
    fn test_marker_sync_picks_up_new_pois() {
        let mut map = mounted();
        let mut store = PoiStore::seeded();
        let filter = PoiFilter::default();
        let mut sync = MarkerSync::default();
        sync.sync(&mut map, &store, &filter);

        let draft = PoiDraft {
            name: "Engineering Lab".to_string(),
            ..PoiDraft::at(Coordinate::new(0.3482, 32.5826))
        };
        let id = store.add(&draft).unwrap().id.clone();

        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map).len(), 8);
        assert_eq!(marker_ids(&map).last(), Some(&id));
    }

    #[test]
    fn test_marker_sync_rebuilds_after_remount() {
        let mut map = mounted();
        let store = PoiStore::seeded();
        let filter = PoiFilter {
            essential_only: true,
            ..PoiFilter::default()
        };
        let mut sync = MarkerSync::default();
        sync.sync(&mut map, &store, &filter);
        assert_eq!(marker_ids(&map).len(), 5);

        // Remounted without a sync call in between, as when the map leaves the screen.
        map.unmount();
        assert!(map.mount(Some(Surface::new(800.0, 600.0))));
        assert!(map.markers().is_empty());

        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map), filtered_ids(&store, &filter));
    }

    #[test]
    fn test_marker_sync_waits_for_a_mount() {
        let mut map = MapAdapter::new(MapOptions::default());
        let store = PoiStore::seeded();
        let filter = PoiFilter::default();
        let mut sync = MarkerSync::default();

        assert!(!sync.sync(&mut map, &store, &filter));
        assert!(map.mount(Some(Surface::new(800.0, 600.0))));
        assert!(sync.sync(&mut map, &store, &filter));
        assert_eq!(marker_ids(&map).len(), 7);
    }

    #[test]
    fn test_destination_marker() {
        let mut map = mounted();
        let pois = seed_pois();
        map.set_destination(&pois[4]);
        let pin = map.destination().unwrap();
        assert_eq!(pin.name, "Sports Complex");
        assert_eq!(pin.position, pois[4].coordinates);
        map.clear_destination();
        assert!(map.destination().is_none());
    }
}
