use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2, pos2, vec2,
};

use super::adapter::{MapAdapter, MapEvent, Overlay, PoiMarker, Surface};
use super::projection::{MapView, TILE_SIZE};
use crate::theme::{self, Theme};

const MARKER_RADIUS: f32 = 13.0;
const HIT_RADIUS: f32 = 16.0;
const SCROLL_STEP: f32 = 60.0;
const PLACEHOLDER: Color32 = Color32::from_rgb(0xE5, 0xE7, 0xEB);

fn to_screen(view: &MapView, origin: Pos2, c: crate::coord::Coordinate) -> Pos2 {
    let [x, y] = view.to_screen(c);
    origin + vec2(x, y)
}

/// Draw the mounted map into the remaining space of `ui` and translate input into view
/// changes and [`MapEvent`]s.
pub fn show(map: &mut MapAdapter, ui: &mut egui::Ui, theme: &Theme) -> Option<MapEvent> {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    if !map.mount(Some(Surface::new(rect.width(), rect.height()))) {
        return None;
    }

    handle_gestures(map, ui, &response, rect);

    let painter = ui.painter_at(rect);
    paint_tiles(map, ui.ctx(), &painter, rect);

    let Some(view) = map.view().copied() else {
        return None;
    };

    if let Some(overlay) = map.overlay() {
        paint_overlay(&painter, &view, rect.min, overlay);
    }

    let hover = response.hover_pos();
    if let Some(pin) = map.destination() {
        let at = to_screen(&view, rect.min, pin.position);
        paint_destination(&painter, at);
        if hover.is_some_and(|h| h.distance(at) <= HIT_RADIUS) {
            painter.text(
                at - vec2(0.0, MARKER_RADIUS + 20.0),
                Align2::CENTER_BOTTOM,
                &pin.name,
                FontId::proportional(12.0),
                theme.foreground,
            );
        }
    }

    let mut hovered_marker: Option<String> = None;
    for marker in map.markers() {
        let at = to_screen(&view, rect.min, marker.position);
        if !rect.expand(MARKER_RADIUS).contains(at) {
            continue;
        }
        paint_marker(&painter, at, marker);
        if hover.is_some_and(|h| h.distance(at) <= HIT_RADIUS) {
            hovered_marker = Some(marker.poi_id.clone());
        }
    }

    if let Some(user) = map.user_location() {
        let at = to_screen(&view, rect.min, user);
        painter.circle_filled(at, 14.0, Theme::with_opacity(theme::USER_MARKER_COLOR, 0.2));
        painter.circle(at, 7.0, theme::USER_MARKER_COLOR, Stroke::new(2.5, Color32::WHITE));
        if hover.is_some_and(|h| h.distance(at) <= 10.0) {
            painter.text(
                at - vec2(0.0, 16.0),
                Align2::CENTER_BOTTOM,
                "You are here",
                FontId::proportional(12.0),
                theme.foreground,
            );
        }
    }

    paint_attribution(&painter, rect, map.attribution());

    let mut event = None;
    if map.is_placing() {
        ui.ctx().set_cursor_icon(CursorIcon::Crosshair);
        paint_banner(&painter, rect, "Click on the map to place the new location");
    } else if hovered_marker.is_some() {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            event = match hovered_marker.filter(|_| !map.is_placing()) {
                Some(id) => map.click_marker(&id),
                None => {
                    let local = pos - rect.min;
                    map.click_map(view.from_screen([local.x, local.y]))
                }
            };
        }
    }

    if let Some(popup_event) = show_popup(map, ui.ctx(), &view, rect, theme) {
        event = Some(popup_event);
    }

    zoom_buttons(map, ui, rect);

    event
}

fn handle_gestures(map: &mut MapAdapter, ui: &egui::Ui, response: &egui::Response, rect: Rect) {
    if response.dragged() {
        let delta = response.drag_delta();
        map.pan(delta.x, delta.y);
    }

    if !response.hovered() {
        return;
    }
    let scroll = ui.input(|i| i.raw_scroll_delta.y);
    if scroll == 0.0 {
        return;
    }
    let id = response.id.with("scroll");
    let total = ui.data_mut(|d| {
        let acc = d.get_temp_mut_or_default::<f32>(id);
        *acc += scroll;
        *acc
    });
    if total.abs() < SCROLL_STEP {
        return;
    }
    ui.data_mut(|d| d.insert_temp(id, 0.0f32));
    let anchor = response
        .hover_pos()
        .map(|p| p - rect.min)
        .unwrap_or(rect.size() / 2.0);
    map.zoom_around(if total > 0.0 { 1 } else { -1 }, [anchor.x, anchor.y]);
}

fn paint_tiles(map: &mut MapAdapter, ctx: &egui::Context, painter: &egui::Painter, rect: Rect) {
    let Some(live) = map.live_mut() else {
        return;
    };
    let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
    let size = Vec2::splat(TILE_SIZE as f32);
    for (id, [x, y]) in live.view.visible_tiles() {
        let tile_rect = Rect::from_min_size(rect.min + vec2(x, y), size);
        match live.tiles.get(ctx, id) {
            Some(texture) => {
                painter.image(texture, tile_rect, uv, Color32::WHITE);
            }
            None => {
                painter.rect_filled(tile_rect.shrink(0.5), 0.0, PLACEHOLDER);
            }
        }
    }
    if live.tiles.in_flight() > 0 {
        tracing::trace!(
            cached = live.tiles.len(),
            in_flight = live.tiles.in_flight(),
            "waiting for tiles"
        );
    }
}

fn paint_overlay(painter: &egui::Painter, view: &MapView, origin: Pos2, overlay: &Overlay) {
    let points: Vec<Pos2> = overlay
        .path
        .iter()
        .map(|c| to_screen(view, origin, *c))
        .collect();
    let style = &overlay.style;
    let stroke = Stroke::new(style.weight, Theme::with_opacity(style.color, style.opacity));
    match style.dash {
        Some([dash, gap]) => painter.extend(Shape::dashed_line(&points, stroke, dash, gap)),
        None => {
            painter.add(Shape::line(points, stroke));
        }
    }
}

fn paint_marker(painter: &egui::Painter, at: Pos2, marker: &PoiMarker) {
    painter.circle(at, MARKER_RADIUS, marker.color, Stroke::new(2.0, Color32::WHITE));
    painter.text(
        at,
        Align2::CENTER_CENTER,
        marker.glyph,
        FontId::proportional(13.0),
        Color32::WHITE,
    );
    if marker.essential {
        let badge = at + vec2(MARKER_RADIUS * 0.75, -MARKER_RADIUS * 0.75);
        painter.circle(badge, 4.5, theme::ESSENTIAL_BADGE, Stroke::new(1.0, Color32::WHITE));
    }
}

/// Teardrop pin with its tip on `at`, drawn under the POI markers.
fn paint_destination(painter: &egui::Painter, at: Pos2) {
    let head = at - vec2(0.0, MARKER_RADIUS + 6.0);
    let tip = vec![head + vec2(-8.0, 4.0), head + vec2(8.0, 4.0), at];
    painter.add(Shape::convex_polygon(tip, theme::DESTINATION_COLOR, Stroke::NONE));
    painter.circle(head, 10.0, theme::DESTINATION_COLOR, Stroke::new(2.0, Color32::WHITE));
    painter.circle_filled(head, 3.5, Color32::WHITE);
}

fn paint_attribution(painter: &egui::Painter, rect: Rect, text: &str) {
    let font = FontId::proportional(11.0);
    let galley = painter.layout_no_wrap(text.to_string(), font, Color32::from_gray(60));
    let min = rect.right_bottom() - galley.size() - vec2(8.0, 4.0);
    let bg = Rect::from_min_size(min - vec2(4.0, 2.0), galley.size() + vec2(8.0, 4.0));
    painter.rect_filled(bg, 2.0, Theme::with_opacity(Color32::WHITE, 0.75));
    painter.galley(min, galley, Color32::from_gray(60));
}

fn paint_banner(painter: &egui::Painter, rect: Rect, text: &str) {
    let galley =
        painter.layout_no_wrap(text.to_string(), FontId::proportional(14.0), Color32::WHITE);
    let min = pos2(rect.center().x - galley.size().x / 2.0, rect.top() + 12.0);
    let bg = Rect::from_min_size(min - vec2(10.0, 6.0), galley.size() + vec2(20.0, 12.0));
    painter.rect_filled(bg, 6.0, Theme::with_opacity(theme::ROUTE_COLOR, 0.9));
    painter.galley(min, galley, Color32::WHITE);
}

fn show_popup(
    map: &mut MapAdapter,
    ctx: &egui::Context,
    view: &MapView,
    rect: Rect,
    theme: &Theme,
) -> Option<MapEvent> {
    let marker = map.open_popup_marker()?.clone();
    let anchor = to_screen(view, rect.min, marker.position);
    if !rect.contains(anchor) {
        return None;
    }

    let mut directions = false;
    let mut close = false;
    egui::Area::new(egui::Id::new("poi-popup").with(&marker.poi_id))
        .order(egui::Order::Foreground)
        .fixed_pos(anchor + vec2(MARKER_RADIUS + 4.0, -MARKER_RADIUS))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(240.0);
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&marker.popup.title)
                            .strong()
                            .size(theme.body_size + 1.0),
                    );
                    if ui.small_button("✕").clicked() {
                        close = true;
                    }
                });
                ui.label(
                    egui::RichText::new(marker.popup.category)
                        .color(marker.color)
                        .size(theme.small_size),
                );
                if !marker.popup.description.is_empty() {
                    ui.label(&marker.popup.description);
                }
                if let Some(hours) = &marker.popup.hours {
                    ui.label(format!("🕒 {hours}"));
                }
                if let Some(floor) = &marker.popup.floor {
                    ui.label(format!("Floor: {floor}"));
                }
                ui.horizontal(|ui| {
                    if marker.popup.essential {
                        ui.colored_label(theme::ESSENTIAL_BADGE, "★ Essential");
                    }
                    if marker.popup.accessible {
                        ui.colored_label(theme::ACCESSIBLE_BADGE, "♿ Accessible");
                    }
                });
                if ui.button("Get Directions").clicked() {
                    directions = true;
                }
            });
        });

    if close {
        map.close_popup();
        return None;
    }
    if directions {
        return map.popup_directions();
    }
    None
}

fn zoom_buttons(map: &mut MapAdapter, ui: &mut egui::Ui, rect: Rect) {
    let size = vec2(28.0, 28.0);
    let plus = Rect::from_min_size(rect.left_top() + vec2(10.0, 10.0), size);
    let minus = Rect::from_min_size(plus.left_bottom() + vec2(0.0, 4.0), size);
    let center = [rect.width() / 2.0, rect.height() / 2.0];

    let zoom_in = ui.put(plus, egui::Button::new("+")).clicked();
    let zoom_out = ui.put(minus, egui::Button::new("−")).clicked();
    if zoom_in {
        map.zoom_around(1, center);
    } else if zoom_out {
        map.zoom_around(-1, center);
    }
}
