use eframe::egui::{self, Align2, Color32, RichText};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::config::Config;
use crate::coord::Coordinate;
use crate::directions::{DirectionsController, DirectionsState, Narrator, clean_instruction};
use crate::filter::{CategoryFilter, PoiFilter};
use crate::location::{GeolocationProvider, LocationError, LocationSource, locator_for};
use crate::map::adapter::LOCATE_ZOOM;
use crate::map::{self, MapAdapter, MapEvent, MapOptions, MarkerSync};
use crate::notice::{Notice, Severity};
use crate::poi::{Category, Poi, PoiDraft, PoiStore};
use crate::routing::{OsrmClient, Route, RoutingError, RoutingService};
use crate::session::{Session, SessionStore};
use crate::speech::system_synthesizer;
use crate::theme::{self, Theme};

const SIDEBAR_WIDTH: f32 = 320.0;
const TOAST_DURATION: f32 = 3.5;
const TOAST_FADE: f32 = 0.5;

struct Toast {
    notice: Notice,
    start: Instant,
}

impl Toast {
    fn new(notice: Notice) -> Self {
        Self {
            notice,
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let fade_start = TOAST_DURATION - TOAST_FADE;
        if elapsed < fade_start {
            1.0
        } else if elapsed < TOAST_DURATION {
            1.0 - (elapsed - fade_start) / TOAST_FADE
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_DURATION
    }
}

/// Answer from the routing worker thread.
struct RouteReply {
    seq: u64,
    result: Result<Route, RoutingError>,
}

/// State of the "Add New Location" dialog.
struct CreateDialog {
    draft: PoiDraft,
    error: Option<String>,
}

#[derive(Default)]
struct LoginForm {
    username: String,
    password: String,
    error: Option<String>,
}

struct CampusApp {
    theme: Theme,
    store: PoiStore,
    filter: PoiFilter,
    selected: Option<String>,
    map: MapAdapter,
    markers: MarkerSync,
    directions: DirectionsController,
    routing: Arc<dyn RoutingService>,
    route_tx: Sender<RouteReply>,
    route_rx: Receiver<RouteReply>,
    geolocation: GeolocationProvider,
    location_rx: Option<Receiver<Result<Coordinate, LocationError>>>,
    session_store: Option<SessionStore>,
    session: Option<Session>,
    login: LoginForm,
    dialog: Option<CreateDialog>,
    toast: Option<Toast>,
}

impl CampusApp {
    fn new(ctx: &egui::Context, config: &Config, device: Option<Coordinate>, voice: bool) -> Self {
        let routing = config.routing_settings();
        let client = OsrmClient::new(&routing.url, &routing.profile, routing.timeout);
        let narrator = Narrator::new(
            system_synthesizer(config.voice_command()),
            config.voice_settings(),
            voice,
        );

        let session_store = match SessionStore::open() {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(error = %e, "sessions will not be remembered");
                None
            }
        };

        ctx.set_visuals(egui::Visuals::light());
        let mut app = Self::with_services(
            narrator,
            Arc::new(client),
            session_store,
            config.map_options(),
        );
        app.session = app.session_store.as_ref().and_then(|s| s.load());
        app.start_locating(ctx, device);
        app
    }

    /// Everything except the window, the stored session and the locator thread.
    fn with_services(
        narrator: Narrator,
        routing: Arc<dyn RoutingService>,
        session_store: Option<SessionStore>,
        map_options: MapOptions,
    ) -> Self {
        let (route_tx, route_rx) = mpsc::channel();
        Self {
            theme: Theme::light(),
            store: PoiStore::seeded(),
            filter: PoiFilter::default(),
            selected: None,
            map: MapAdapter::new(map_options),
            markers: MarkerSync::default(),
            directions: DirectionsController::new(narrator),
            routing,
            route_tx,
            route_rx,
            geolocation: GeolocationProvider::default(),
            location_rx: None,
            session_store,
            session: None,
            login: LoginForm::default(),
            dialog: None,
            toast: None,
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.toast = Some(Toast::new(notice));
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.theme = self.theme.toggled();
        ctx.set_visuals(if self.theme.name == "dark" {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
    }

    // --- geolocation ---

    fn start_locating(&mut self, ctx: &egui::Context, device: Option<Coordinate>) {
        let locator = locator_for(device);
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(locator.locate());
            ctx.request_repaint();
        });
        self.location_rx = Some(rx);
    }

    fn poll_location(&mut self) {
        let Some(rx) = &self.location_rx else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => Err(LocationError::Unavailable(
                "locator stopped without an answer".to_string(),
            )),
        };
        self.location_rx = None;
        let (coordinate, notice) = self.geolocation.resolve(outcome);
        self.map.set_user_location(coordinate);
        if let Some(notice) = notice {
            self.notify(notice);
        }
    }

    fn recenter_on_user(&mut self) {
        match self.geolocation.require() {
            Ok(at) => self.map.set_view(at, LOCATE_ZOOM),
            Err(e) => self.notify(Notice::error("Location", e.to_string())),
        }
    }

    // --- directions ---

    fn request_directions(&mut self, ctx: &egui::Context, poi_id: &str) {
        let Some(poi) = self.store.get(poi_id).cloned() else {
            return;
        };
        self.selected = Some(poi.id.clone());
        self.map.close_popup();

        let ticket = match self
            .directions
            .begin(&poi, self.geolocation.current(), &mut self.map)
        {
            Ok(ticket) => ticket,
            Err(e) => {
                self.notify(Notice::error("Directions", e.to_string()));
                return;
            }
        };

        let routing = Arc::clone(&self.routing);
        let tx = self.route_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = routing.route(ticket.origin, ticket.destination);
            if tx.send(RouteReply { seq: ticket.seq, result }).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    fn poll_routes(&mut self) {
        while let Ok(reply) = self.route_rx.try_recv() {
            if let Some(notice) = self
                .directions
                .complete(reply.seq, reply.result, &mut self.map)
            {
                self.notify(notice);
            }
        }
    }

    fn back_to_map(&mut self) {
        self.directions.clear(&mut self.map);
    }

    // --- POIs ---

    /// Picking a POI, from the list or a marker, ends any directions in progress.
    fn select_poi(&mut self, poi_id: &str) {
        self.directions.clear(&mut self.map);
        if self.store.get(poi_id).is_some() {
            self.selected = Some(poi_id.to_string());
        }
    }

    fn select_from_list(&mut self, poi_id: &str) {
        self.select_poi(poi_id);
        if let Some(poi) = self.store.get(poi_id) {
            self.map.focus_poi(poi);
        }
    }

    fn sync_markers(&mut self) {
        self.markers.sync(&mut self.map, &self.store, &self.filter);
    }

    fn handle_map_event(&mut self, ctx: &egui::Context, event: MapEvent) {
        match event {
            MapEvent::SelectPoi(id) => self.select_poi(&id),
            MapEvent::GetDirections(id) => self.request_directions(ctx, &id),
            MapEvent::CreatePoiAt(at) => {
                self.dialog = Some(CreateDialog {
                    draft: PoiDraft::at(at),
                    error: None,
                });
            }
        }
    }

    fn toggle_placement(&mut self) {
        let placing = !self.map.is_placing();
        self.map.set_placing(placing);
        if placing {
            self.dialog = None;
        }
    }

    fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        match self.store.add(&dialog.draft) {
            Ok(poi) => {
                let (id, name) = (poi.id.clone(), poi.name.clone());
                self.dialog = None;
                self.selected = Some(id);
                self.notify(Notice::success("Location added", format!("{name} is on the map")));
            }
            Err(e) => {
                dialog.error = Some(match e {
                    crate::error::NavError::MalformedPoiInput(reason) => reason,
                    other => other.to_string(),
                });
            }
        }
    }

    // --- session ---

    fn sign_in(&mut self) {
        let form = &mut self.login;
        let result = match &self.session_store {
            Some(store) => store.login(&form.username, &form.password),
            None => Err(anyhow::anyhow!("No data directory available for the session")),
        };
        match result {
            Ok(session) => {
                tracing::info!(user = %session.username, "signed in");
                self.session = Some(session);
                self.login = LoginForm::default();
            }
            Err(e) => form.error = Some(e.to_string()),
        }
    }

    fn sign_out(&mut self) {
        if let Some(store) = &self.session_store {
            if let Err(e) = store.logout() {
                tracing::warn!(error = %e, "could not remove stored session");
            }
        }
        self.session = None;
        self.back_to_map();
        self.selected = None;
        self.dialog = None;
        self.map.unmount();
    }
}

impl eframe::App for CampusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_location();
        self.poll_routes();

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        if self.session.is_none() {
            self.draw_login(ctx);
            return;
        }

        if !ctx.wants_keyboard_input() {
            let (escape, theme) =
                ctx.input(|i| (i.key_pressed(egui::Key::Escape), i.key_pressed(egui::Key::D)));
            if escape {
                if self.dialog.is_some() {
                    self.dialog = None;
                } else if self.map.is_placing() {
                    self.map.set_placing(false);
                } else {
                    self.back_to_map();
                }
            }
            if theme {
                self.toggle_theme(ctx);
            }
        }

        self.draw_sidebar(ctx);
        if let DirectionsState::RouteFound { route, destination } = self.directions.state() {
            let (route, destination) = (route.clone(), destination.clone());
            draw_steps_panel(ctx, &self.theme, &destination, &route);
        }

        let mut event = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.theme.background).inner_margin(0.0))
            .show(ctx, |ui| {
                if !self.directions.state().is_idle() {
                    self.draw_directions_header(ui);
                }

                let was_mounted = self.map.is_mounted();
                self.sync_markers();
                let map_rect = ui.available_rect_before_wrap();
                event = map::render::show(&mut self.map, ui, &self.theme);
                if !was_mounted && self.map.is_mounted() {
                    if let Some(at) = self.geolocation.current() {
                        self.map.set_user_location(at);
                    }
                    self.sync_markers();
                    ctx.request_repaint();
                }

                self.draw_map_controls(ctx, map_rect);
                self.draw_selected_panel(ctx, map_rect);
                if let Some(toast) = &self.toast {
                    draw_toast(ui, &self.theme, toast, map_rect);
                    ctx.request_repaint();
                }
            });

        if let Some(event) = event {
            self.handle_map_event(ctx, event);
        }
        self.draw_create_dialog(ctx);
    }
}

impl CampusApp {
    fn draw_login(&mut self, ctx: &egui::Context) {
        let mut submit = false;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.theme.background))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.25);
                    ui.label(
                        RichText::new("📍 Campus Compass")
                            .size(self.theme.heading_size * 1.5)
                            .strong(),
                    );
                    ui.label(
                        RichText::new("Sign in to explore the campus").color(self.theme.muted),
                    );
                    ui.add_space(16.0);
                    ui.add(
                        egui::TextEdit::singleline(&mut self.login.username)
                            .hint_text("Username")
                            .desired_width(260.0),
                    );
                    let password = ui.add(
                        egui::TextEdit::singleline(&mut self.login.password)
                            .hint_text("Password")
                            .password(true)
                            .desired_width(260.0),
                    );
                    if password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit = true;
                    }
                    if let Some(error) = &self.login.error {
                        ui.colored_label(Color32::from_rgb(0xDC, 0x26, 0x26), error);
                    }
                    ui.add_space(8.0);
                    if ui.button("Sign In").clicked() {
                        submit = true;
                    }
                });
            });
        if submit {
            self.sign_in();
        }
    }

    fn draw_sidebar(&mut self, ctx: &egui::Context) {
        let mut clicked: Option<String> = None;
        let mut sign_out = false;
        let mut toggle_placement = false;

        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(SIDEBAR_WIDTH)
            .frame(egui::Frame::new().fill(self.theme.panel).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("📍 Campus Compass")
                            .size(self.theme.heading_size)
                            .strong(),
                    );
                });
                if let Some(session) = &self.session {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("Signed in as {}", session.username))
                                .color(self.theme.muted)
                                .size(self.theme.small_size),
                        );
                        if ui.small_button("Log out").clicked() {
                            sign_out = true;
                        }
                    });
                }
                ui.add_space(8.0);

                ui.add(
                    egui::TextEdit::singleline(&mut self.filter.query)
                        .hint_text("🔍 Search locations...")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(4.0);
                ui.checkbox(&mut self.filter.essential_only, "★ Essential only");
                ui.checkbox(&mut self.filter.accessible_only, "♿ Accessible only");
                ui.add_space(6.0);

                egui::Grid::new("categories")
                    .num_columns(2)
                    .spacing([6.0, 6.0])
                    .show(ui, |ui| {
                        for (i, choice) in CategoryFilter::choices().into_iter().enumerate() {
                            let label = format!("{} {}", choice.icon(), choice.display_name());
                            if ui
                                .selectable_label(self.filter.category == choice, label)
                                .clicked()
                            {
                                self.filter.category = choice;
                            }
                            if i % 2 == 1 {
                                ui.end_row();
                            }
                        }
                    });
                ui.add_space(8.0);

                let placing = self.map.is_placing();
                let add_label = if placing {
                    "✕ Cancel placement"
                } else {
                    "➕ Add Location"
                };
                if ui.button(add_label).clicked() {
                    toggle_placement = true;
                }
                let mut voice = self.directions.narration_enabled();
                if ui.checkbox(&mut voice, "🔊 Voice guidance").changed() {
                    self.directions.set_narration(voice);
                }
                ui.separator();

                let shown = self.filter.apply(self.store.all());
                ui.label(
                    RichText::new(format!("{} locations", shown.len()))
                        .color(self.theme.muted)
                        .size(self.theme.small_size),
                );
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if shown.is_empty() {
                        ui.label(RichText::new("No locations match these filters.").italics());
                    }
                    for poi in shown {
                        let selected = self.selected.as_deref() == Some(poi.id.as_str());
                        if poi_card(ui, &self.theme, poi, selected).clicked() {
                            clicked = Some(poi.id.clone());
                        }
                    }
                });
            });

        if let Some(id) = clicked {
            self.select_from_list(&id);
        }
        if toggle_placement {
            self.toggle_placement();
        }
        if sign_out {
            self.sign_out();
        }
    }

    fn draw_directions_header(&mut self, ui: &mut egui::Ui) {
        let state = self.directions.state().clone();
        let Some(destination) = state.destination() else {
            return;
        };
        let status = match &state {
            DirectionsState::Requesting { .. } => "Finding route…".to_string(),
            DirectionsState::RouteFound { route, .. } => format!(
                "{:.1} km · about {} min",
                route.distance_km(),
                route.duration_min()
            ),
            DirectionsState::RouteError { .. } => "Direct line shown".to_string(),
            DirectionsState::Idle => String::new(),
        };

        let mut back = false;
        egui::Frame::new()
            .fill(self.theme.panel)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("← Back to Map").clicked() {
                        back = true;
                    }
                    ui.label(
                        RichText::new(format!("Directions to {}", destination.name))
                            .strong()
                            .size(self.theme.body_size + 2.0),
                    );
                    ui.label(RichText::new(status).color(self.theme.muted));
                });
            });
        if back {
            self.back_to_map();
        }
    }

    fn draw_map_controls(&mut self, ctx: &egui::Context, map_rect: egui::Rect) {
        let mut locate = false;
        let hint = match self.geolocation.fix().map(|f| f.source) {
            Some(LocationSource::Device) => "Centre the map on your position",
            Some(LocationSource::Fallback) => "Your position is unknown, using the campus centre",
            None => "Still locating you",
        };
        egui::Area::new(egui::Id::new("map-controls"))
            .order(egui::Order::Foreground)
            .fixed_pos(map_rect.right_top() + egui::vec2(-140.0, 10.0))
            .show(ctx, |ui| {
                if ui.button("◎ My Location").on_hover_text(hint).clicked() {
                    locate = true;
                }
            });
        if locate {
            self.recenter_on_user();
        }
    }

    fn draw_selected_panel(&mut self, ctx: &egui::Context, map_rect: egui::Rect) {
        if !self.directions.state().is_idle() {
            return;
        }
        let Some(poi) = self
            .selected
            .as_deref()
            .and_then(|id| self.store.get(id))
            .cloned()
        else {
            return;
        };

        let mut directions = false;
        let mut close = false;
        egui::Area::new(egui::Id::new("selected-poi"))
            .order(egui::Order::Foreground)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(map_rect.center_bottom() - egui::vec2(0.0, 36.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(360.0);
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(poi.category.icon())
                                .color(theme::category_color(poi.category))
                                .size(22.0),
                        );
                        ui.label(
                            RichText::new(&poi.name)
                                .strong()
                                .size(self.theme.body_size + 2.0),
                        );
                        if ui.small_button("✕").clicked() {
                            close = true;
                        }
                    });
                    if !poi.description.is_empty() {
                        ui.label(&poi.description);
                    }
                    if let Some(hours) = &poi.hours {
                        ui.label(RichText::new(format!("🕒 {hours}")).color(self.theme.muted));
                    }
                    if ui.button("🧭 Get Directions").clicked() {
                        directions = true;
                    }
                });
            });

        if close {
            self.selected = None;
            self.map.close_popup();
        }
        if directions {
            self.request_directions(ctx, &poi.id);
        }
    }

    fn draw_create_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Add New Location")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Name");
                ui.add(
                    egui::TextEdit::singleline(&mut dialog.draft.name)
                        .hint_text("e.g. Engineering Lab")
                        .desired_width(280.0),
                );
                ui.label("Description");
                ui.add(
                    egui::TextEdit::multiline(&mut dialog.draft.description)
                        .desired_rows(3)
                        .desired_width(280.0),
                );
                egui::ComboBox::from_label("Category")
                    .selected_text(dialog.draft.category.display_name())
                    .show_ui(ui, |ui| {
                        for category in Category::all() {
                            ui.selectable_value(
                                &mut dialog.draft.category,
                                *category,
                                format!("{} {}", category.icon(), category.display_name()),
                            );
                        }
                    });
                if let Some(at) = dialog.draft.location {
                    ui.label(RichText::new(format!("📍 {at}")).small());
                }
                if let Some(error) = &dialog.error {
                    ui.colored_label(Color32::from_rgb(0xDC, 0x26, 0x26), error);
                }
                ui.horizontal(|ui| {
                    if ui.button("Add Location").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });
        if cancel {
            self.dialog = None;
        } else if submit {
            self.submit_dialog();
        }
    }
}

fn poi_card(ui: &mut egui::Ui, theme: &Theme, poi: &Poi, selected: bool) -> egui::Response {
    let fill = if selected {
        theme.card_selected
    } else {
        theme.card
    };
    let response = egui::Frame::new()
        .fill(fill)
        .corner_radius(6.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(poi.category.icon())
                        .color(theme::category_color(poi.category))
                        .size(18.0),
                );
                ui.vertical(|ui| {
                    ui.label(RichText::new(&poi.name).strong());
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(poi.category.display_name())
                                .color(theme.muted)
                                .size(theme.small_size),
                        );
                        if poi.is_essential {
                            ui.label(RichText::new("★").color(theme::ESSENTIAL_BADGE));
                        }
                        if poi.is_accessible {
                            ui.label(RichText::new("♿").color(theme::ACCESSIBLE_BADGE));
                        }
                    });
                });
            });
        })
        .response
        .interact(egui::Sense::click());
    ui.add_space(4.0);
    response
}

fn draw_steps_panel(ctx: &egui::Context, theme: &Theme, destination: &Poi, route: &Route) {
    egui::SidePanel::right("route-steps")
        .resizable(true)
        .default_width(260.0)
        .frame(egui::Frame::new().fill(theme.panel).inner_margin(12.0))
        .show(ctx, |ui| {
            ui.label(RichText::new(&destination.name).strong().size(theme.body_size + 2.0));
            ui.label(
                RichText::new(format!(
                    "{:.1} km · about {} min",
                    route.distance_km(),
                    route.duration_min()
                ))
                .color(theme.muted),
            );
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                let steps = route
                    .steps
                    .iter()
                    .map(|s| (clean_instruction(&s.instruction), s.distance_m))
                    .filter(|(text, _)| !text.is_empty());
                for (i, (text, metres)) in steps.enumerate() {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(RichText::new(format!("{}.", i + 1)).color(theme.muted));
                        ui.label(text);
                        if metres > 0.0 {
                            ui.label(
                                RichText::new(crate::commands::directions::format_distance(metres))
                                    .color(theme.muted)
                                    .size(theme.small_size),
                            );
                        }
                    });
                }
            });
        });
}

fn draw_toast(ui: &egui::Ui, theme: &Theme, toast: &Toast, area: egui::Rect) {
    let opacity = toast.opacity();
    if opacity <= 0.0 {
        return;
    }
    let accent = match toast.notice.severity {
        Severity::Success => theme::ACCESSIBLE_BADGE,
        Severity::Error => Color32::from_rgb(0xDC, 0x26, 0x26),
        Severity::Info => theme.accent,
    };
    let text = format!("{}\n{}", toast.notice.title, toast.notice.message);
    let text_color = Theme::with_opacity(theme.foreground, opacity);
    let galley = ui.painter().layout(
        text,
        egui::FontId::proportional(theme.body_size),
        text_color,
        360.0,
    );
    let padding = 12.0;
    let size = galley.size() + egui::vec2(padding * 2.0 + 4.0, padding * 2.0);
    let rect = egui::Rect::from_min_size(
        egui::pos2(area.right() - size.x - 16.0, area.bottom() - size.y - 40.0),
        size,
    );
    ui.painter()
        .rect_filled(rect, 8.0, Theme::with_opacity(theme.panel, opacity * 0.95));
    let bar = egui::Rect::from_min_size(rect.min, egui::vec2(4.0, rect.height()));
    ui.painter()
        .rect_filled(bar, 2.0, Theme::with_opacity(accent, opacity));
    ui.painter().galley(
        rect.min + egui::vec2(padding + 4.0, padding),
        galley,
        text_color,
    );
}

pub fn run(windowed: bool, location: Option<Coordinate>, voice: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let device = location.or(config.device_location());
    let voice = voice && config.voice_enabled();
    let title = "Campus Compass";

    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(title)
    } else {
        egui::ViewportBuilder::default()
            .with_maximized(true)
            .with_title(title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(move |cc| Ok(Box::new(CampusApp::new(&cc.egui_ctx, &config, device, voice)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::map::adapter::Surface;
    use crate::speech::{SilentSpeech, VoiceSettings};

    /// Answers every request with a straight two-point route.
    struct InstantRouter;

    impl RoutingService for InstantRouter {
        fn route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<Route, RoutingError> {
            Ok(Route {
                path: vec![origin, destination],
                steps: vec![],
                distance_m: 100.0,
                duration_s: 60.0,
            })
        }
    }

    fn signed_in_app() -> CampusApp {
        let narrator = Narrator::new(Box::new(SilentSpeech), VoiceSettings::default(), false);
        let mut app = CampusApp::with_services(
            narrator,
            Arc::new(InstantRouter),
            None,
            MapOptions::default(),
        );
        app.geolocation.resolve(Ok(Coordinate::new(0.3475, 32.5823)));
        assert!(app.map.mount(Some(Surface::new(800.0, 600.0))));
        if let Some(at) = app.geolocation.current() {
            app.map.set_user_location(at);
        }
        app.sync_markers();
        app
    }

    fn wait_for_route(app: &mut CampusApp) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while matches!(app.directions.state(), DirectionsState::Requesting { .. }) {
            assert!(Instant::now() < deadline, "route never arrived");
            std::thread::sleep(Duration::from_millis(5));
            app.poll_routes();
        }
    }

    #[test]
    fn test_marker_click_clears_directions() {
        let ctx = egui::Context::default();
        let mut app = signed_in_app();

        app.request_directions(&ctx, "1");
        wait_for_route(&mut app);
        assert!(matches!(app.directions.state(), DirectionsState::RouteFound { .. }));
        assert!(app.map.overlay().is_some());
        assert!(app.map.destination().is_some());

        let event = app.map.click_marker("5").unwrap();
        app.handle_map_event(&ctx, event);

        assert!(app.directions.state().is_idle());
        assert!(app.map.overlay().is_none());
        assert!(app.map.destination().is_none());
        assert_eq!(app.selected.as_deref(), Some("5"));
    }

    #[test]
    fn test_list_selection_clears_directions() {
        let ctx = egui::Context::default();
        let mut app = signed_in_app();

        app.request_directions(&ctx, "6");
        wait_for_route(&mut app);
        assert!(app.map.overlay().is_some());

        app.select_from_list("3");

        assert!(app.directions.state().is_idle());
        assert!(app.map.overlay().is_none());
        assert_eq!(app.selected.as_deref(), Some("3"));
    }

    #[test]
    fn test_selecting_unknown_poi_keeps_selection() {
        let mut app = signed_in_app();
        app.select_poi("2");
        app.select_poi("missing");
        assert_eq!(app.selected.as_deref(), Some("2"));
    }

    #[test]
    fn test_markers_follow_sidebar_filter() {
        let mut app = signed_in_app();
        assert_eq!(app.map.markers().len(), 7);

        app.filter.essential_only = true;
        app.sync_markers();
        assert_eq!(app.map.markers().len(), 5);

        app.sign_out();
        assert!(!app.map.is_mounted());
        assert!(app.map.mount(Some(Surface::new(800.0, 600.0))));
        app.sync_markers();
        assert_eq!(app.map.markers().len(), 5);
    }
}
