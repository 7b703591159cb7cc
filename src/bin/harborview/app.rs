use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui;
use serde::{Deserialize, Serialize};

use harborview::batch::MonthCode;
use harborview::dashboard::{Dashboard, DashboardEntry, EntryKind, Payload};
use harborview::dataflow::BackgroundSlot;
use harborview::explore::{CargoView, Explorer, HeatmapRequest, HeatmapView, NetworkView};
use harborview::filter::{VesselCategory, VESSEL_TYPE_LABELS};
use harborview::locations::LocationType;
use harborview::pivot::MetricKind;
use harborview::storage::FileStorage;
use harborview::themes::HeatScale;
use harborview::trend::{TrendGrid, TrendLine};
use harborview::widgets::{self, Heatmap, NetworkGraph};
use harborview::{Config, HttpBackend};

const APP_KEY: &str = "harborview";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum View {
    #[default]
    Explore,
    Dashboard,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum GraphPanel {
    #[default]
    Cargo,
    Fish,
}

/// Control selections, restored across sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Selections {
    view: View,
    month: String,
    metric: MetricKind,
    category: VesselCategory,
    vessel_labels: Vec<String>,
    location_types: Vec<LocationType>,
    graph_panel: GraphPanel,
    cargo_location: Option<String>,
    fish_month: Option<String>,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            view: View::default(),
            month: MonthCode::default().code(),
            metric: MetricKind::default(),
            category: VesselCategory::default(),
            vessel_labels: Vec::new(),
            location_types: vec![LocationType::default()],
            graph_panel: GraphPanel::default(),
            cargo_location: None,
            fish_month: None,
        }
    }
}

impl Selections {
    fn heatmap_request(&self) -> HeatmapRequest {
        HeatmapRequest {
            month: self.month.clone(),
            metric: self.metric,
            category: self.category,
            vessel_labels: self.vessel_labels.clone(),
            location_types: self
                .location_types
                .iter()
                .map(|kind| kind.label().to_owned())
                .collect(),
        }
    }
}

/// Parameters the currently shown graph was fetched for.
#[derive(Clone, Debug, PartialEq)]
enum GraphKey {
    Cargo(String, Option<String>),
    Fish(Option<String>),
}

pub struct HarborviewApp {
    explorer: Arc<Explorer<HttpBackend>>,
    dashboard: Dashboard,
    selections: Selections,
    heatmap: BackgroundSlot<HeatmapView>,
    trend_line: BackgroundSlot<TrendLine>,
    trend_grid: BackgroundSlot<TrendGrid>,
    cargo: BackgroundSlot<CargoView>,
    fish: BackgroundSlot<NetworkView>,
    issued_heatmap: Option<HeatmapRequest>,
    issued_trend_month: Option<String>,
    issued_graph: Option<GraphKey>,
    highlight: Option<String>,
    pinned_highlights: HashMap<usize, Option<String>>,
    notice: Option<String>,
}

impl HarborviewApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> harborview::Result<Self> {
        let backend = HttpBackend::from_config(&config)?;
        let explorer = Arc::new(Explorer::new(backend).with_year(config.year));
        let dashboard = Dashboard::open(FileStorage::new(config.state_dir.clone()))?;
        let selections = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, APP_KEY))
            .unwrap_or_default();

        let mut app = Self {
            explorer,
            dashboard,
            selections,
            heatmap: BackgroundSlot::new(),
            trend_line: BackgroundSlot::new(),
            trend_grid: BackgroundSlot::new(),
            cargo: BackgroundSlot::new(),
            fish: BackgroundSlot::new(),
            issued_heatmap: None,
            issued_trend_month: None,
            issued_graph: None,
            highlight: None,
            pinned_highlights: HashMap::new(),
            notice: None,
        };
        let explorer = app.explorer.clone();
        app.trend_grid.spawn(move || explorer.trend_grid());
        Ok(app)
    }

    /// Starts fetches for whatever selection changed since the last frame.
    /// Invalid selections are reported and never fetched.
    fn refresh(&mut self) {
        let request = self.selections.heatmap_request();
        if self.issued_heatmap.as_ref() != Some(&request) {
            self.issued_heatmap = Some(request.clone());
            match request.validate(self.explorer.year()) {
                Ok(_) => {
                    self.notice = None;
                    let explorer = self.explorer.clone();
                    self.heatmap.spawn(move || explorer.heatmap(&request));
                }
                Err(err) => self.notice = Some(err.to_string()),
            }
        }

        let month = self.selections.month.clone();
        if self.issued_trend_month.as_ref() != Some(&month) {
            self.issued_trend_month = Some(month.clone());
            let explorer = self.explorer.clone();
            self.trend_line.spawn(move || explorer.trend_line(&month));
        }

        let key = match self.selections.graph_panel {
            GraphPanel::Cargo => GraphKey::Cargo(
                self.selections.month.clone(),
                self.selections.cargo_location.clone(),
            ),
            GraphPanel::Fish => GraphKey::Fish(self.selections.fish_month.clone()),
        };
        if self.issued_graph.as_ref() != Some(&key) {
            self.issued_graph = Some(key.clone());
            self.highlight = None;
            let explorer = self.explorer.clone();
            match key {
                GraphKey::Cargo(month, location) => {
                    self.cargo
                        .spawn(move || explorer.cargo_graph(&month, location.as_deref()));
                }
                GraphKey::Fish(month) => {
                    self.fish.spawn(move || explorer.fish_graph(month.as_deref()));
                }
            }
        }
    }

    fn pin(&mut self, entry: DashboardEntry) {
        match self.dashboard.pin(entry) {
            Ok(index) => log::info!("pinned entry {index}"),
            Err(err) => self.notice = Some(format!("could not pin: {err}")),
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Harborview");
            ui.separator();
            ui.selectable_value(&mut self.selections.view, View::Explore, "Explore");
            ui.selectable_value(&mut self.selections.view, View::Dashboard, "Dashboard");
            if let Some(notice) = &self.notice {
                ui.separator();
                ui.colored_label(ui.visuals().warn_fg_color, notice);
            }
        });
    }

    fn heatmap_controls(&mut self, ui: &mut egui::Ui) {
        let selections = &mut self.selections;
        ui.horizontal_wrapped(|ui| {
            for category in [VesselCategory::Fishing, VesselCategory::NonFishing] {
                if ui
                    .selectable_label(selections.category == category, category.label())
                    .clicked()
                    && selections.category != category
                {
                    selections.category = category;
                    selections.vessel_labels.clear();
                }
            }

            ui.add_enabled_ui(selections.category == VesselCategory::NonFishing, |ui| {
                ui.menu_button("Vessel types", |ui| {
                    for (label, _) in VESSEL_TYPE_LABELS {
                        let mut checked = selections.vessel_labels.iter().any(|l| l == label);
                        if ui.checkbox(&mut checked, label).changed() {
                            if checked {
                                selections.vessel_labels.push(label.to_owned());
                            } else {
                                selections.vessel_labels.retain(|l| l != label);
                            }
                        }
                    }
                });
            });

            let month_name = MonthCode::parse(&selections.month)
                .map(MonthCode::name)
                .unwrap_or("?");
            egui::ComboBox::from_id_salt("heatmap_month")
                .selected_text(month_name)
                .show_ui(ui, |ui| {
                    for month in MonthCode::explorable() {
                        ui.selectable_value(&mut selections.month, month.code(), month.name());
                    }
                });

            ui.menu_button("Location types", |ui| {
                for kind in LocationType::ALL {
                    let mut checked = selections.location_types.contains(&kind);
                    if ui.checkbox(&mut checked, kind.label()).changed() {
                        if checked {
                            selections.location_types.push(kind);
                        } else {
                            selections.location_types.retain(|k| *k != kind);
                        }
                    }
                }
            });

            egui::ComboBox::from_id_salt("heatmap_metric")
                .selected_text(selections.metric.label())
                .show_ui(ui, |ui| {
                    for metric in MetricKind::ALL {
                        ui.selectable_value(&mut selections.metric, metric, metric.label());
                    }
                });
        });
    }

    fn explore(&mut self, ui: &mut egui::Ui) {
        ui.columns(2, |columns| {
            egui::ScrollArea::vertical()
                .id_salt("explore_left")
                .show(&mut columns[0], |ui| {
                    self.heatmap_controls(ui);
                    ui.separator();
                    let mut pin = None;
                    if let Some(view) = widgets::load_status(ui, &mut self.heatmap) {
                        if ui.button("Add to dashboard").clicked() {
                            pin = Some(view.pin());
                        }
                        if view.rows.is_empty() {
                            ui.label("No vessels match this selection.");
                        } else {
                            let date = view.date();
                            let scale = view.scale();
                            let shown = Heatmap::new(&view.table, &date, &view.rows, &view.columns, scale)
                                .reorderable(true)
                                .show(ui);
                            if let Some((from, to)) = shown.moved {
                                let row = view.rows.remove(from);
                                view.rows.insert(to, row);
                            }
                        }
                    }
                    if let Some(entry) = pin {
                        self.pin(entry);
                    }

                    ui.separator();
                    ui.strong("Dwell by location");
                    if let Some(line) = widgets::load_status(ui, &mut self.trend_line) {
                        trend_line_chart(ui, line);
                    }
                    ui.separator();
                    ui.strong("Weekly dwell by vessel");
                    if let Some(grid) = widgets::load_status(ui, &mut self.trend_grid) {
                        trend_grid_chart(ui, grid);
                    }
                });

            egui::ScrollArea::vertical()
                .id_salt("explore_right")
                .show(&mut columns[1], |ui| self.graphs(ui));
        });
    }

    fn graphs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.selections.graph_panel, GraphPanel::Cargo, "Cargo Vessels");
            ui.selectable_value(&mut self.selections.graph_panel, GraphPanel::Fish, "Suspicious");
        });
        let mut pin = None;
        match self.selections.graph_panel {
            GraphPanel::Cargo => {
                if let Some(view) = widgets::load_status(ui, &mut self.cargo) {
                    let current = view.location.clone().unwrap_or_default();
                    egui::ComboBox::from_id_salt("cargo_location")
                        .selected_text(current.as_str())
                        .show_ui(ui, |ui| {
                            for location in &view.locations {
                                if ui.selectable_label(*location == current, location).clicked() {
                                    self.selections.cargo_location = Some(location.clone());
                                }
                            }
                        });
                    if ui.button("Add to dashboard").clicked() {
                        pin = Some(view.network.pin());
                    }
                    if view.network.graph.is_empty() {
                        ui.label("No deliveries for this location and month.");
                    } else {
                        let _ = NetworkGraph::new(&view.network.graph, &mut self.highlight).show(ui);
                    }
                }
            }
            GraphPanel::Fish => {
                let fish_month = self
                    .selections
                    .fish_month
                    .as_deref()
                    .and_then(|code| MonthCode::parse(code).ok())
                    .map_or("All months", MonthCode::name);
                egui::ComboBox::from_id_salt("fish_month")
                    .selected_text(fish_month)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.selections.fish_month, None, "All months");
                        for number in 1..=12 {
                            if let Ok(month) = MonthCode::new(number) {
                                ui.selectable_value(
                                    &mut self.selections.fish_month,
                                    Some(month.code()),
                                    month.name(),
                                );
                            }
                        }
                    });
                if let Some(view) = widgets::load_status(ui, &mut self.fish) {
                    if ui.button("Add to dashboard").clicked() {
                        pin = Some(view.pin());
                    }
                    let _ = NetworkGraph::new(&view.graph, &mut self.highlight)
                        .height(520.0)
                        .show(ui);
                }
            }
        }
        if let Some(entry) = pin {
            self.pin(entry);
        }
    }

    fn dashboard(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for kind in [EntryKind::Heatmap, EntryKind::Network] {
                if let Err(err) = self.pinned(ui, kind) {
                    self.notice = Some(err.to_string());
                }
            }
        });
    }

    fn pinned(&mut self, ui: &mut egui::Ui, kind: EntryKind) -> harborview::Result<()> {
        let store = self.dashboard.store_mut(kind);
        ui.heading(match kind {
            EntryKind::Heatmap => "Pinned heatmaps",
            EntryKind::Network => "Pinned graphs",
        });
        if store.is_empty() {
            ui.label("Nothing pinned yet.");
            return Ok(());
        }

        enum Action {
            Remove(usize),
            Move(usize, usize),
            Rows(usize, Vec<String>),
        }
        let mut action = None;
        let len = store.len();
        for (index, entry) in store.list().iter().enumerate() {
            ui.push_id((kind, index), |ui| {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.strong(&entry.params.title);
                        if ui.add_enabled(index > 0, egui::Button::new("⬆")).clicked() {
                            action = Some(Action::Move(index, index - 1));
                        }
                        if ui.add_enabled(index + 1 < len, egui::Button::new("⬇")).clicked() {
                            action = Some(Action::Move(index, index + 1));
                        }
                        if ui.button("✖").clicked() {
                            action = Some(Action::Remove(index));
                        }
                    });
                    match &entry.payload {
                        Payload::Heatmap(table) => {
                            let params = &entry.params;
                            let rows = if params.rows.is_empty() {
                                table.entities(&params.date)
                            } else {
                                params.rows.clone()
                            };
                            let scale = HeatScale::for_metric(
                                params.metric.unwrap_or_default(),
                                params.profile,
                            );
                            let shown = Heatmap::new(table, &params.date, &rows, &params.locations, scale)
                                .reorderable(true)
                                .show(ui);
                            if let Some((from, to)) = shown.moved {
                                let mut rows = rows;
                                let row = rows.remove(from);
                                rows.insert(to, row);
                                action = Some(Action::Rows(index, rows));
                            }
                        }
                        Payload::Network(graph) => {
                            let selection = self.pinned_highlights.entry(index).or_default();
                            let _ = NetworkGraph::new(graph, selection).height(320.0).show(ui);
                        }
                    }
                });
            });
        }

        match action {
            Some(Action::Remove(index)) => {
                store.remove(index)?;
                if kind == EntryKind::Network {
                    self.pinned_highlights.clear();
                }
            }
            Some(Action::Move(from, to)) => {
                store.move_entry(from, to)?;
                if kind == EntryKind::Network {
                    self.pinned_highlights.clear();
                }
            }
            Some(Action::Rows(index, rows)) => store.set_rows(index, rows)?,
            None => {}
        }
        Ok(())
    }
}

fn trend_line_chart(ui: &mut egui::Ui, line: &TrendLine) {
    if line.points.is_empty() {
        ui.label(format!("No trend data for {}.", line.month.name()));
        return;
    }
    let max = line.points.iter().map(|p| p.dwell).fold(0.0, f64::max).max(1.0);
    for point in &line.points {
        ui.horizontal(|ui| {
            ui.add_sized([160.0, 16.0], egui::Label::new(&point.location).truncate());
            ui.add(
                egui::ProgressBar::new((point.dwell / max) as f32)
                    .text(widgets::value_label(point.dwell))
                    .desired_width(ui.available_width()),
            );
        });
    }
}

fn trend_grid_chart(ui: &mut egui::Ui, grid: &TrendGrid) {
    if grid.cells.is_empty() {
        ui.label("No weekly data.");
        return;
    }
    let cell = egui::vec2(28.0, 18.0);
    egui::ScrollArea::horizontal().id_salt("trend_grid").show(ui, |ui| {
        egui::Grid::new("trend_grid_cells").spacing([2.0, 2.0]).show(ui, |ui| {
            ui.label("");
            for week in &grid.weeks {
                ui.small(week);
            }
            ui.end_row();
            for vessel in &grid.vessels {
                ui.label(vessel);
                for week in &grid.weeks {
                    let (rect, response) = ui.allocate_exact_size(cell, egui::Sense::hover());
                    if let Some(found) = grid.cell(week, vessel) {
                        let width = rect.width() / found.segments.len().max(1) as f32;
                        for (i, segment) in found.segments.iter().enumerate() {
                            let part = egui::Rect::from_min_size(
                                rect.min + egui::vec2(width * i as f32, 0.0),
                                egui::vec2(width, rect.height()),
                            );
                            ui.painter().rect_filled(part, 0.0, segment.color);
                        }
                        let tooltip = found
                            .segments
                            .iter()
                            .map(|s| format!("{}: {}", s.location, widgets::value_label(s.total_dwell)))
                            .collect::<Vec<_>>()
                            .join("\n");
                        let _ = response.on_hover_text(tooltip);
                    }
                }
                ui.end_row();
            }
        });
    });
}

impl eframe::App for HarborviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh();
        egui::TopBottomPanel::top("harborview_top").show(ctx, |ui| self.top_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| match self.selections.view {
            View::Explore => self.explore(ui),
            View::Dashboard => self.dashboard(ui),
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, APP_KEY, &self.selections);
    }
}
