use eframe::egui::{self, ScrollArea, Ui};

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::export::ExportKind;
use crate::state::AppState;
use crate::ui::{panels, plot, shapes, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SuperstoreApp {
    pub state: AppState,
}

impl SuperstoreApp {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        state.load_default();
        Self { state }
    }
}

impl eframe::App for SuperstoreApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        let mut export: Option<ExportKind> = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    export = dashboard(ui, &self.state);
                });
        });

        if let Some(kind) = export {
            save_dialog(&mut self.state, kind);
        }
    }
}

/// Draw every chart; returns the download the user asked for, if any.
fn dashboard(ui: &mut Ui, state: &AppState) -> Option<ExportKind> {
    let Some(ds) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sales file to begin  (File → Open…)");
        });
        return None;
    };
    let view = &state.view;
    let mut export = None;

    ui.heading("🌎 Superstore EDA");
    ui.add_space(6.0);

    let category_colors = ColorMap::new(view.by_category.rows.iter().map(|(k, _)| k[0].as_str()));
    let region_colors = ColorMap::new(view.by_region.rows.iter().map(|(k, _)| k[0].as_str()));
    let segment_colors = ColorMap::new(view.by_segment.rows.iter().map(|(k, _)| k[0].as_str()));

    ui.columns(2, |cols| {
        cols[0].strong("Sales per Category");
        plot::bar_chart(&mut cols[0], "category_bar", &view.by_category, &category_colors);
        cols[1].strong("Sales per Region");
        shapes::pie_chart(&mut cols[1], &view.by_region, &region_colors, 0.2);
    });

    ui.columns(2, |cols| {
        egui::CollapsingHeader::new("View Category Data").show(&mut cols[0], |ui: &mut Ui| {
            tables::aggregation_table(ui, "category_table", &view.by_category);
            if tables::download_button(ui, ExportKind::Category) {
                export = Some(ExportKind::Category);
            }
        });
        egui::CollapsingHeader::new("View Regional Data").show(&mut cols[1], |ui: &mut Ui| {
            tables::aggregation_table(ui, "region_table", &view.by_region);
            if tables::download_button(ui, ExportKind::Region) {
                export = Some(ExportKind::Region);
            }
        });
    });

    ui.separator();
    ui.heading("Time Series Analysis");
    plot::time_series(ui, &view.time_series);
    egui::CollapsingHeader::new("View Time-Series Data").show(ui, |ui: &mut Ui| {
        tables::aggregation_table(ui, "time_series_table", &view.time_series);
    });

    ui.separator();
    ui.heading("Hierarchical View of Sales");
    let leaf_colors = ColorMap::new(
        view.hierarchy
            .rows
            .iter()
            .filter_map(|(k, _)| k.last())
            .map(String::as_str),
    );
    shapes::treemap(ui, &view.hierarchy, &leaf_colors);

    ui.separator();
    ui.columns(2, |cols| {
        cols[0].strong("Segment Sales");
        shapes::pie_chart(&mut cols[0], &view.by_segment, &segment_colors, 0.0);
        cols[1].strong("Category Sales");
        shapes::pie_chart(&mut cols[1], &view.by_category, &category_colors, 0.0);
    });

    ui.separator();
    ui.heading("👉 Monthly Sales Summary");
    egui::CollapsingHeader::new("Summary Table").show(ui, |ui: &mut Ui| {
        tables::summary_table(ui, &view.summary);
        ui.add_space(8.0);
        ui.label("Monthly Sub-Category Sales");
        tables::pivot_table(ui, &view.monthly_sub_category);
    });

    ui.separator();
    ui.heading("Relationship between Sales and Profit sized by Quantity");
    plot::scatter(ui, &view.scatter, &category_colors);

    ui.separator();
    ui.heading("Overview of the Data Used");
    egui::CollapsingHeader::new("View Data").show(ui, |ui: &mut Ui| {
        tables::overview_table(ui, &ds.headers, view.overview(&state.config));
    });

    ui.add_space(8.0);
    ui.label("Download the filtered dataset here 👇");
    if tables::download_button(ui, ExportKind::Dataset) {
        export = Some(ExportKind::Dataset);
    }
    ui.add_space(16.0);

    export
}

fn save_dialog(state: &mut AppState, kind: ExportKind) {
    let target = rfd::FileDialog::new()
        .set_title("Save CSV")
        .set_file_name(kind.file_name())
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = target {
        state.export_to(kind, &path);
    }
}
