use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, Level};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    date_inputs(ui, state);
    ui.separator();

    // Clone the option lists so the toggles below can mutate state.
    let options = state.view.options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            multiselect(ui, state, Level::Region, "Pick a Region", &options.regions);
            multiselect(ui, state, Level::State, "Pick a State", &options.states);
            multiselect(ui, state, Level::City, "Pick a City", &options.cities);
        });
}

fn date_inputs(ui: &mut Ui, state: &mut AppState) {
    let Some(range) = state.date_range else {
        return;
    };
    let (mut start, mut end) = (range.start, range.end);

    egui::Grid::new("date_inputs")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Start Date");
            ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
            ui.end_row();
            ui.label("End Date");
            ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
            ui.end_row();
        });

    if start != range.start {
        state.set_start_date(start);
    }
    if end != range.end {
        state.set_end_date(end);
    }
}

/// A collapsible checkbox list; nothing ticked means "all".
fn multiselect(
    ui: &mut Ui,
    state: &mut AppState,
    level: Level,
    title: &str,
    offered: &BTreeSet<String>,
) {
    let selected = match level {
        Level::Region => &state.selection.regions,
        Level::State => &state.selection.states,
        Level::City => &state.selection.cities,
    };
    let summary = if selected.is_empty() {
        "all".to_string()
    } else {
        format!("{}/{}", selected.len(), offered.len())
    };
    let selected = selected.clone();

    egui::CollapsingHeader::new(RichText::new(format!("{title}  ({summary})")).strong())
        .id_salt(title)
        .default_open(level == Level::Region)
        .show(ui, |ui: &mut Ui| {
            if !selected.is_empty() && ui.small_button("Clear").clicked() {
                state.clear(level);
                return;
            }
            // Selections outside the offered set stay visible so they can be unticked.
            let shown: BTreeSet<&String> = offered.iter().chain(selected.iter()).collect();
            for value in shown {
                let mut checked = selected.contains(value);
                if ui.checkbox(&mut checked, value).changed() {
                    state.toggle(level, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            if let Some(name) = &state.source_name {
                ui.label(RichText::new(name).strong());
            }
            ui.label(format!(
                "{} records loaded, {} visible",
                ds.len(),
                state.view.filtered.len()
            ));
        }

        if let Some(warning) = &state.view.warning {
            ui.separator();
            ui.label(RichText::new(warning.to_string()).color(Color32::YELLOW));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "txt", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
