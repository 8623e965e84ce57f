use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::format_currency;
use crate::data::export::ExportKind;
use crate::data::model::{
    AggregationResult, PivotTable, Record, COL_CATEGORY, COL_CITY, COL_PROFIT, COL_QUANTITY,
    COL_REGION, COL_SALES, COL_STATE, REQUIRED_COLUMNS,
};

/// Key columns then the summed value.
pub fn aggregation_table(ui: &mut Ui, id: &str, result: &AggregationResult) {
    egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
        for f in &result.key_fields {
            ui.strong(f);
        }
        ui.strong(&result.value_field);
        ui.end_row();

        for (key, value) in &result.rows {
            for k in key {
                ui.label(k);
            }
            ui.label(format!("{value:.2}"));
            ui.end_row();
        }
    });
}

/// Sub-category × month grid; empty cells stay blank.
pub fn pivot_table(ui: &mut Ui, table: &PivotTable) {
    ScrollArea::horizontal()
        .id_salt("pivot_scroll")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("pivot").striped(true).show(ui, |ui: &mut Ui| {
                ui.strong(&table.row_field);
                for c in &table.column_keys {
                    ui.strong(c);
                }
                ui.end_row();

                for r in &table.row_keys {
                    ui.label(r);
                    for c in &table.column_keys {
                        match table.get(r, c) {
                            Some(v) => ui.label(format!("{v:.2}")),
                            None => ui.label(""),
                        };
                    }
                    ui.end_row();
                }
            });
        });
}

/// Region, State, City, Category, Sales, Profit, Quantity for a few rows.
pub fn summary_table(ui: &mut Ui, records: &[Record]) {
    let headers = [
        COL_REGION,
        COL_STATE,
        COL_CITY,
        COL_CATEGORY,
        COL_SALES,
        COL_PROFIT,
        COL_QUANTITY,
    ];
    egui::Grid::new("summary").striped(true).show(ui, |ui: &mut Ui| {
        for h in headers {
            ui.label(RichText::new(h).strong());
        }
        ui.end_row();
        for r in records {
            ui.label(&r.region);
            ui.label(&r.state);
            ui.label(&r.city);
            ui.label(&r.category);
            ui.label(format_currency(r.sales));
            ui.label(format_currency(r.profit));
            ui.label(r.quantity.to_string());
            ui.end_row();
        }
    });
}

/// Typed cells used when a record has no source row.
fn typed_cells(r: &Record) -> Vec<String> {
    vec![
        r.order_date.to_string(),
        r.region.clone(),
        r.state.clone(),
        r.city.clone(),
        r.category.clone(),
        r.sub_category.clone(),
        r.segment.clone(),
        format!("{:.2}", r.sales),
        format!("{:.2}", r.profit),
        r.quantity.to_string(),
    ]
}

/// Scrollable view of filtered rows with all source columns.
pub fn overview_table(ui: &mut Ui, headers: &[String], records: &[Record]) {
    let header_names: Vec<String> = if headers.is_empty() {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        headers.to_vec()
    };

    let n_columns = header_names.len();

    ui.push_id("overview", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(360.0)
                .columns(Column::auto().at_least(60.0), n_columns)
                .header(20.0, |mut header| {
                    for h in &header_names {
                        header.col(|ui| {
                            ui.strong(h);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, records.len(), |mut row| {
                        let r = &records[row.index()];
                        let cells = if r.raw.is_empty() {
                            typed_cells(r)
                        } else {
                            r.raw.clone()
                        };
                        // Ragged rows are padded or cut to the header width.
                        for i in 0..n_columns {
                            let text = cells.get(i).map(String::as_str).unwrap_or("");
                            row.col(|ui| {
                                ui.label(text);
                            });
                        }
                    });
                });
        });
    });
}

/// "Download Data" button; true when clicked.
pub fn download_button(ui: &mut Ui, kind: ExportKind) -> bool {
    ui.button("Download Data")
        .on_hover_text(format!("Click here to download {}", kind.file_name()))
        .clicked()
}
