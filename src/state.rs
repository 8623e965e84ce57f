use std::path::Path;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::export::{emit_aggregation_csv, emit_records_csv, write_export, ExportKind};
use crate::data::loader::load_file;
use crate::data::model::{DateRange, FilterSelection, HierarchyRule, SalesDataset};
use crate::error::ExportError;
use crate::view::DashboardView;

/// Which geographic level a selection change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Region,
    State,
    City,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<SalesDataset>,

    /// Name of the loaded file, shown in the top bar.
    pub source_name: Option<String>,

    pub date_range: Option<DateRange>,

    pub selection: FilterSelection,

    /// Pipeline output for the current filters (cached).
    pub view: DashboardView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            source_name: None,
            date_range: None,
            selection: FilterSelection::default(),
            view: DashboardView::default(),
            status_message: None,
        }
    }

    /// Load the configured default dataset if it exists.
    pub fn load_default(&mut self) {
        let path = self.config.default_dataset.clone();
        if path.exists() {
            self.load_path(&path);
        } else {
            log::info!("No default dataset at {}", path.display());
        }
    }

    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                self.source_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.date_range = dataset.default_range();
        self.selection = FilterSelection::default();
        self.dataset = Some(dataset);
        self.status_message = None;
        self.recompute();
    }

    /// Re-run the pipeline. Under the conjunctive rule selections no longer
    /// offered are pruned; the branching rule keeps them, since some of its
    /// branches ignore an upper level.
    pub fn recompute(&mut self) {
        let (Some(ds), Some(range)) = (&self.dataset, self.date_range) else {
            self.view = DashboardView::default();
            return;
        };
        let rule = self.config.hierarchy_rule;
        let mut view = DashboardView::compute(ds, &range, &self.selection, rule, &self.config);
        // Pruning can narrow a lower level's options, so iterate to a fixed point.
        while rule == HierarchyRule::Conjunctive && view.options.prune(&mut self.selection) {
            view = DashboardView::compute(ds, &range, &self.selection, rule, &self.config);
        }
        self.view = view;
    }

    pub fn set_start_date(&mut self, start: NaiveDate) {
        if let Some(range) = &mut self.date_range {
            range.start = start;
            self.recompute();
        }
    }

    pub fn set_end_date(&mut self, end: NaiveDate) {
        if let Some(range) = &mut self.date_range {
            range.end = end;
            self.recompute();
        }
    }

    /// Add or remove a single value at one level.
    pub fn toggle(&mut self, level: Level, value: &str) {
        let set = match level {
            Level::Region => &mut self.selection.regions,
            Level::State => &mut self.selection.states,
            Level::City => &mut self.selection.cities,
        };
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        self.recompute();
    }

    /// Empty one level's selection, meaning "include all".
    pub fn clear(&mut self, level: Level) {
        match level {
            Level::Region => self.selection.regions.clear(),
            Level::State => self.selection.states.clear(),
            Level::City => self.selection.cities.clear(),
        }
        self.recompute();
    }

    /// CSV bytes for one of the three downloads.
    pub fn export_bytes(&self, kind: ExportKind) -> Result<Vec<u8>, ExportError> {
        match kind {
            ExportKind::Category => emit_aggregation_csv(&self.view.by_category),
            ExportKind::Region => emit_aggregation_csv(&self.view.by_region),
            ExportKind::Dataset => {
                let headers = self
                    .dataset
                    .as_ref()
                    .map(|d| d.headers.as_slice())
                    .unwrap_or_default();
                emit_records_csv(headers, &self.view.filtered)
            }
        }
    }

    /// Encode and write an export, reporting failures in the status line.
    pub fn export_to(&mut self, kind: ExportKind, path: &Path) {
        let result = self
            .export_bytes(kind)
            .and_then(|bytes| write_export(path, &bytes));
        match result {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Export failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
