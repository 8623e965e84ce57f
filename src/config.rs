use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::HierarchyRule;

/// Optional settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "dashboard.json";

/// Dashboard settings. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset opened at startup when present.
    pub default_dataset: PathBuf,
    /// Rows shown in the summary table.
    pub summary_rows: usize,
    /// Rows shown in the data overview.
    pub overview_rows: usize,
    pub hierarchy_rule: HierarchyRule,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_dataset: PathBuf::from("superstore.csv"),
            summary_rows: 10,
            overview_rows: 500,
            hierarchy_rule: HierarchyRule::Conjunctive,
            window_width: 1400.0,
            window_height: 900.0,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Read [`CONFIG_FILE`] if it exists; fall back to defaults otherwise.
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(cfg) => {
                log::info!("Using settings from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e:#}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "summary_rows": 25, "hierarchy_rule": "branching" }}"#).unwrap();

        let cfg = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.summary_rows, 25);
        assert_eq!(cfg.hierarchy_rule, HierarchyRule::Branching);
        assert_eq!(cfg.overview_rows, 500);
        assert_eq!(cfg.default_dataset, PathBuf::from("superstore.csv"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "summary_rows = 3").unwrap();
        assert!(DashboardConfig::from_file(file.path()).is_err());
    }
}
