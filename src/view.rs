use crate::config::DashboardConfig;
use crate::data::aggregate::{pivot, sum_by, sum_by_month};
use crate::data::filter::{filter_by_date, filter_by_hierarchy, HierarchyOptions};
use crate::data::model::{
    AggregationResult, DateRange, FilterSelection, GroupField, HierarchyRule, PivotTable, Record,
    SalesDataset, ValueField,
};
use crate::error::EmptyResultWarning;

/// Point of the Sales/Profit scatter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub sales: f64,
    pub profit: f64,
    pub quantity: u32,
    pub category: String,
}

/// Everything the central panel draws, computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    /// Records passing both filters.
    pub filtered: Vec<Record>,
    pub by_category: AggregationResult,
    pub by_region: AggregationResult,
    pub by_segment: AggregationResult,
    pub time_series: AggregationResult,
    /// Region / Category / Sub-Category sums for the treemap.
    pub hierarchy: AggregationResult,
    pub monthly_sub_category: PivotTable,
    pub scatter: Vec<ScatterPoint>,
    /// Leading rows of the date-filtered set; geographic filters are not applied.
    pub summary: Vec<Record>,
    pub options: HierarchyOptions,
    pub warning: Option<EmptyResultWarning>,
}

impl DashboardView {
    pub fn compute(
        dataset: &SalesDataset,
        range: &DateRange,
        selection: &FilterSelection,
        rule: HierarchyRule,
        config: &DashboardConfig,
    ) -> Self {
        let dated = filter_by_date(&dataset.records, range);
        let options = HierarchyOptions::compute(&dated, selection);
        let filtered = filter_by_hierarchy(&dated, selection, rule);

        log::debug!(
            "Pipeline: {} loaded, {} in date range, {} after hierarchy filter",
            dataset.len(),
            dated.len(),
            filtered.len()
        );

        let warning = if filtered.is_empty() {
            log::warn!("{}", EmptyResultWarning);
            Some(EmptyResultWarning)
        } else {
            None
        };

        let scatter = filtered
            .iter()
            .map(|r| ScatterPoint {
                sales: r.sales,
                profit: r.profit,
                quantity: r.quantity,
                category: r.category.clone(),
            })
            .collect();

        DashboardView {
            by_category: sum_by(&filtered, &[GroupField::Category], ValueField::Sales),
            by_region: sum_by(&filtered, &[GroupField::Region], ValueField::Sales),
            by_segment: sum_by(&filtered, &[GroupField::Segment], ValueField::Sales),
            time_series: sum_by_month(&filtered, ValueField::Sales),
            hierarchy: sum_by(
                &filtered,
                &[GroupField::Region, GroupField::Category, GroupField::SubCategory],
                ValueField::Sales,
            ),
            monthly_sub_category: pivot(
                &filtered,
                GroupField::SubCategory,
                GroupField::MonthName,
                ValueField::Sales,
            ),
            scatter,
            summary: dated.iter().take(config.summary_rows).cloned().collect(),
            options,
            warning,
            filtered,
        }
    }

    /// Leading filtered rows for the data overview table.
    pub fn overview<'a>(&'a self, config: &DashboardConfig) -> &'a [Record] {
        let n = self.filtered.len().min(config.overview_rows);
        &self.filtered[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;

    fn dataset() -> SalesDataset {
        SalesDataset::from_records(Vec::new(), sample())
    }

    #[test]
    fn summary_ignores_geographic_filters() {
        let ds = dataset();
        let sel = FilterSelection {
            regions: ["Central".to_string()].into(),
            ..Default::default()
        };
        let cfg = DashboardConfig {
            summary_rows: 4,
            ..Default::default()
        };
        let view = DashboardView::compute(
            &ds,
            &ds.default_range().unwrap(),
            &sel,
            HierarchyRule::Conjunctive,
            &cfg,
        );
        assert_eq!(view.filtered.len(), 1);
        assert_eq!(view.summary.len(), 4);
        assert_eq!(view.by_region.rows, vec![(vec!["Central".to_string()], 64.75)]);
        assert_eq!(view.hierarchy.rows[0].0, vec!["Central", "Furniture", "Chairs"]);
        assert!(view.warning.is_none());
    }

    #[test]
    fn empty_result_carries_warning_and_empty_charts() {
        let ds = dataset();
        let sel = FilterSelection {
            cities: ["Atlantis".to_string()].into(),
            ..Default::default()
        };
        let view = DashboardView::compute(
            &ds,
            &ds.default_range().unwrap(),
            &sel,
            HierarchyRule::Conjunctive,
            &DashboardConfig::default(),
        );
        assert_eq!(view.warning, Some(EmptyResultWarning));
        assert!(view.by_category.is_empty());
        assert!(view.time_series.is_empty());
        assert!(view.monthly_sub_category.cells.is_empty());
        assert!(view.scatter.is_empty());
    }

    #[test]
    fn options_come_from_date_filtered_rows() {
        let ds = dataset();
        let range = DateRange::new(date(2023, 1, 1), date(2023, 12, 31));
        let view = DashboardView::compute(
            &ds,
            &range,
            &FilterSelection::default(),
            HierarchyRule::Conjunctive,
            &DashboardConfig::default(),
        );
        assert!(!view.options.cities.contains("LA"));
        assert!(!view.options.cities.contains("NYC"));
        assert_eq!(view.filtered.len(), 4);
        let cfg = DashboardConfig {
            overview_rows: 2,
            ..Default::default()
        };
        assert_eq!(view.overview(&cfg).len(), 2);
    }
}
