use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field names – the columns the dashboard understands
// ---------------------------------------------------------------------------

pub const COL_ORDER_DATE: &str = "Order Date";
pub const COL_REGION: &str = "Region";
pub const COL_STATE: &str = "State";
pub const COL_CITY: &str = "City";
pub const COL_CATEGORY: &str = "Category";
pub const COL_SUB_CATEGORY: &str = "Sub-Category";
pub const COL_SEGMENT: &str = "Segment";
pub const COL_SALES: &str = "Sales";
pub const COL_PROFIT: &str = "Profit";
pub const COL_QUANTITY: &str = "Quantity";

/// Columns a source table must carry to be loaded.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_ORDER_DATE,
    COL_REGION,
    COL_STATE,
    COL_CITY,
    COL_CATEGORY,
    COL_SUB_CATEGORY,
    COL_SEGMENT,
    COL_SALES,
    COL_PROFIT,
    COL_QUANTITY,
];

/// A categorical column usable as a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupField {
    Region,
    State,
    City,
    Category,
    SubCategory,
    Segment,
    /// Full English month name of the order date ("January").
    MonthName,
}

impl GroupField {
    pub fn column_name(self) -> &'static str {
        match self {
            GroupField::Region => COL_REGION,
            GroupField::State => COL_STATE,
            GroupField::City => COL_CITY,
            GroupField::Category => COL_CATEGORY,
            GroupField::SubCategory => COL_SUB_CATEGORY,
            GroupField::Segment => COL_SEGMENT,
            GroupField::MonthName => "month",
        }
    }
}

/// A numeric column usable as the summed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueField {
    Sales,
    Profit,
    Quantity,
}

impl ValueField {
    pub fn column_name(self) -> &'static str {
        match self {
            ValueField::Sales => COL_SALES,
            ValueField::Profit => COL_PROFIT,
            ValueField::Quantity => COL_QUANTITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the sales table
// ---------------------------------------------------------------------------

/// One sales transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sub_category: String,
    pub segment: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: u32,
    /// Every cell of the source row, in header order.
    pub raw: Vec<String>,
}

impl Record {
    /// String value of a categorical field.
    pub fn group_value(&self, field: GroupField) -> &str {
        match field {
            GroupField::Region => &self.region,
            GroupField::State => &self.state,
            GroupField::City => &self.city,
            GroupField::Category => &self.category,
            GroupField::SubCategory => &self.sub_category,
            GroupField::Segment => &self.segment,
            GroupField::MonthName => month_name(self.order_date.month()),
        }
    }

    pub fn value(&self, field: ValueField) -> f64 {
        match field {
            ValueField::Sales => self.sales,
            ValueField::Profit => self.profit,
            ValueField::Quantity => self.quantity as f64,
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}

/// 1-based month number for a full month name.
pub fn month_index(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive calendar-date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// An inverted range matches nothing.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

// ---------------------------------------------------------------------------
// FilterSelection
// ---------------------------------------------------------------------------

/// User-chosen constraint sets over the geographic hierarchy.
/// An empty set means "no constraint at that level".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.states.is_empty() && self.cities.is_empty()
    }
}

/// Which rule combines the three selection sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyRule {
    /// Conjunction of the membership tests of every non-empty set.
    #[default]
    Conjunctive,
    /// Emptiness-pattern branch table; some branches ignore a non-empty set.
    Branching,
}

// ---------------------------------------------------------------------------
// AggregationResult
// ---------------------------------------------------------------------------

/// Group-key tuple → summed value, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    /// Column names of the key tuple followed by the value column.
    pub key_fields: Vec<String>,
    pub value_field: String,
    pub rows: Vec<(Vec<String>, f64)>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Label of a row: its key parts joined with " / ".
    pub fn label(&self, index: usize) -> String {
        self.rows
            .get(index)
            .map(|(k, _)| k.join(" / "))
            .unwrap_or_default()
    }
}

/// Sparse cross-tabulation: only cells with matching records are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    pub row_field: String,
    pub column_field: String,
    pub row_keys: Vec<String>,
    pub column_keys: Vec<String>,
    pub cells: BTreeMap<(String, String), f64>,
}

impl PivotTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        self.cells
            .get(&(row.to_string(), column.to_string()))
            .copied()
    }
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded record set with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    pub records: Vec<Record>,
    /// Source header names, in order.
    pub headers: Vec<String>,
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    /// `None` for an empty dataset.
    pub date_bounds: Option<DateRange>,
}

impl SalesDataset {
    pub fn from_records(headers: Vec<String>, records: Vec<Record>) -> Self {
        let mut regions = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut cities = BTreeSet::new();
        let mut bounds: Option<DateRange> = None;

        for r in &records {
            regions.insert(r.region.clone());
            states.insert(r.state.clone());
            cities.insert(r.city.clone());
            bounds = Some(match bounds {
                None => DateRange::new(r.order_date, r.order_date),
                Some(b) => DateRange::new(b.start.min(r.order_date), b.end.max(r.order_date)),
            });
        }

        SalesDataset {
            records,
            headers,
            regions,
            states,
            cities,
            date_bounds: bounds,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The default date range: min to max order date.
    pub fn default_range(&self) -> Option<DateRange> {
        self.date_bounds
    }
}

impl fmt::Display for SalesDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records", self.records.len())?;
        if let Some(b) = self.date_bounds {
            write!(f, " from {} to {}", b.start, b.end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(
        order_date: NaiveDate,
        region: &str,
        state: &str,
        city: &str,
        category: &str,
        sub_category: &str,
        sales: f64,
    ) -> Record {
        Record {
            order_date,
            region: region.into(),
            state: state.into(),
            city: city.into(),
            category: category.into(),
            sub_category: sub_category.into(),
            segment: "Consumer".into(),
            sales,
            profit: sales / 10.0,
            quantity: 1,
            raw: Vec::new(),
        }
    }

    /// West/CA/LA for 100 and East/NY/NYC for 50.
    pub fn two_records() -> Vec<Record> {
        vec![
            record(date(2023, 1, 5), "West", "CA", "LA", "Furniture", "Chairs", 100.0),
            record(date(2023, 2, 9), "East", "NY", "NYC", "Technology", "Phones", 50.0),
        ]
    }

    pub fn sample() -> Vec<Record> {
        vec![
            record(date(2022, 11, 3), "West", "CA", "LA", "Furniture", "Chairs", 120.0),
            record(date(2023, 1, 15), "West", "CA", "San Diego", "Technology", "Phones", 300.5),
            record(date(2023, 1, 20), "West", "WA", "Seattle", "Office Supplies", "Paper", 15.25),
            record(date(2022, 2, 28), "East", "NY", "NYC", "Technology", "Phones", 80.0),
            record(date(2023, 3, 1), "East", "NY", "Buffalo", "Furniture", "Tables", 410.0),
            record(date(2023, 2, 14), "Central", "TX", "Austin", "Furniture", "Chairs", 64.75),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn dataset_indexes_hierarchy_and_bounds() {
        let ds = SalesDataset::from_records(Vec::new(), sample());
        assert_eq!(ds.regions.len(), 3);
        assert!(ds.states.contains("WA"));
        assert!(ds.cities.contains("Austin"));
        let bounds = ds.default_range().unwrap();
        assert_eq!(bounds.start, date(2022, 2, 28));
        assert_eq!(bounds.end, date(2023, 3, 1));
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let ds = SalesDataset::from_records(Vec::new(), Vec::new());
        assert!(ds.is_empty());
        assert!(ds.default_range().is_none());
    }

    #[test]
    fn month_names_round_trip_through_index() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_index("December"), Some(12));
        assert_eq!(month_index("Smarch"), None);
    }
}
