use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use super::model::{
    month_index, AggregationResult, GroupField, PivotTable, Record, ValueField,
};

/// Label column of the time series.
pub const MONTH_YEAR: &str = "month_year";

/// How a pivot cell combines its records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Mean,
}

// ---------------------------------------------------------------------------
// Grouped sums
// ---------------------------------------------------------------------------

/// Sum `value` per distinct tuple of `group` fields, keys in sorted order.
pub fn sum_by(records: &[Record], group: &[GroupField], value: ValueField) -> AggregationResult {
    let mut sums: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for r in records {
        let key = group.iter().map(|g| r.group_value(*g).to_string()).collect();
        *sums.entry(key).or_insert(0.0) += r.value(value);
    }
    AggregationResult {
        key_fields: group.iter().map(|g| g.column_name().to_string()).collect(),
        value_field: value.column_name().to_string(),
        rows: sums.into_iter().collect(),
    }
}

/// Sum `value` per calendar month, oldest first, labelled like `Jan-2023`.
pub fn sum_by_month(records: &[Record], value: ValueField) -> AggregationResult {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for r in records {
        let bucket = (r.order_date.year(), r.order_date.month());
        *buckets.entry(bucket).or_insert(0.0) += r.value(value);
    }
    let rows = buckets
        .into_iter()
        .filter_map(|((y, m), total)| {
            let first = NaiveDate::from_ymd_opt(y, m, 1)?;
            Some((vec![first.format("%b-%Y").to_string()], total))
        })
        .collect();
    AggregationResult {
        key_fields: vec![MONTH_YEAR.to_string()],
        value_field: value.column_name().to_string(),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

pub fn pivot(
    records: &[Record],
    row_field: GroupField,
    column_field: GroupField,
    value: ValueField,
) -> PivotTable {
    pivot_with(records, row_field, column_field, value, Aggregate::Sum)
}

/// Cross-tabulate `value` by `(row_field, column_field)`. Cells without
/// records are absent. Month-name columns run January to December.
pub fn pivot_with(
    records: &[Record],
    row_field: GroupField,
    column_field: GroupField,
    value: ValueField,
    aggregate: Aggregate,
) -> PivotTable {
    let mut acc: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    let mut row_keys = BTreeSet::new();
    let mut column_keys = BTreeSet::new();

    for r in records {
        let row = r.group_value(row_field).to_string();
        let col = r.group_value(column_field).to_string();
        row_keys.insert(row.clone());
        column_keys.insert(col.clone());
        let cell = acc.entry((row, col)).or_insert((0.0, 0));
        cell.0 += r.value(value);
        cell.1 += 1;
    }

    let mut column_keys: Vec<String> = column_keys.into_iter().collect();
    if column_field == GroupField::MonthName {
        column_keys.sort_by_key(|name| month_index(name).unwrap_or(u32::MAX));
    }

    let cells = acc
        .into_iter()
        .map(|(key, (sum, count))| {
            let v = match aggregate {
                Aggregate::Sum => sum,
                Aggregate::Mean => sum / count as f64,
            };
            (key, v)
        })
        .collect();

    PivotTable {
        row_field: row_field.column_name().to_string(),
        column_field: column_field.column_name().to_string(),
        row_keys: row_keys.into_iter().collect(),
        column_keys,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Currency formatting
// ---------------------------------------------------------------------------

/// `$1,234.56` style text; negatives as `-$12.00`.
pub fn format_currency(v: f64) -> String {
    let cents = (v.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter_by_hierarchy;
    use crate::data::model::fixtures::*;
    use crate::data::model::{FilterSelection, HierarchyRule};

    #[test]
    fn sums_by_single_field() {
        let res = sum_by(&sample(), &[GroupField::Category], ValueField::Sales);
        assert_eq!(res.key_fields, vec!["Category"]);
        assert_eq!(res.value_field, "Sales");
        let furniture = res
            .rows
            .iter()
            .find(|(k, _)| k[0] == "Furniture")
            .map(|(_, v)| *v)
            .unwrap();
        assert!((furniture - 594.75).abs() < 1e-9);
        assert_eq!(res.len(), 3);
    }

    #[test]
    fn sum_by_is_order_independent() {
        let fields = [GroupField::Region, GroupField::Category];
        let forward = sum_by(&sample(), &fields, ValueField::Sales);
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(sum_by(&reversed, &fields, ValueField::Sales), forward);
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let res = sum_by(&[], &[GroupField::Region], ValueField::Profit);
        assert!(res.is_empty());
        assert!(sum_by_month(&[], ValueField::Sales).is_empty());
    }

    #[test]
    fn filter_then_sum_example() {
        let sel = FilterSelection {
            regions: ["West".to_string()].into(),
            ..Default::default()
        };
        let filtered = filter_by_hierarchy(&two_records(), &sel, HierarchyRule::Conjunctive);
        let res = sum_by(&filtered, &[GroupField::Region], ValueField::Sales);
        assert_eq!(res.rows, vec![(vec!["West".to_string()], 100.0)]);
    }

    #[test]
    fn months_sort_chronologically_not_by_label() {
        let res = sum_by_month(&sample(), ValueField::Sales);
        let labels: Vec<&str> = res.rows.iter().map(|(k, _)| k[0].as_str()).collect();
        assert_eq!(
            labels,
            vec!["Feb-2022", "Nov-2022", "Jan-2023", "Feb-2023", "Mar-2023"]
        );
        let jan: f64 = res.rows[2].1;
        assert!((jan - 315.75).abs() < 1e-9);
    }

    #[test]
    fn pivot_leaves_empty_cells_absent() {
        let table = pivot(
            &sample(),
            GroupField::SubCategory,
            GroupField::MonthName,
            ValueField::Sales,
        );
        assert_eq!(table.row_keys, vec!["Chairs", "Paper", "Phones", "Tables"]);
        assert_eq!(
            table.column_keys,
            vec!["January", "February", "March", "November"]
        );
        assert_eq!(table.get("Paper", "January"), Some(15.25));
        assert_eq!(table.get("Paper", "March"), None);
        // Phones: Jan-2023 and Feb-2022 land in different month columns.
        assert_eq!(table.get("Phones", "February"), Some(80.0));
        assert_eq!(table.cells.len(), 6);
    }

    #[test]
    fn pivot_mean_averages_cells() {
        let mut records = sample();
        records.push(record(date(2023, 1, 2), "West", "WA", "Seattle", "Office Supplies", "Paper", 4.75));
        let table = pivot_with(
            &records,
            GroupField::SubCategory,
            GroupField::MonthName,
            ValueField::Sales,
            Aggregate::Mean,
        );
        assert_eq!(table.get("Paper", "January"), Some(10.0));
    }

    #[test]
    fn formats_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-12.0), "-$12.00");
    }
}
