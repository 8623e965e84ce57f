use std::path::Path;

use super::model::{AggregationResult, Record, REQUIRED_COLUMNS};
use crate::error::ExportError;

/// Which of the three downloads is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Category,
    Region,
    Dataset,
}

impl ExportKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::Category => "category.csv",
            ExportKind::Region => "region.csv",
            ExportKind::Dataset => "Data.csv",
        }
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Header row of key fields plus the value field; values to two decimals.
pub fn emit_aggregation_csv(result: &AggregationResult) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = result.key_fields.iter().map(String::as_str).collect();
    header.push(&result.value_field);
    wtr.write_record(&header)?;

    for (key, value) in &result.rows {
        let mut row: Vec<String> = key.clone();
        row.push(format!("{value:.2}"));
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

/// Filtered rows with every original column. Without source headers the
/// typed columns are written instead.
pub fn emit_records_csv(headers: &[String], records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    if headers.is_empty() {
        wtr.write_record(REQUIRED_COLUMNS)?;
        for r in records {
            wtr.write_record(&[
                r.order_date.format("%Y-%m-%d").to_string(),
                r.region.clone(),
                r.state.clone(),
                r.city.clone(),
                r.category.clone(),
                r.sub_category.clone(),
                r.segment.clone(),
                format!("{:.2}", r.sales),
                format!("{:.2}", r.profit),
                r.quantity.to_string(),
            ])?;
        }
    } else {
        wtr.write_record(headers)?;
        let width = headers.len();
        for r in records {
            // Ragged source rows are padded or cut to the header width.
            let cells = (0..width).map(|i| r.raw.get(i).map(String::as_str).unwrap_or(""));
            wtr.write_record(cells)?;
        }
    }
    finish(wtr)
}

/// Write export bytes to `path`.
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::sum_by;
    use crate::data::loader::parse_delimited;
    use crate::data::model::fixtures::*;
    use crate::data::model::{GroupField, ValueField};

    #[test]
    fn aggregation_csv_has_header_and_cents() {
        let res = sum_by(&sample(), &[GroupField::Region], ValueField::Sales);
        let text = String::from_utf8(emit_aggregation_csv(&res).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Region,Sales");
        assert_eq!(lines[1], "Central,64.75");
        assert_eq!(lines[2], "East,490.00");
        assert_eq!(lines[3], "West,435.75");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_aggregation_still_writes_header() {
        let res = sum_by(&[], &[GroupField::Category], ValueField::Sales);
        let text = String::from_utf8(emit_aggregation_csv(&res).unwrap()).unwrap();
        assert_eq!(text, "Category,Sales\n");
    }

    #[test]
    fn dataset_export_round_trips_original_columns() {
        let source = "Row ID,Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity\n\
                      7,1/2/2020,West,CA,\"Los Angeles, East\",Furniture,Chairs,Consumer,10.5,1,2\n";
        let ds = parse_delimited(source, b',').unwrap();
        let bytes = emit_records_csv(&ds.headers, &ds.records).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), source);
    }

    #[test]
    fn ragged_rows_are_padded_to_header_width() {
        let source = "Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity,Note\n\
                      1/2/2020,West,CA,LA,Furniture,Chairs,Consumer,10.5,1,2,gift\n\
                      1/3/2020,East,NY,NYC,Technology,Phones,Corporate,20,2,1\n";
        let ds = parse_delimited(source, b',').unwrap();
        assert_eq!(ds.records[1].raw.len(), 10);

        let text = String::from_utf8(emit_records_csv(&ds.headers, &ds.records).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "1/3/2020,East,NY,NYC,Technology,Phones,Corporate,20,2,1,");
    }

    #[test]
    fn typed_export_without_source_headers() {
        let bytes = emit_records_csv(&[], &two_records()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(REQUIRED_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("2023-01-05,West,CA,LA,Furniture,Chairs,Consumer,100.00,10.00,1")
        );
    }

    #[test]
    fn writes_export_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ExportKind::Region.file_name());
        write_export(&path, b"Region,Sales\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Region,Sales\n");
    }
}
