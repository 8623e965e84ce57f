use std::collections::BTreeSet;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    Record, SalesDataset, COL_CATEGORY, COL_CITY, COL_ORDER_DATE, COL_PROFIT, COL_QUANTITY,
    COL_REGION, COL_SALES, COL_SEGMENT, COL_STATE, COL_SUB_CATEGORY, REQUIRED_COLUMNS,
};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-delimited with a header row
/// * `.tsv`          – tab-delimited with a header row
/// * `.json`         – `[{ "Order Date": "...", "Region": "...", ... }, ...]`
/// * `.parquet`      – any column types; every cell is read as text
pub fn load_file(path: &Path) -> Result<SalesDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => load_delimited(path, b','),
        "tsv" => load_delimited(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }?;

    log::info!("Loaded {} from {}", dataset, path.display());
    Ok(dataset)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode as UTF-8, falling back to Latin-1 so stray bytes never abort a load.
pub fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Input is not valid UTF-8 ({e}); decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Row assembly shared by every format
// ---------------------------------------------------------------------------

/// Position of each required column within a source row.
struct ColumnIndex {
    order_date: usize,
    region: usize,
    state: usize,
    city: usize,
    category: usize,
    sub_category: usize,
    segment: usize,
    sales: usize,
    profit: usize,
    quantity: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        Ok(ColumnIndex {
            order_date: find(COL_ORDER_DATE)?,
            region: find(COL_REGION)?,
            state: find(COL_STATE)?,
            city: find(COL_CITY)?,
            category: find(COL_CATEGORY)?,
            sub_category: find(COL_SUB_CATEGORY)?,
            segment: find(COL_SEGMENT)?,
            sales: find(COL_SALES)?,
            profit: find(COL_PROFIT)?,
            quantity: find(COL_QUANTITY)?,
        })
    }
}

fn build_record(row: usize, cells: Vec<String>, idx: &ColumnIndex) -> Result<Record, LoadError> {
    let cell = |i: usize| cells.get(i).map(|s| s.trim()).unwrap_or("");

    let date_text = cell(idx.order_date);
    let order_date = parse_date(date_text).ok_or_else(|| LoadError::InvalidDate {
        row,
        column: COL_ORDER_DATE.to_string(),
        value: date_text.to_string(),
    })?;

    let sales = parse_amount(cell(idx.sales), row, COL_SALES)?;
    let profit = parse_amount(cell(idx.profit), row, COL_PROFIT)?;
    let quantity = parse_quantity(cell(idx.quantity), row)?;

    let text = |i: usize| cell(i).to_string();
    let (region, state, city) = (text(idx.region), text(idx.state), text(idx.city));
    let (category, sub_category, segment) =
        (text(idx.category), text(idx.sub_category), text(idx.segment));

    Ok(Record {
        order_date,
        region,
        state,
        city,
        category,
        sub_category,
        segment,
        sales,
        profit,
        quantity,
        raw: cells,
    })
}

fn rows_to_dataset(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<SalesDataset, LoadError> {
    let idx = ColumnIndex::resolve(&headers)?;
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, cells)| build_record(i + 1, cells, &idx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SalesDataset::from_records(headers, records))
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const SHORT_YEAR_FORMATS: [&str; 2] = ["%m/%d/%y", "%m-%d-%y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Lenient mixed-format date parser; month-first when ambiguous.
/// Any time-of-day part is discarded.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Four-digit-year formats also accept "1/5/23" as year 23; reject those
    // so the two-digit forms get a chance.
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if d.year() >= 100 {
                return Some(d);
            }
        }
    }
    for fmt in SHORT_YEAR_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Currency cell: tolerates `$`, thousands separators and surrounding space.
fn parse_amount(s: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| LoadError::InvalidNumber {
            row,
            column: column.to_string(),
            value: s.to_string(),
        })
}

fn parse_quantity(s: &str, row: usize) -> Result<u32, LoadError> {
    if let Ok(q) = s.parse::<u32>() {
        return Ok(q);
    }
    // Exporters that go through floats write "3.0".
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => Err(LoadError::InvalidNumber {
            row,
            column: COL_QUANTITY.to_string(),
            value: s.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<SalesDataset, LoadError> {
    let text = decode_text(read_bytes(path)?);
    parse_delimited(&text, delimiter)
}

/// Parse delimited text with a header row.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<SalesDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    rows_to_dataset(headers, rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Order Date": "11/8/2016", "Region": "South", "Sales": 261.96, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SalesDataset, LoadError> {
    let text = decode_text(read_bytes(path)?);
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<SalesDataset, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Format("expected top-level JSON array".into()))?;

    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Format(format!("row {} is not a JSON object", i + 1)))?;
        objects.push(obj);
    }

    // Required columns first, then any extras in key order.
    let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut extras: BTreeSet<&str> = BTreeSet::new();
    for obj in &objects {
        for key in obj.keys() {
            if !REQUIRED_COLUMNS.contains(&key.as_str()) {
                extras.insert(key.as_str());
            }
        }
    }
    headers.extend(extras.into_iter().map(str::to_string));

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    rows_to_dataset(headers, rows)
}

fn json_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas (`df.to_parquet()`) or Polars.
///
/// Every column is cast to UTF-8 and goes through the same cell parsers as
/// CSV, so dates may be stored as `Date32`, timestamps or strings.
fn load_parquet(path: &Path) -> Result<SalesDataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        if headers.is_none() {
            headers = Some(schema.fields().iter().map(|f| f.name().clone()).collect());
        }

        let text_columns = batch
            .columns()
            .iter()
            .map(|col| cast(col, &DataType::Utf8))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let cells = text_columns
                .iter()
                .map(|col| {
                    if col.is_null(row) {
                        String::new()
                    } else {
                        col.as_string::<i32>().value(row).to_string()
                    }
                })
                .collect();
            rows.push(cells);
        }
    }

    rows_to_dataset(headers.unwrap_or_default(), rows)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::ArrayRef;

    use super::*;
    use crate::data::model::fixtures::date;

    const HEADER: &str =
        "Row ID,Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text
    }

    #[test]
    fn parses_mixed_date_formats() {
        assert_eq!(parse_date("2023-01-05"), Some(date(2023, 1, 5)));
        assert_eq!(parse_date("11/8/2016"), Some(date(2016, 11, 8)));
        assert_eq!(parse_date("6-12-2016"), Some(date(2016, 6, 12)));
        assert_eq!(parse_date("1/5/23"), Some(date(2023, 1, 5)));
        assert_eq!(parse_date("March 3, 2021"), Some(date(2021, 3, 3)));
        assert_eq!(parse_date("2020-07-01 13:45:00"), Some(date(2020, 7, 1)));
        assert_eq!(parse_date("2020-07-01T00:00:00"), Some(date(2020, 7, 1)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn loads_csv_rows_and_keeps_raw_cells() {
        let text = csv_with(&[
            "1,11/8/2016,South,Kentucky,Henderson,Furniture,Bookcases,Consumer,261.96,41.9136,2",
            "2,6/12/2016,West,California,Los Angeles,Office Supplies,Labels,Corporate,\"$1,014.62\",6.87,3",
        ]);
        let ds = parse_delimited(&text, b',').unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.headers[0], "Row ID");
        let r = &ds.records[1];
        assert_eq!(r.order_date, date(2016, 6, 12));
        assert_eq!(r.city, "Los Angeles");
        assert!((r.sales - 1014.62).abs() < 1e-9);
        assert_eq!(r.quantity, 3);
        assert_eq!(r.raw.len(), 11);
        assert_eq!(r.raw[0], "2");
    }

    #[test]
    fn missing_column_is_an_error() {
        let text = "Order Date,Region\n1/1/2020,West";
        match parse_delimited(text, b',') {
            Err(LoadError::MissingColumn(col)) => assert_eq!(col, "State"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn malformed_date_is_fatal() {
        let text = csv_with(&[
            "1,1/1/2020,West,CA,LA,Furniture,Chairs,Consumer,10,1,1",
            "2,someday,West,CA,LA,Furniture,Chairs,Consumer,10,1,1",
        ]);
        match parse_delimited(&text, b',') {
            Err(LoadError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "someday");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn bad_quantity_is_rejected() {
        let text = csv_with(&["1,1/1/2020,West,CA,LA,Furniture,Chairs,Consumer,10,1,-2"]);
        assert!(matches!(
            parse_delimited(&text, b','),
            Err(LoadError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn latin1_bytes_are_tolerated() {
        let mut bytes = csv_with(&["1,1/1/2020,West,CA,San Jos"]).into_bytes();
        bytes.push(0xE9);
        bytes.extend_from_slice(b",Furniture,Chairs,Consumer,10,1,1");

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&bytes).unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.records[0].city, "San José");
    }

    #[test]
    fn loads_tab_delimited_file() {
        let text = csv_with(&["1,1/1/2020,West,CA,LA,Furniture,Chairs,Consumer,10,1,1"]).replace(',', "\t");
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.records[0].state, "CA");
    }

    #[test]
    fn loads_json_records() {
        let text = r#"[
            {"Order Date": "2021-04-02", "Region": "East", "State": "NY", "City": "NYC",
             "Category": "Technology", "Sub-Category": "Phones", "Segment": "Home Office",
             "Sales": 99.5, "Profit": -3.25, "Quantity": 4, "Customer": "A. B."}
        ]"#;
        let ds = parse_json(text).unwrap();
        let r = &ds.records[0];
        assert_eq!(r.order_date, date(2021, 4, 2));
        assert_eq!(r.profit, -3.25);
        assert_eq!(r.quantity, 4);
        assert_eq!(ds.headers.last().map(String::as_str), Some("Customer"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("sales.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "xlsx"));
    }

    fn write_parquet(path: &Path, order_date: ArrayRef) {
        use std::sync::Arc;

        use arrow::array::{Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let text = |v: &str| -> ArrayRef { Arc::new(StringArray::from(vec![v])) };
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_ORDER_DATE, order_date.data_type().clone(), false),
            Field::new(COL_REGION, DataType::Utf8, false),
            Field::new(COL_STATE, DataType::Utf8, false),
            Field::new(COL_CITY, DataType::Utf8, false),
            Field::new(COL_CATEGORY, DataType::Utf8, false),
            Field::new(COL_SUB_CATEGORY, DataType::Utf8, false),
            Field::new(COL_SEGMENT, DataType::Utf8, false),
            Field::new(COL_SALES, DataType::Float64, false),
            Field::new(COL_PROFIT, DataType::Float64, false),
            Field::new(COL_QUANTITY, DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                order_date,
                text("West"),
                text("CA"),
                text("LA"),
                text("Furniture"),
                text("Chairs"),
                text("Consumer"),
                Arc::new(Float64Array::from(vec![261.96])),
                Arc::new(Float64Array::from(vec![41.5])),
                Arc::new(Int64Array::from(vec![2])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn loads_parquet_with_date32_column() {
        use arrow::array::Date32Array;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.parquet");
        write_parquet(&path, std::sync::Arc::new(Date32Array::from(vec![18300])));

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        let r = &ds.records[0];
        assert_eq!(r.order_date, date(2020, 2, 8));
        assert_eq!(r.city, "LA");
        assert!((r.sales - 261.96).abs() < 1e-9);
        assert_eq!(r.quantity, 2);
    }

    #[test]
    fn loads_parquet_with_timestamp_column() {
        use arrow::array::TimestampNanosecondArray;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.pq");
        let nanos = 1_600_000_000_i64 * 1_000_000_000;
        write_parquet(
            &path,
            std::sync::Arc::new(TimestampNanosecondArray::from(vec![nanos])),
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records[0].order_date, date(2020, 9, 13));
        assert_eq!(ds.headers[0], COL_ORDER_DATE);
    }
}
