/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalesDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range, then region → state → city
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  grouped sums, monthly buckets, pivot
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  CSV bytes for the download buttons
///   └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
