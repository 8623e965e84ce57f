use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source file into a [`SalesDataset`](crate::data::model::SalesDataset).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: invalid date '{value}' in '{column}'")]
    InvalidDate {
        /// 1-based data row, header excluded.
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: '{value}' in '{column}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Format(String),

    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("decoding arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failure while encoding or writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("encoding CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("flushing CSV buffer: {0}")]
    Buffer(String),

    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The current filter combination matched no rows. Not fatal: downstream
/// aggregations are simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no records match the selected date range and filters")]
pub struct EmptyResultWarning;
