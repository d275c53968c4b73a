use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems with an input or output table. These abort the run.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Required column '{column}' not found in input table")]
    MissingColumn { column: String },

    #[error("Column '{column}' has unexpected type: {source}")]
    ColumnType {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Unparseable date '{value}' for station '{station}'")]
    InvalidDate { station: String, value: String },

    #[error("Invalid value in column '{column}' at row {row}: {message}")]
    InvalidValue {
        column: String,
        row: usize,
        message: String,
    },

    #[error("Duplicate observation for station '{station}' on {date}")]
    DuplicateKey { station: String, date: NaiveDate },

    #[error("I/O error accessing '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to read CSV file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed to write CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    Frame(#[from] PolarsError),
}
