//! Error taxonomy for loading and chart configuration.

use thiserror::Error;

/// The uploaded file could not be turned into a table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file type: '{0}' (expected .csv, .xlsx, .xls, .ods or .json)")]
    UnsupportedFormat(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("File contains no columns")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The column selection does not fit the chosen chart kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{0}' is not a datetime column")]
    NotDatetime(String),

    #[error("No categorical columns detected.")]
    NoCategoricalColumn,

    #[error("No datetime columns detected.")]
    NoDatetimeColumn,

    #[error("No numeric columns selected.")]
    NoNumericColumns,

    #[error("Correlation heatmap needs at least two numeric columns (found {0})")]
    TooFewNumericColumns(usize),

    #[error("Pie chart of '{0}' has negative group sums")]
    NegativePieValues(String),

    #[error("Filter must be written as COLUMN=VALUE, got '{0}'")]
    MalformedFilter(String),

    #[error("No data loaded. Upload a file first.")]
    NoTable,
}
