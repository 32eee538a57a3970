//! Series Error Types

use chrono::NaiveDate;
use thiserror::Error;

/// Errors while loading or querying a raw series
#[derive(Debug, Clone, Error)]
pub enum SeriesError {
    /// A required column is absent from the table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// An observation does not match the header width
    #[error("Row dated {date} has {actual} values, expected {expected}")]
    RowWidth {
        date: NaiveDate,
        expected: usize,
        actual: usize,
    },

    /// Underlying file could not be read
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Malformed delimited text
    #[error("Malformed CSV: {0}")]
    Csv(String),

    /// Provider has no series under this name
    #[error("Unknown series source: {0}")]
    SourceNotFound(String),
}

impl From<csv::Error> for SeriesError {
    fn from(err: csv::Error) -> Self {
        SeriesError::Csv(err.to_string())
    }
}
