//! Scaling Error Types

use thiserror::Error;

/// Errors during scaler fit, transform or inverse
#[derive(Debug, Clone, Error)]
pub enum ScaleError {
    /// Nothing to fit on
    #[error("Insufficient data: cannot fit scaler on {0} rows")]
    InsufficientData(usize),

    /// Column unknown to the table or the fitted state
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Observed value that cannot define a range
    #[error("Column {column} holds a non-finite value")]
    NonFinite { column: String },

    /// Persisted state could not be read or written
    #[error("Invalid scaler state: {0}")]
    InvalidState(String),
}
