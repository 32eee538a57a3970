//! Feature Engineering Engine
//!
//! Derives lag and trailing rolling-window features from raw daily series,
//! producing fully-defined, leakage-safe feature tables.

mod features;
mod statistics;
mod table;

pub use features::{ColumnRole, FeatureConfig, FeatureEngineer, DEFAULT_LAGS, DEFAULT_ROLLING_WINDOWS};
pub use statistics::{lagged, rolling, TrailingStatistics};
pub use table::FeatureTable;

use thiserror::Error;
use time_series::SeriesError;

/// Errors during feature construction
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error("Insufficient data: need at least {required} rows, got {available} with no complete feature row")]
    InsufficientData { required: usize, available: usize },
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),
    #[error("Feature table shape mismatch: expected {rows}x{columns}, got {actual:?}")]
    ShapeMismatch {
        rows: usize,
        columns: usize,
        actual: (usize, usize),
    },
}
