//! Sliding Window Construction
//!
//! Provides a fixed-length ring of feature rows and the builder that slices
//! scaled tables into model-ready windows.

mod builder;
mod window;

pub use builder::{TrainingSample, WindowBuilder, DEFAULT_WINDOW_LENGTH};
pub use window::Window;

use thiserror::Error;

/// Errors during window construction
#[derive(Debug, Clone, Error)]
pub enum WindowError {
    #[error("Insufficient history: need {required} rows, got {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[error("Row width mismatch: window holds {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Window length must be positive")]
    ZeroLength,
}
