//! Feature Scaling
//!
//! Fits per-column min-max normalization on feature tables and applies or
//! inverts it exactly.

mod error;
mod min_max;

pub use error::ScaleError;
pub use min_max::{ColumnRange, MinMaxScaler, ScaledTable, ScalerState};
