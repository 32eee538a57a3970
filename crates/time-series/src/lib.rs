//! Time Series Ingestion
//!
//! Provides the raw daily series model, CSV ingestion and series providers.

mod error;
mod provider;
mod reader;
mod series;

pub use error::SeriesError;
pub use provider::{CsvSource, SeriesProvider};
pub use reader::{read_csv, read_csv_from, CsvOptions};
pub use series::{Observation, RawSeries};
