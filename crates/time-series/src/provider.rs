//! Series Providers

use crate::reader::{read_csv, CsvOptions};
use crate::series::RawSeries;
use crate::SeriesError;
use std::collections::HashMap;

/// Source of raw series, keyed by a source name (usually a file path)
pub trait SeriesProvider {
    /// Load a fresh copy of the named series
    fn load(&self, source: &str) -> Result<RawSeries, SeriesError>;
}

/// Provider that reads CSV files from disk
#[derive(Debug, Clone, Default)]
pub struct CsvSource {
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV provider
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }
}

impl SeriesProvider for CsvSource {
    fn load(&self, source: &str) -> Result<RawSeries, SeriesError> {
        read_csv(source, &self.options)
    }
}

impl SeriesProvider for HashMap<String, RawSeries> {
    fn load(&self, source: &str) -> Result<RawSeries, SeriesError> {
        self.get(source)
            .cloned()
            .ok_or_else(|| SeriesError::SourceNotFound(source.to_string()))
    }
}
