//! Lag and Rolling Feature Construction

use crate::statistics::{lagged, rolling};
use crate::table::FeatureTable;
use crate::FeatureError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use time_series::RawSeries;
use tracing::debug;

/// Default lag offsets (days)
pub const DEFAULT_LAGS: [usize; 4] = [1, 3, 7, 14];

/// Default trailing rolling windows (days)
pub const DEFAULT_ROLLING_WINDOWS: [usize; 2] = [3, 7];

/// Semantic role of a base column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Current availability of a resource; lagged and rolled
    Availability,
    /// Calendar, static or total field; passed through untouched
    Passthrough,
}

/// Feature construction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Lag offsets in rows
    pub lags: Vec<usize>,
    /// Trailing window sizes in rows
    pub rolling_windows: Vec<usize>,
    /// Substring marking a column as current availability
    pub availability_marker: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: DEFAULT_LAGS.to_vec(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            availability_marker: "available".to_string(),
        }
    }
}

impl FeatureConfig {
    /// Role of a base column
    pub fn role(&self, column: &str) -> ColumnRole {
        if column.contains(&self.availability_marker) {
            ColumnRole::Availability
        } else {
            ColumnRole::Passthrough
        }
    }

    /// Leading rows whose derived values are undefined
    pub fn warmup_rows(&self) -> usize {
        let max_lag = self.lags.iter().copied().max().unwrap_or(0);
        let max_window = self.rolling_windows.iter().copied().max().unwrap_or(0);
        max_lag.max(max_window.saturating_sub(1))
    }

    fn validate(&self) -> Result<(), FeatureError> {
        if let Some(&w) = self.rolling_windows.iter().find(|&&w| w < 2) {
            return Err(FeatureError::InvalidConfig(format!(
                "rolling window {} is too short for a sample standard deviation",
                w
            )));
        }
        if self.lags.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "lag offset 0 duplicates the base column".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds leakage-safe feature tables from raw series
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    /// Create a new feature engineer
    pub fn new(config: FeatureConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Final ordered column list for a set of base columns.
    ///
    /// Base columns come first in input order, then for each availability
    /// column its lags followed by its rolling mean/std pairs.
    pub fn feature_columns<S: AsRef<str>>(&self, base_columns: &[S]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for base in base_columns {
            let base: &str = base.as_ref();
            names.push(base.to_string());
        }

        for base in base_columns {
            let base: &str = base.as_ref();
            if self.config.role(base) != ColumnRole::Availability {
                continue;
            }
            for lag in &self.config.lags {
                names.push(format!("{}_lag{}", base, lag));
            }
            for window in &self.config.rolling_windows {
                names.push(format!("{}_roll_mean{}", base, window));
                names.push(format!("{}_roll_std{}", base, window));
            }
        }

        names
    }

    /// Derive the feature table.
    ///
    /// Rows with any undefined feature value (the warm-up rows, and rows
    /// touched by undefined raw cells) are dropped, never imputed.
    pub fn build<S: AsRef<str>>(
        &self,
        series: &RawSeries,
        base_columns: &[S],
    ) -> Result<FeatureTable, FeatureError> {
        series.require_columns(base_columns)?;

        let names = self.feature_columns(base_columns);
        let mut derived: Vec<Vec<f64>> = Vec::with_capacity(names.len());

        for base in base_columns {
            let base: &str = base.as_ref();
            derived.push(series.column(base)?.to_vec());
        }

        let mut has_availability = false;
        for base in base_columns {
            let base: &str = base.as_ref();
            if self.config.role(base) != ColumnRole::Availability {
                continue;
            }
            has_availability = true;

            let raw = series.column(base)?.to_vec();
            for &lag in &self.config.lags {
                derived.push(lagged(&raw, lag));
            }
            for &window in &self.config.rolling_windows {
                let stats = rolling(&raw, window);
                derived.push(stats.iter().map(|s| s.map_or(f64::NAN, |s| s.mean)).collect());
                derived.push(stats.iter().map(|s| s.map_or(f64::NAN, |s| s.std_dev)).collect());
            }
        }

        let warmup = if has_availability {
            self.config.warmup_rows()
        } else {
            0
        };

        let keep: Vec<usize> = (0..series.len())
            .filter(|&row| derived.iter().all(|col| col[row].is_finite()))
            .collect();

        if keep.is_empty() {
            return Err(FeatureError::InsufficientData {
                required: warmup + 1,
                available: series.len(),
            });
        }

        debug!(
            "Derived {} features; kept {} of {} rows (warm-up {})",
            names.len(),
            keep.len(),
            series.len(),
            warmup
        );

        let values = Array2::from_shape_fn((keep.len(), names.len()), |(r, c)| derived[c][keep[r]]);
        let dates = keep.iter().map(|&row| series.dates()[row]).collect();

        FeatureTable::new(dates, names, values)
    }
}
