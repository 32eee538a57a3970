//! Min-Max Scaling
//!
//! Every column is scaled on its own `(min, max)` with no cross-column
//! coupling. This is what allows a single column to be inverted from a vector
//! holding only that column's scaled values: the inverse of column `c` reads
//! nothing but `c`'s range, so whatever sits in the other positions of a row
//! (placeholders, stale carried-forward features) cannot affect it.
//!
//! A zero-variance column (`min == max`) uses a unit span, so its fitted
//! values scale to `0.0` and the inverse adds `min` back.

use crate::ScaleError;
use chrono::NaiveDate;
use feature_engine::FeatureTable;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Learned range of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    /// Column name
    pub column: String,
    /// Minimum observed value
    pub min: f64,
    /// Maximum observed value
    pub max: f64,
}

impl ColumnRange {
    /// Check if the column had zero variance during fit
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    fn span(&self) -> f64 {
        if self.is_degenerate() {
            1.0
        } else {
            self.max - self.min
        }
    }

    /// Scale a raw value. Values outside the fitted range are not clamped.
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    /// Exact inverse of [`ColumnRange::scale`]
    pub fn unscale(&self, scaled: f64) -> f64 {
        scaled * self.span() + self.min
    }
}

/// Fitted per-column normalization state.
///
/// Owned by one forecasting run for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    ranges: Vec<ColumnRange>,
}

impl ScalerState {
    /// Build a state from explicit ranges
    pub fn from_ranges(ranges: Vec<ColumnRange>) -> Result<Self, ScaleError> {
        for range in &ranges {
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return Err(ScaleError::InvalidState(format!(
                    "column {} has range [{}, {}]",
                    range.column, range.min, range.max
                )));
            }
        }
        Ok(Self { ranges })
    }

    /// Ranges in column order
    pub fn ranges(&self) -> &[ColumnRange] {
        &self.ranges
    }

    /// Fitted column names in order
    pub fn columns(&self) -> Vec<&str> {
        self.ranges.iter().map(|r| r.column.as_str()).collect()
    }

    /// Range of one column
    pub fn range(&self, column: &str) -> Result<&ColumnRange, ScaleError> {
        self.ranges
            .iter()
            .find(|r| r.column == column)
            .ok_or_else(|| ScaleError::MissingColumn(column.to_string()))
    }

    /// Columns that had zero variance during fit
    pub fn degenerate_columns(&self) -> Vec<&str> {
        self.ranges
            .iter()
            .filter(|r| r.is_degenerate())
            .map(|r| r.column.as_str())
            .collect()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, ScaleError> {
        serde_json::to_string_pretty(self).map_err(|e| ScaleError::InvalidState(e.to_string()))
    }

    /// Deserialize from JSON, re-checking every range
    pub fn from_json(json: &str) -> Result<Self, ScaleError> {
        let state: ScalerState =
            serde_json::from_str(json).map_err(|e| ScaleError::InvalidState(e.to_string()))?;
        Self::from_ranges(state.ranges)
    }
}

/// Feature table expressed in scaled units
#[derive(Debug, Clone)]
pub struct ScaledTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ScaledTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Ordered column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scaled values (rows x columns)
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// One scaled row
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Latest row date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Column-independent min-max scaler
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxScaler;

impl MinMaxScaler {
    /// Learn `(min, max)` for each named column over all table rows
    pub fn fit<S: AsRef<str>>(table: &FeatureTable, columns: &[S]) -> Result<ScalerState, ScaleError> {
        if table.is_empty() {
            return Err(ScaleError::InsufficientData(0));
        }

        let mut ranges = Vec::with_capacity(columns.len());
        for name in columns {
            let name: &str = name.as_ref();
            let values = table
                .column(name)
                .ok_or_else(|| ScaleError::MissingColumn(name.to_string()))?;

            if values.iter().any(|v| !v.is_finite()) {
                return Err(ScaleError::NonFinite {
                    column: name.to_string(),
                });
            }

            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = ColumnRange {
                column: name.to_string(),
                min,
                max,
            };

            if range.is_degenerate() {
                warn!("Degenerate scale: column {} is constant at {}", name, min);
            }
            ranges.push(range);
        }

        debug!("Fitted scaler on {} columns over {} rows", ranges.len(), table.len());
        Ok(ScalerState { ranges })
    }

    /// Scale the fitted columns of a table, in the state's column order
    pub fn transform(table: &FeatureTable, state: &ScalerState) -> Result<ScaledTable, ScaleError> {
        let indices = state
            .ranges
            .iter()
            .map(|r| {
                table
                    .column_index(&r.column)
                    .ok_or_else(|| ScaleError::MissingColumn(r.column.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let raw = table.values();
        let values = Array2::from_shape_fn((table.len(), indices.len()), |(row, col)| {
            state.ranges[col].scale(raw[[row, indices[col]]])
        });

        Ok(ScaledTable {
            dates: table.dates().to_vec(),
            columns: state.ranges.iter().map(|r| r.column.clone()).collect(),
            values,
        })
    }

    /// Fit on every table column, then transform
    pub fn fit_transform(table: &FeatureTable) -> Result<(ScalerState, ScaledTable), ScaleError> {
        let state = Self::fit(table, table.columns())?;
        let scaled = Self::transform(table, &state)?;
        Ok((state, scaled))
    }

    /// Invert scaled values of a single column back to raw units
    pub fn inverse(values: &[f64], column: &str, state: &ScalerState) -> Result<Vec<f64>, ScaleError> {
        let range = state.range(column)?;
        Ok(values.iter().map(|&v| range.unscale(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(columns: &[&str], rows: Vec<Vec<f64>>) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let dates = start.iter_days().take(rows.len()).collect();
        let width = columns.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((flat.len() / width, width), flat).unwrap();
        FeatureTable::new(dates, columns.iter().map(|c| c.to_string()).collect(), values).unwrap()
    }

    #[test]
    fn test_minmax_normalization() {
        let t = table(
            &["icu_available", "month"],
            vec![vec![0.0, 1.0], vec![50.0, 6.0], vec![100.0, 12.0]],
        );
        let (state, scaled) = MinMaxScaler::fit_transform(&t).unwrap();

        assert_eq!(state.range("icu_available").unwrap().max, 100.0);
        assert!((scaled.values()[[1, 0]] - 0.5).abs() < 1e-12);
        assert_eq!(scaled.values()[[0, 1]], 0.0);
        assert_eq!(scaled.values()[[2, 1]], 1.0);
    }

    #[test]
    fn test_fit_empty_table() {
        let t = table(&["icu_available"], vec![]);
        assert!(matches!(
            MinMaxScaler::fit(&t, &["icu_available"]),
            Err(ScaleError::InsufficientData(0))
        ));
    }

    #[test]
    fn test_fit_missing_column() {
        let t = table(&["icu_available"], vec![vec![1.0]]);
        assert!(matches!(
            MinMaxScaler::fit(&t, &["available_nurses"]),
            Err(ScaleError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_out_of_range_not_clamped() {
        let t = table(&["x_available"], vec![vec![10.0], vec![20.0]]);
        let state = MinMaxScaler::fit(&t, &["x_available"]).unwrap();
        let range = state.range("x_available").unwrap();

        assert!((range.scale(30.0) - 2.0).abs() < 1e-12);
        assert!((range.scale(0.0) + 1.0).abs() < 1e-12);
        assert_eq!(MinMaxScaler::inverse(&[2.0, -1.0], "x_available", &state).unwrap(), vec![30.0, 0.0]);
    }

    #[test]
    fn test_degenerate_column() {
        let t = table(&["available_ventilators"], vec![vec![7.0], vec![7.0], vec![7.0]]);
        let (state, scaled) = MinMaxScaler::fit_transform(&t).unwrap();

        assert_eq!(state.degenerate_columns(), vec!["available_ventilators"]);
        assert!(scaled.values().iter().all(|&v| v == 0.0));

        let back = MinMaxScaler::inverse(&[0.0, 0.25], "available_ventilators", &state).unwrap();
        assert_eq!(back, vec![7.0, 7.25]);
        assert!(back.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_inverse_is_column_independent() {
        // Two columns with very different ranges
        let t = table(
            &["icu_available", "er_visits"],
            vec![vec![2.0, 100.0], vec![10.0, 400.0], vec![6.0, 250.0]],
        );
        let (state, scaled) = MinMaxScaler::fit_transform(&t).unwrap();

        // Inverting the target alone, from its own scaled values only
        let target: Vec<f64> = scaled.values().column(0).to_vec();
        let back = MinMaxScaler::inverse(&target, "icu_available", &state).unwrap();
        assert_eq!(back, vec![2.0, 10.0, 6.0]);

        // Refitting with a different companion column leaves the target range untouched
        let alone = MinMaxScaler::fit(&t, &["icu_available"]).unwrap();
        assert_eq!(alone.range("icu_available").unwrap(), state.range("icu_available").unwrap());
    }

    #[test]
    fn test_state_json_round_trip() {
        let t = table(&["available_doctors"], vec![vec![30.0], vec![45.0]]);
        let state = MinMaxScaler::fit(&t, &["available_doctors"]).unwrap();

        let json = state.to_json().unwrap();
        assert_eq!(ScalerState::from_json(&json).unwrap(), state);

        let broken = r#"{"ranges":[{"column":"a","min":5.0,"max":1.0}]}"#;
        assert!(ScalerState::from_json(broken).is_err());
    }

    proptest! {
        #[test]
        fn inverse_transform_round_trip(
            fit in prop::collection::vec(-1.0e4f64..1.0e4, 2..50),
            probe in prop::collection::vec(-1.0e5f64..1.0e5, 1..50),
        ) {
            let rows = fit.iter().map(|&v| vec![v]).collect();
            let t = table(&["icu_available"], rows);
            let state = MinMaxScaler::fit(&t, &["icu_available"]).unwrap();
            let range = state.range("icu_available").unwrap();

            let scaled: Vec<f64> = probe.iter().map(|&v| range.scale(v)).collect();
            let back = MinMaxScaler::inverse(&scaled, "icu_available", &state).unwrap();

            for (orig, restored) in probe.iter().zip(back.iter()) {
                let tolerance = 1e-9 * orig.abs().max(range.max.abs()).max(range.min.abs()).max(1.0);
                prop_assert!((orig - restored).abs() <= tolerance);
            }
        }
    }
}
