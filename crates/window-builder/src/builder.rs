//! Window Builder

use crate::window::Window;
use crate::WindowError;
use ndarray::s;
use scaler::ScaledTable;
use tracing::debug;

/// Default window length (days of history per model input)
pub const DEFAULT_WINDOW_LENGTH: usize = 30;

/// One model input paired with the target value that follows it
#[derive(Debug, Clone)]
pub struct TrainingSample {
    /// Rows `i - L .. i`
    pub window: Window,
    /// Scaled target at row `i`
    pub target: f64,
}

/// Slices scaled tables into fixed-length windows
#[derive(Debug, Clone, Copy)]
pub struct WindowBuilder {
    length: usize,
}

impl WindowBuilder {
    /// Create a builder for windows of `length` rows
    pub fn new(length: usize) -> Result<Self, WindowError> {
        if length == 0 {
            return Err(WindowError::ZeroLength);
        }
        Ok(Self { length })
    }

    /// Window length
    pub fn length(&self) -> usize {
        self.length
    }

    fn check_history(&self, table: &ScaledTable) -> Result<(), WindowError> {
        if table.len() < self.length {
            return Err(WindowError::InsufficientHistory {
                required: self.length,
                available: table.len(),
            });
        }
        Ok(())
    }

    /// Every window `table[i - L .. i]` with the target at row `i`, for `i` in `L..len`
    pub fn build(
        &self,
        table: &ScaledTable,
        target_column: &str,
    ) -> Result<Vec<TrainingSample>, WindowError> {
        self.check_history(table)?;
        let target_idx = table
            .column_index(target_column)
            .ok_or_else(|| WindowError::MissingColumn(target_column.to_string()))?;

        let values = table.values();
        let samples = (self.length..table.len())
            .map(|i| {
                Ok(TrainingSample {
                    window: Window::from_rows(values.slice(s![i - self.length..i, ..]))?,
                    target: values[[i, target_idx]],
                })
            })
            .collect::<Result<Vec<_>, WindowError>>()?;

        debug!("Built {} windows of length {}", samples.len(), self.length);
        Ok(samples)
    }

    /// The most recent `L` rows, used to seed a forecast
    pub fn latest(&self, table: &ScaledTable) -> Result<Window, WindowError> {
        self.check_history(table)?;
        let values = table.values();
        Window::from_rows(values.slice(s![table.len() - self.length.., ..]))
    }
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self {
            length: DEFAULT_WINDOW_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use feature_engine::FeatureTable;
    use ndarray::Array2;
    use proptest::prelude::*;
    use scaler::MinMaxScaler;

    fn scaled(rows: usize) -> ScaledTable {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let dates = start.iter_days().take(rows).collect();
        let values = Array2::from_shape_fn((rows, 2), |(r, c)| (r * 2 + c) as f64);
        let table = FeatureTable::new(
            dates,
            vec!["available_nurses".to_string(), "holiday_flag".to_string()],
            values,
        )
        .unwrap();
        MinMaxScaler::fit_transform(&table).unwrap().1
    }

    #[test]
    fn test_build_pairs() {
        let table = scaled(35);
        let builder = WindowBuilder::default();
        let samples = builder.build(&table, "available_nurses").unwrap();

        assert_eq!(samples.len(), 5);
        let first = &samples[0];
        assert_eq!(first.window.len(), 30);
        assert_eq!(first.window.row(0), table.row(0).to_vec().as_slice());
        assert_eq!(first.target, table.values()[[30, 0]]);
    }

    #[test]
    fn test_insufficient_history() {
        let table = scaled(29);
        let builder = WindowBuilder::default();
        assert!(matches!(
            builder.build(&table, "available_nurses"),
            Err(WindowError::InsufficientHistory { required: 30, available: 29 })
        ));
        assert!(builder.latest(&table).is_err());
    }

    #[test]
    fn test_exact_length_has_no_pairs_but_a_latest_window() {
        let table = scaled(30);
        let builder = WindowBuilder::default();
        assert!(builder.build(&table, "available_nurses").unwrap().is_empty());
        assert_eq!(builder.latest(&table).unwrap().len(), 30);
    }

    #[test]
    fn test_latest_window() {
        let table = scaled(40);
        let window = WindowBuilder::new(5).unwrap().latest(&table).unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window.last_row(), table.row(39).to_vec().as_slice());
        assert_eq!(window.row(0), table.row(35).to_vec().as_slice());
    }

    #[test]
    fn test_unknown_target() {
        let table = scaled(31);
        assert!(matches!(
            WindowBuilder::default().build(&table, "icu_available"),
            Err(WindowError::MissingColumn(_))
        ));
    }

    proptest! {
        #[test]
        fn windows_always_have_requested_length(rows in 1usize..80, length in 1usize..40) {
            let table = scaled(rows);
            let builder = WindowBuilder::new(length).unwrap();
            match builder.build(&table, "holiday_flag") {
                Ok(samples) => {
                    prop_assert!(rows >= length);
                    prop_assert_eq!(samples.len(), rows - length);
                    for sample in &samples {
                        prop_assert_eq!(sample.window.len(), length);
                    }
                }
                Err(WindowError::InsufficientHistory { required, available }) => {
                    prop_assert!(rows < length);
                    prop_assert_eq!((required, available), (length, rows));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
