//! Engineered Feature Table

use crate::FeatureError;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Fully-defined feature rows in date order.
///
/// Columns are positional: training and inference must build tables with the
/// same column list.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Create a table, checking that shapes agree
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self, FeatureError> {
        if values.nrows() != dates.len() || values.ncols() != columns.len() {
            return Err(FeatureError::ShapeMismatch {
                rows: dates.len(),
                columns: columns.len(),
                actual: values.dim(),
            });
        }
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

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

    /// Ordered feature column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Feature values (rows x columns)
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Latest row date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a feature column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one feature column
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name)
            .map(|idx| self.values.index_axis(Axis(1), idx))
    }
}
