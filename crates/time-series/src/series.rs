//! Raw Daily Series

use crate::SeriesError;
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One day of raw measurements, positional against the series columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

impl Observation {
    /// Create a new observation
    pub fn new(date: NaiveDate, values: Vec<f64>) -> Self {
        Self { date, values }
    }
}

/// Time-ordered table of daily observations.
///
/// Dates are strictly increasing and duplicate-free. Gaps between dates are
/// kept as-is; no calendar days are inferred or filled. Undefined cells are
/// stored as NaN.
#[derive(Debug, Clone)]
pub struct RawSeries {
    /// Measurement column names (timestamp excluded)
    columns: Vec<String>,
    /// One date per row
    dates: Vec<NaiveDate>,
    /// Row-major measurements (rows x columns)
    values: Array2<f64>,
}

impl RawSeries {
    /// Build a series from unordered observations.
    ///
    /// Rows are sorted by date. When several rows share a date the one read
    /// last wins.
    pub fn from_observations(
        columns: Vec<String>,
        mut rows: Vec<Observation>,
    ) -> Result<Self, SeriesError> {
        let width = columns.len();
        if let Some(bad) = rows.iter().find(|r| r.values.len() != width) {
            return Err(SeriesError::RowWidth {
                date: bad.date,
                expected: width,
                actual: bad.values.len(),
            });
        }

        // Stable sort keeps read order among equal dates
        rows.sort_by_key(|r| r.date);

        let mut deduped: Vec<Observation> = Vec::with_capacity(rows.len());
        let mut duplicates = 0usize;
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.date == row.date => {
                    *last = row;
                    duplicates += 1;
                }
                _ => deduped.push(row),
            }
        }
        if duplicates > 0 {
            warn!("Replaced {} duplicate-dated rows (latest entry kept)", duplicates);
        }

        let dates: Vec<NaiveDate> = deduped.iter().map(|r| r.date).collect();
        let flat: Vec<f64> = deduped.into_iter().flat_map(|r| r.values).collect();
        let values = Array2::from_shape_vec((dates.len(), width), flat)
            .map_err(|e| SeriesError::Csv(format!("shape error: {}", e)))?;

        debug!("Built series: {} rows x {} columns", dates.len(), width);

        Ok(Self {
            columns,
            dates,
            values,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the series has no rows
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Measurement column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row dates in increasing order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All measurements (rows x columns)
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Earliest date, if any
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Latest date, if any
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column in date order
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>, SeriesError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| SeriesError::MissingColumn(name.to_string()))?;
        Ok(self.values.index_axis(Axis(1), idx))
    }

    /// Fail with the first column of `names` that the series lacks
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<(), SeriesError> {
        for name in names {
            let name = name.as_ref();
            if self.column_index(name).is_none() {
                return Err(SeriesError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Value of a column on the latest row
    pub fn latest(&self, name: &str) -> Result<Option<f64>, SeriesError> {
        let column = self.column(name)?;
        Ok(column.iter().last().copied())
    }
}
