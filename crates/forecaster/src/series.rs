//! Forecast Series and the Combined Table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contiguous calendar days following `last`
pub fn future_dates(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    last.iter_days().skip(1).take(count).collect()
}

/// One forecast day in original units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast of one target column, one point per future day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    label: String,
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Pair `values` with the days following `last_observed`
    pub fn new(label: impl Into<String>, last_observed: NaiveDate, values: &[f64]) -> Self {
        let points = future_dates(last_observed, values.len())
            .into_iter()
            .zip(values.iter())
            .map(|(date, &value)| ForecastPoint { date, value })
            .collect();

        Self {
            label: label.into(),
            points,
        }
    }

    /// Output column label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Forecast points, earliest first
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Number of forecast days
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Forecast values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value forecast for `date`, if any
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points.iter().find(|p| p.date == date).map(|p| p.value)
    }
}

/// Forecasts of several resources aligned on one date index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastTable {
    dates: Vec<NaiveDate>,
    labels: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl ForecastTable {
    /// Align series on every calendar day from the earliest to the latest
    /// forecast date, columns in the order given.
    ///
    /// Days a series does not cover are left empty, so the index has no gaps
    /// even when resources were last observed on different days.
    pub fn from_series(series: &[ForecastSeries]) -> Self {
        let labels = series.iter().map(|s| s.label().to_string()).collect();
        let span = series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.date))
            .fold(None, |span: Option<(NaiveDate, NaiveDate)>, date| match span {
                Some((first, last)) => Some((first.min(date), last.max(date))),
                None => Some((date, date)),
            });
        let Some((first, last)) = span else {
            return Self {
                labels,
                ..Self::default()
            };
        };

        let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
        let mut cells = vec![vec![None; series.len()]; dates.len()];
        for (col, s) in series.iter().enumerate() {
            for point in s.points() {
                let row = (point.date - first).num_days() as usize;
                cells[row][col] = Some(point.value);
            }
        }

        Self {
            dates,
            labels,
            cells,
        }
    }

    /// Date index, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Cells of row `index`, one per label
    pub fn row(&self, index: usize) -> &[Option<f64>] {
        &self.cells[index]
    }

    /// Iterate over `(date, cells)` rows
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[Option<f64>])> + '_ {
        self.dates.iter().copied().zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Cell for `label` on `date`
    pub fn get(&self, date: NaiveDate, label: &str) -> Option<f64> {
        let col = self.labels.iter().position(|l| l == label)?;
        let row = self.dates.binary_search(&date).ok()?;
        self.cells[row][col]
    }
}
