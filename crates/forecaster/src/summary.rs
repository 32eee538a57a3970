//! Resource Status and Visit Trends

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time_series::{RawSeries, SeriesError};

/// Capacity snapshot of one resource on the latest recorded day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub total: f64,
    /// Never exceeds `total`
    pub available: f64,
}

impl ResourceStatus {
    /// Share of capacity in use, or `None` with no capacity
    pub fn utilization(&self) -> Option<f64> {
        (self.total > 0.0).then(|| (self.total - self.available) / self.total)
    }
}

/// Sum of one column over a calendar period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Period start (the day itself, or the first of the month)
    pub period: NaiveDate,
    pub total: f64,
}

fn defined(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// How the capacity total of a resource is read from its history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityRule {
    /// Total recorded on the latest day
    #[default]
    Latest,
    /// Largest total ever recorded (staff rosters)
    Max,
}

/// Latest totals and availability of a resource.
///
/// Undefined cells and an empty series read as zero.
pub fn latest_status(
    series: &RawSeries,
    total_column: &str,
    available_column: &str,
) -> Result<ResourceStatus, SeriesError> {
    resource_status(series, total_column, available_column, CapacityRule::Latest)
}

/// Latest availability of a resource against a total read per `rule`
pub fn resource_status(
    series: &RawSeries,
    total_column: &str,
    available_column: &str,
    rule: CapacityRule,
) -> Result<ResourceStatus, SeriesError> {
    let total = match rule {
        CapacityRule::Latest => defined(series.latest(total_column)?.unwrap_or(0.0)),
        CapacityRule::Max => series
            .column(total_column)?
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max),
    };
    let available = defined(series.latest(available_column)?.unwrap_or(0.0));
    Ok(ResourceStatus {
        total,
        available: available.min(total),
    })
}

fn sum_by_period<F>(series: &RawSeries, column: &str, period_of: F) -> Result<BTreeMap<NaiveDate, f64>, SeriesError>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let values = series.column(column)?;
    let mut sums = BTreeMap::new();
    for (date, value) in series.dates().iter().zip(values.iter()) {
        *sums.entry(period_of(*date)).or_insert(0.0) += defined(*value);
    }
    Ok(sums)
}

/// Per-day sums of `column`, every day from first to last date present
pub fn daily_totals(series: &RawSeries, column: &str) -> Result<Vec<TrendPoint>, SeriesError> {
    let sums = sum_by_period(series, column, |date| date)?;
    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(Vec::new()),
    };

    Ok(first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|period| TrendPoint {
            period,
            total: sums.get(&period).copied().unwrap_or(0.0),
        })
        .collect())
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// Per-month sums of `column`, keyed by the first of each month
pub fn monthly_totals(series: &RawSeries, column: &str) -> Result<Vec<TrendPoint>, SeriesError> {
    let sums = sum_by_period(series, column, month_start)?;
    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => (month_start(first), month_start(last)),
        _ => return Ok(Vec::new()),
    };

    let mut points = Vec::new();
    let mut period = Some(first);
    while let Some(month) = period.filter(|m| *m <= last) {
        points.push(TrendPoint {
            period: month,
            total: sums.get(&month).copied().unwrap_or(0.0),
        });
        period = next_month(month);
    }
    Ok(points)
}
