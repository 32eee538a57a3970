//! CSV Series Reader

use crate::series::{Observation, RawSeries};
use crate::SeriesError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// CSV reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Header of the timestamp column
    pub date_column: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
        }
    }
}

/// Read a daily series from a CSV file
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<RawSeries, SeriesError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SeriesError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let series = read_csv_from(BufReader::new(file), options)?;
    info!("Loaded {} rows from {}", series.len(), path.display());
    Ok(series)
}

/// Read a daily series from any CSV source.
///
/// Rows with a blank or unparsable timestamp are skipped. Blank or
/// non-numeric cells become NaN.
pub fn read_csv_from<R: Read>(reader: R, options: &CsvOptions) -> Result<RawSeries, SeriesError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == options.date_column)
        .ok_or_else(|| SeriesError::MissingColumn(options.date_column.clone()))?;

    let value_indices: Vec<usize> = (0..headers.len()).filter(|&i| i != date_idx).collect();
    let columns: Vec<String> = value_indices
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let raw_date = record.get(date_idx).unwrap_or("");
        let Some(date) = parse_date(raw_date) else {
            debug!("Skipping line {}: unparsable date {:?}", line + 2, raw_date);
            skipped += 1;
            continue;
        };

        let values = value_indices
            .iter()
            .map(|&i| record.get(i).map(parse_value).unwrap_or(f64::NAN))
            .collect();
        rows.push(Observation::new(date, values));
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a valid '{}'", skipped, options.date_column);
    }

    RawSeries::from_observations(columns, rows)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()).ok())
}

fn parse_value(raw: &str) -> f64 {
    match raw {
        "" => f64::NAN,
        _ if raw.eq_ignore_ascii_case("true") => 1.0,
        _ if raw.eq_ignore_ascii_case("false") => 0.0,
        _ => raw.parse::<f64>().unwrap_or(f64::NAN),
    }
}
