//! Delimited-Text Export

use crate::series::ForecastTable;
use std::io::Write;
use thiserror::Error;

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export output is not UTF-8")]
    Encoding,
}

/// Write `table` as `date,<label>...`; cells without a value are left empty
pub fn write_csv<W: Write>(table: &ForecastTable, writer: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.labels().len() + 1);
    header.push("date");
    header.extend(table.labels().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (date, cells) in table.rows() {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(date.format("%Y-%m-%d").to_string());
        record.extend(
            cells
                .iter()
                .map(|cell| cell.map(|v| format!("{:.4}", v)).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Render `table` as CSV text
pub fn to_csv_string(table: &ForecastTable) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    String::from_utf8(buffer).map_err(|_| ExportError::Encoding)
}
