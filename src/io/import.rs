//! CSV import into a [`TimeSeries`].
//!
//! [`TimeSeries`]: crate::series::TimeSeries

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::SimError;
use crate::io::TIMESTAMP_FORMAT;
use crate::series::TimeSeries;
use crate::sim::heat_pump::parse_decimal;

/// Reads a CSV file into a series.
///
/// # Errors
///
/// Returns a `SimError` if the file cannot be opened or parsed.
pub fn import_csv(path: &Path) -> Result<TimeSeries, SimError> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file))
}

/// Reads CSV from any reader into a series.
///
/// The first column must hold timestamps in `YYYY-MM-DD HH:MM:SS` form
/// (a `T` separator is also accepted); every further column is numeric.
/// Decimal commas are coerced, matching the load-factor matrix inputs.
///
/// # Errors
///
/// Returns `SimError::InvalidInput` for unparseable timestamps or cells and
/// `SimError::Csv` for malformed CSV.
pub fn read_csv(reader: impl Read) -> Result<TimeSeries, SimError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(SimError::InvalidInput {
            what: "csv input has no columns".to_string(),
        });
    }
    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let stamp_cell = record.get(0).unwrap_or_default();
        let stamp = parse_timestamp(stamp_cell).ok_or_else(|| SimError::InvalidInput {
            what: format!("row {}: unparseable timestamp \"{stamp_cell}\"", row + 1),
        })?;
        timestamps.push(stamp);

        for (i, name) in names.iter().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default();
            let value = parse_decimal(cell).ok_or_else(|| SimError::InvalidInput {
                what: format!("row {}, column \"{name}\": unparseable value \"{cell}\"", row + 1),
            })?;
            columns[i].push(value);
        }
    }

    let mut series = TimeSeries::new(timestamps);
    for (name, values) in names.iter().zip(columns) {
        series.push_column(name, values);
    }
    Ok(series)
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    NaiveDateTime::parse_from_str(cell, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(cell, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
