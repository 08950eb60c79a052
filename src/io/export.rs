//! CSV export for augmented simulation series.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SimError;
use crate::io::TIMESTAMP_FORMAT;
use crate::series::TimeSeries;

/// Exports a series to a CSV file at the given path.
///
/// Writes a header row (`timestamp` followed by the column names in series
/// order) and one data row per quarter-hour step. Produces deterministic
/// output for identical inputs.
///
/// # Errors
///
/// Returns a `SimError` if file creation or writing fails.
pub fn export_csv(series: &TimeSeries, path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_csv(series, BufWriter::new(file))
}

/// Writes a series as CSV to any writer.
///
/// # Errors
///
/// Returns a `SimError` if writing fails.
pub fn write_csv(series: &TimeSeries, writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let names: Vec<&str> = series.column_names().collect();
    let mut header = vec!["timestamp"];
    header.extend(&names);
    wtr.write_record(&header)?;

    let columns: Vec<&[f64]> = names
        .iter()
        .filter_map(|name| series.column(name))
        .collect();
    for (i, stamp) in series.timestamps().iter().enumerate() {
        let mut record = vec![stamp.format(TIMESTAMP_FORMAT).to_string()];
        record.extend(columns.iter().map(|col| format!("{:.4}", col[i])));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
