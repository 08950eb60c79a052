//! Tabular I/O at the crate boundary: CSV to and from [`TimeSeries`].
//!
//! [`TimeSeries`]: crate::series::TimeSeries

pub mod export;
pub mod import;

/// Timestamp format used in CSV files.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
