//! Simulation error taxonomy.
//!
//! All fatal conditions surface as a [`SimError`] and propagate to the caller
//! immediately; the computation is deterministic, so nothing is retried and
//! no partial results are returned. Soft failures (the EV profile length
//! mismatch) are reported through `tracing::warn!` instead and never appear
//! here.

use std::fmt;

/// Fatal simulation error.
#[derive(Debug)]
pub enum SimError {
    /// The canonical 15-minute grid has unfilled slots after alignment.
    DataCompleteness {
        /// Role of the offending series, e.g. `"production"`.
        label: String,
        /// Number of quarter-hour slots left unfilled.
        missing: usize,
        /// Target simulation year.
        year: i32,
    },
    /// A required column is absent from an input series.
    MissingColumn {
        /// Role of the offending series.
        label: String,
        /// Name of the missing column.
        column: String,
    },
    /// A (hour, minute, temperature-bucket) combination is absent from the
    /// heat-pump load-factor matrix. Indicates malformed reference data.
    ProfileLookup {
        /// Description of the missing entry.
        what: String,
    },
    /// The heat-pump normalization constant is not positive, so the profile
    /// cannot be scaled to an annual demand.
    DegenerateProfile {
        /// The offending normalization sum.
        norm: f64,
    },
    /// An input is missing or malformed in a way the taxonomy above does not
    /// cover, e.g. a scenario with heat pumps but no weather series.
    InvalidInput {
        /// Description of the problem.
        what: String,
    },
    /// An input series has the wrong length for the requested operation.
    LengthMismatch {
        /// Role of the offending series.
        label: String,
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        got: usize,
    },
    /// Underlying I/O failure while reading or writing series data.
    Io(std::io::Error),
    /// CSV parse or write failure at the tabular boundary.
    Csv(csv::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::DataCompleteness {
                label,
                missing,
                year,
            } => write!(
                f,
                "{label}: {missing} quarter-hour slots of year {year} are unfilled; \
                 input data has gaps"
            ),
            SimError::MissingColumn { label, column } => {
                write!(f, "{label}: required column \"{column}\" is missing")
            }
            SimError::ProfileLookup { what } => {
                write!(f, "load-factor matrix has no entry for {what}")
            }
            SimError::DegenerateProfile { norm } => write!(
                f,
                "load-factor normalization sum {norm} is not positive; profile cannot be scaled"
            ),
            SimError::InvalidInput { what } => write!(f, "invalid input: {what}"),
            SimError::LengthMismatch {
                label,
                expected,
                got,
            } => write!(f, "{label}: expected {expected} rows, got {got}"),
            SimError::Io(e) => write!(f, "i/o error: {e}"),
            SimError::Csv(e) => write!(f, "csv error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<csv::Error> for SimError {
    fn from(e: csv::Error) -> Self {
        SimError::Csv(e)
    }
}
