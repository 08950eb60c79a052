//! Temperature-dependent heat-pump load synthesis.
//!
//! The fleet load comes from a measured load-factor matrix: one row per
//! quarter-hour of the day, one column per temperature bucket. The factors
//! are relative; a normalization pass over the simulation year scales them so
//! the annual thermal energy per unit matches the configured value exactly.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::config::HeatPumpConfig;
use crate::error::SimError;
use crate::series::{DT_HOURS, TimeSeries, year_grid};

/// Temperature bucket of the load-factor matrix.
///
/// Temperatures are rounded to the nearest whole degree Celsius; everything
/// below -14 °C collapses into [`TempBucket::Low`] and everything at or above
/// 18 °C into [`TempBucket::High`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempBucket {
    /// Below -14 °C.
    Low,
    /// Exact integer degree in [-14, 17].
    Exact(i32),
    /// At or above 18 °C.
    High,
}

impl TempBucket {
    /// Buckets a temperature reading.
    pub fn from_celsius(temp: f64) -> Self {
        let rounded = temp.round() as i32;
        if rounded < -14 {
            Self::Low
        } else if rounded >= 18 {
            Self::High
        } else {
            Self::Exact(rounded)
        }
    }
}

/// Parses a numeric string that may use a decimal comma.
///
/// Measured matrices frequently arrive with German number formatting;
/// `"1,25"` and `"1.25"` both parse to the same value.
pub fn parse_decimal(s: &str) -> Option<f64> {
    s.trim().replace(',', ".").parse().ok()
}

/// Load-factor matrix keyed by quarter-hour of day and temperature bucket.
#[derive(Debug, Clone, Default)]
pub struct LoadFactorMatrix {
    factors: HashMap<(u32, u32), HashMap<TempBucket, f64>>,
}

impl LoadFactorMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factor for one time-of-day row and temperature bucket.
    pub fn insert(&mut self, hour: u32, minute: u32, bucket: TempBucket, factor: f64) {
        self.factors.entry((hour, minute)).or_default().insert(bucket, factor);
    }

    /// Sets the factor from a string cell, coercing decimal commas.
    ///
    /// Returns `false` if the cell does not parse as a number.
    pub fn insert_cell(&mut self, hour: u32, minute: u32, bucket: TempBucket, cell: &str) -> bool {
        match parse_decimal(cell) {
            Some(factor) => {
                self.insert(hour, minute, bucket, factor);
                true
            }
            None => false,
        }
    }

    /// Looks up the factor for a timestamp and temperature.
    ///
    /// # Errors
    ///
    /// Returns `SimError::ProfileLookup` if the matrix has no row for the
    /// time of day or no column for the temperature bucket. An incomplete
    /// matrix is a data defect, not something to paper over.
    pub fn lookup(&self, stamp: NaiveDateTime, temp: f64) -> Result<f64, SimError> {
        let key = (stamp.hour(), stamp.minute());
        let row = self.factors.get(&key).ok_or_else(|| SimError::ProfileLookup {
            what: format!("load-factor row for {:02}:{:02}", key.0, key.1),
        })?;
        let bucket = TempBucket::from_celsius(temp);
        row.get(&bucket).copied().ok_or_else(|| SimError::ProfileLookup {
            what: format!("load-factor column for {bucket:?} at {:02}:{:02}", key.0, key.1),
        })
    }
}

/// Prepares a per-step temperature trajectory for the simulation year.
///
/// The named column is pulled from the weather series, deduplicated keeping
/// the first reading per timestamp, reindexed onto the weather year's full
/// grid with forward- then backward-fill, and finally mapped onto the
/// simulation year by substituting the year in each timestamp.
///
/// When the simulation year is a leap year but the weather year is not,
/// Feb 29 reuses the Feb 28 readings; in the reverse case the weather's
/// Feb 29 is dropped.
///
/// # Errors
///
/// Returns `SimError::DataCompleteness` if the weather series is empty and
/// `SimError::MissingColumn` if the column is absent.
pub fn prepare_weather(
    weather: &TimeSeries,
    column: &str,
    sim_year: i32,
) -> Result<Vec<f64>, SimError> {
    // Emptiness first: a series with no readings should report missing
    // data, not a missing column.
    if weather.is_empty() {
        return Err(SimError::DataCompleteness {
            label: "weather".to_string(),
            missing: year_grid(sim_year).len(),
            year: sim_year,
        });
    }
    let values = weather.column(column).ok_or_else(|| SimError::MissingColumn {
        label: "weather".to_string(),
        column: column.to_string(),
    })?;

    // Keep the first reading per timestamp.
    let mut by_stamp: HashMap<NaiveDateTime, f64> = HashMap::new();
    for (stamp, value) in weather.timestamps().iter().zip(values) {
        by_stamp.entry(*stamp).or_insert(*value);
    }

    let weather_year = weather.timestamps()[0].year();

    // Reindex onto the weather year's grid, forward-filling gaps.
    let weather_grid = year_grid(weather_year);
    let mut filled: Vec<Option<f64>> = Vec::with_capacity(weather_grid.len());
    let mut last = None;
    for stamp in &weather_grid {
        if let Some(v) = by_stamp.get(stamp) {
            last = Some(*v);
        }
        filled.push(last);
    }
    // Backward-fill the leading gap.
    let first_known = filled.iter().flatten().next().copied();
    let first_known = first_known.ok_or(SimError::DataCompleteness {
        label: "weather".to_string(),
        missing: weather_grid.len(),
        year: weather_year,
    })?;
    let by_weather_stamp: HashMap<NaiveDateTime, f64> = weather_grid
        .iter()
        .zip(&filled)
        .map(|(stamp, v)| (*stamp, v.unwrap_or(first_known)))
        .collect();

    // Substitute the simulation year into each grid timestamp.
    let mut out = Vec::with_capacity(year_grid(sim_year).len());
    for stamp in year_grid(sim_year) {
        let date = stamp.date();
        let lookup_date = date
            .with_year(weather_year)
            // Feb 29 with a non-leap weather year: fall back to Feb 28.
            .or_else(|| date.pred_opt().and_then(|d| d.with_year(weather_year)));
        let value = lookup_date
            .map(|d| d.and_time(stamp.time()))
            .and_then(|s| by_weather_stamp.get(&s).copied())
            .unwrap_or(first_known);
        out.push(value);
    }
    Ok(out)
}

/// Heat-pump fleet load synthesizer.
#[derive(Debug, Clone)]
pub struct HeatPumpSim {
    /// Number of installed units.
    pub n_units: u64,
    /// Annual thermal demand per unit (kWh).
    pub annual_thermal_kwh: f64,
    /// Average coefficient of performance.
    pub cop: f64,
    matrix: LoadFactorMatrix,
}

impl HeatPumpSim {
    pub fn new(cfg: &HeatPumpConfig, matrix: LoadFactorMatrix) -> Self {
        Self {
            n_units: cfg.n_units,
            annual_thermal_kwh: cfg.annual_thermal_kwh,
            cop: cfg.cop,
            matrix,
        }
    }

    /// Synthesizes the fleet's electrical demand per step, in MWh.
    ///
    /// Two passes: the first collects raw factors and the normalization
    /// constant `sum(factor * dt_h)` over the year, the second scales each
    /// step so annual thermal energy per unit meets `annual_thermal_kwh`
    /// exactly. The electrical series therefore sums to
    /// `n_units * annual_thermal_kwh / cop / 1000` MWh regardless of how the
    /// matrix is scaled.
    ///
    /// # Errors
    ///
    /// Returns `SimError::LengthMismatch` if the temperature trajectory does
    /// not match the timestamp grid, `SimError::ProfileLookup` for an
    /// incomplete matrix and `SimError::DegenerateProfile` if the factors sum
    /// to nothing positive.
    pub fn electrical_demand(
        &self,
        timestamps: &[NaiveDateTime],
        temps: &[f64],
    ) -> Result<Vec<f64>, SimError> {
        if timestamps.len() != temps.len() {
            return Err(SimError::LengthMismatch {
                label: "temperature trajectory".to_string(),
                expected: timestamps.len(),
                got: temps.len(),
            });
        }

        let mut factors = Vec::with_capacity(timestamps.len());
        let mut norm = 0.0;
        for (stamp, temp) in timestamps.iter().zip(temps) {
            let factor = self.matrix.lookup(*stamp, *temp)?;
            norm += factor * DT_HOURS;
            factors.push(factor);
        }
        if norm <= 0.0 {
            return Err(SimError::DegenerateProfile { norm });
        }

        // kWh of thermal demand per unit and factor-hour.
        let scale = self.annual_thermal_kwh / norm;
        let fleet = self.n_units as f64;
        Ok(factors
            .into_iter()
            .map(|factor| factor * scale / self.cop * fleet * DT_HOURS / 1000.0)
            .collect())
    }
}
