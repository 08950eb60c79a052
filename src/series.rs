//! Tabular time series on the canonical quarter-hour grid.
//!
//! A [`TimeSeries`] is an ordered sequence of timestamps with one or more
//! named numeric columns of equal length. The simulation operates on series
//! aligned to the canonical grid of one calendar year: every 15-minute slot
//! from Jan 1 00:00 through Dec 31 23:45, no gaps, no duplicates.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use crate::error::SimError;

/// Minutes per simulation step.
pub const STEP_MINUTES: i64 = 15;
/// Steps per simulated day.
pub const STEPS_PER_DAY: usize = 96;
/// Step duration in hours.
pub const DT_HOURS: f64 = 0.25;

/// Column name: total production per step (MWh).
pub const COL_PRODUCTION: &str = "production_mwh";
/// Column name: total consumption per step (MWh).
pub const COL_CONSUMPTION: &str = "consumption_mwh";
/// Column name: balance = production − consumption (MWh).
pub const COL_BALANCE: &str = "balance_mwh";
/// Column name: residual balance after dispatch stages (MWh).
pub const COL_RESIDUAL: &str = "residual_balance_mwh";
/// Column name: explicit consumption total, used instead of summing sectors.
pub const COL_TOTAL: &str = "total_mwh";
/// Column name: heat-pump electrical demand (MWh).
pub const COL_HEAT_PUMPS: &str = "heat_pumps_mwh";

/// Named numeric column.
#[derive(Debug, Clone)]
struct Column {
    name: String,
    values: Vec<f64>,
}

/// Ordered timestamped rows with named `f64` columns.
///
/// # Examples
///
/// ```
/// use rebal_sim::series::{TimeSeries, year_grid};
///
/// let grid = year_grid(2030);
/// let mut ts = TimeSeries::new(grid.clone());
/// ts.push_column("wind_mwh", vec![1.0; grid.len()]);
/// assert_eq!(ts.len(), 365 * 96);
/// ```
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl TimeSeries {
    /// Creates an empty series over the given timestamps.
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The timestamp column.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Names of all numeric columns, in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the values of a column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Adds a column, replacing any existing column of the same name.
    ///
    /// # Panics
    ///
    /// Panics if the value count does not match the row count.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.timestamps.len(),
            "column \"{name}\" length must match row count"
        );
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == name) {
            col.values = values;
        } else {
            self.columns.push(Column {
                name: name.to_string(),
                values,
            });
        }
    }

    /// Removes a column by name, returning its values if it existed.
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx).values)
    }

    /// Per-row sum across all numeric columns.
    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.timestamps.len()];
        for col in &self.columns {
            for (s, v) in sums.iter_mut().zip(&col.values) {
                *s += v;
            }
        }
        sums
    }

    /// Reindexes the series onto the canonical quarter-hour grid of `year`.
    ///
    /// Rows are sorted by timestamp; on duplicate timestamps the last row
    /// wins. Every slot of the target grid must then be filled.
    ///
    /// # Arguments
    ///
    /// * `year` - Target simulation year
    /// * `label` - Role of this series for error messages (e.g. "production")
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DataCompleteness`] if any grid slot is unfilled.
    /// Balance-critical inputs are never silently interpolated.
    pub fn align_to_year(&self, year: i32, label: &str) -> Result<TimeSeries, SimError> {
        // Later rows overwrite earlier ones: keep-last dedup.
        let mut by_ts: HashMap<NaiveDateTime, usize> = HashMap::with_capacity(self.len());
        for (i, ts) in self.timestamps.iter().enumerate() {
            by_ts.insert(*ts, i);
        }

        let grid = year_grid(year);
        let mut picked = Vec::with_capacity(grid.len());
        let mut missing = 0usize;
        for slot in &grid {
            match by_ts.get(slot) {
                Some(&i) => picked.push(i),
                None => missing += 1,
            }
        }
        if missing > 0 {
            return Err(SimError::DataCompleteness {
                label: label.to_string(),
                missing,
                year,
            });
        }

        let mut out = TimeSeries::new(grid);
        for col in &self.columns {
            let values = picked.iter().map(|&i| col.values[i]).collect();
            out.push_column(&col.name, values);
        }
        Ok(out)
    }
}

/// Number of days in a calendar year (365 or 366).
pub fn days_in_year(year: i32) -> usize {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// The canonical 15-minute grid for one calendar year.
///
/// Jan 1 00:00 through Dec 31 23:45 inclusive: `days_in_year(year) * 96`
/// strictly increasing timestamps.
pub fn year_grid(year: i32) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .expect("valid year")
        .and_hms_opt(0, 0, 0)
        .expect("valid midnight");
    let steps = days_in_year(year) * STEPS_PER_DAY;
    (0..steps)
        .map(|i| start + Duration::minutes(i as i64 * STEP_MINUTES))
        .collect()
}

/// Whether `t` lies in `[start, end)`, treating intervals that wrap past
/// midnight (start > end) as crossing into the next day.
pub fn in_daily_window(t: f64, start: f64, end: f64) -> bool {
    if start <= end {
        start <= t && t < end
    } else {
        t >= start || t < end
    }
}
