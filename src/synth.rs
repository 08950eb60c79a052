//! Seeded synthetic input data for demo runs and fixtures.
//!
//! Shapes are deliberately simple: seasonal and diurnal sinusoids with a
//! little seeded noise on top. They are plausible enough to exercise every
//! pipeline stage but carry no claim to forecasting quality.

use std::f64::consts::TAU;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::series::{STEPS_PER_DAY, TimeSeries, year_grid};
use crate::sim::heat_pump::{LoadFactorMatrix, TempBucket};

fn day_fraction(i: usize) -> f64 {
    (i % STEPS_PER_DAY) as f64 / STEPS_PER_DAY as f64
}

fn year_fraction(i: usize, n: usize) -> f64 {
    i as f64 / n as f64
}

/// Synthesizes a production year with `wind_mwh` and `solar_mwh` columns.
///
/// Wind is a bounded random walk, stronger in winter; solar follows a
/// day/night and seasonal envelope. `mean_mw` sets the combined average.
pub fn synthetic_production(year: i32, mean_mw: f64, seed: u64) -> TimeSeries {
    let grid = year_grid(year);
    let n = grid.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut wind = Vec::with_capacity(n);
    let mut level: f64 = 0.5;
    for i in 0..n {
        level = (level + rng.random_range(-0.02..0.02)).clamp(0.05, 1.0);
        let seasonal = 1.0 + 0.3 * (year_fraction(i, n) * TAU).cos();
        wind.push(0.6 * mean_mw * level * seasonal * 0.25);
    }

    let mut solar = Vec::with_capacity(n);
    for i in 0..n {
        let d = day_fraction(i);
        let daylight = ((d - 0.5).abs() < 0.25)
            .then(|| ((d - 0.25) * TAU).sin().max(0.0))
            .unwrap_or(0.0);
        let seasonal = 1.0 - 0.5 * (year_fraction(i, n) * TAU).cos();
        solar.push(0.8 * mean_mw * daylight * seasonal * 0.25);
    }

    let mut series = TimeSeries::new(grid);
    series.push_column("wind_mwh", wind);
    series.push_column("solar_mwh", solar);
    series
}

/// Synthesizes a base consumption year with a `base_mwh` column.
///
/// Daily double peak (morning and evening) over a seasonal baseline.
pub fn synthetic_consumption(year: i32, mean_mw: f64, seed: u64) -> TimeSeries {
    let grid = year_grid(year);
    let n = grid.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut base = Vec::with_capacity(n);
    for i in 0..n {
        let d = day_fraction(i);
        let daily = 0.85 + 0.1 * ((d - 0.33) * TAU).cos().abs() + 0.15 * ((d - 0.79) * TAU).cos().max(0.0);
        let seasonal = 1.0 + 0.15 * (year_fraction(i, n) * TAU).cos();
        let noise = 1.0 + rng.random_range(-0.03..0.03);
        base.push(mean_mw * daily * seasonal * noise * 0.25);
    }

    let mut series = TimeSeries::new(grid);
    series.push_column("base_mwh", base);
    series
}

/// Synthesizes a weather year with an `average` temperature column (°C).
pub fn synthetic_weather(year: i32, seed: u64) -> TimeSeries {
    let grid = year_grid(year);
    let n = grid.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut temps = Vec::with_capacity(n);
    for i in 0..n {
        let seasonal = 9.0 - 10.0 * (year_fraction(i, n) * TAU).cos();
        let diurnal = -3.0 * (day_fraction(i) * TAU).cos();
        temps.push(seasonal + diurnal + rng.random_range(-1.5..1.5));
    }

    let mut series = TimeSeries::new(grid);
    series.push_column("average", temps);
    series
}

/// Builds a complete load-factor matrix with a plausible shape: demand rises
/// as it gets colder, with a mild morning and evening lift.
pub fn synthetic_load_factors() -> LoadFactorMatrix {
    let mut matrix = LoadFactorMatrix::new();
    for hour in 0..24u32 {
        for minute in [0, 15, 30, 45] {
            let d = (hour as f64 + minute as f64 / 60.0) / 24.0;
            let daily = 1.0 + 0.2 * ((d - 0.33) * TAU).cos().abs();
            matrix.insert(hour, minute, TempBucket::Low, 3.5 * daily);
            matrix.insert(hour, minute, TempBucket::High, 0.1 * daily);
            for deg in -14..18 {
                // Linear ramp from heavy heating at -14 to nearly none at 17.
                let factor = 0.1 + (17 - deg) as f64 * 0.1;
                matrix.insert(hour, minute, TempBucket::Exact(deg), factor * daily);
            }
        }
    }
    matrix
}
