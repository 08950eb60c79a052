//! Shared test fixtures for integration tests.

use rebal_sim::config::{EvFleetConfig, ScenarioConfig};
use rebal_sim::series::{TimeSeries, year_grid};
use rebal_sim::sim::heat_pump::{LoadFactorMatrix, TempBucket};

/// Default test year (non-leap).
pub const TEST_YEAR: i32 = 2030;

/// Full-year series with one constant-valued column.
pub fn flat_series(year: i32, column: &str, value: f64) -> TimeSeries {
    let stamps = year_grid(year);
    let n = stamps.len();
    let mut series = TimeSeries::new(stamps);
    series.push_column(column, vec![value; n]);
    series
}

/// Complete load-factor matrix with a unit factor everywhere.
///
/// Normalization makes the absolute factor scale irrelevant, so a flat
/// matrix keeps the expected energies easy to compute by hand.
pub fn unit_matrix() -> LoadFactorMatrix {
    let mut matrix = LoadFactorMatrix::new();
    for hour in 0..24 {
        for minute in [0, 15, 30, 45] {
            matrix.insert(hour, minute, TempBucket::Low, 1.0);
            matrix.insert(hour, minute, TempBucket::High, 1.0);
            for deg in -14..18 {
                matrix.insert(hour, minute, TempBucket::Exact(deg), 1.0);
            }
        }
    }
    matrix
}

/// Baseline scenario without heat pumps or EVs: storage-only dispatch.
pub fn storage_only_config() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::no_ev();
    cfg.heat_pumps.n_units = 0;
    cfg
}

/// A small, hand-checkable EV fleet: 1000 cars, 50 MWh combined battery.
pub fn small_fleet_config() -> EvFleetConfig {
    EvFleetConfig {
        n_cars: 1000,
        ev_share: 1.0,
        ..EvFleetConfig::default()
    }
}
