//! Integration tests for EV fleet dispatch and the V2G sign convention.

mod common;

use rebal_sim::config::EvFleetConfig;
use rebal_sim::series::{COL_RESIDUAL, TimeSeries, year_grid};
use rebal_sim::sim::ev_fleet::{EvFleetParams, EvFleetSim};

fn fleet(cfg: &EvFleetConfig) -> EvFleetSim {
    EvFleetSim::new(EvFleetParams::from_config(cfg))
}

/// Night steps only, so neither the day floor nor the morning window
/// interferes with the grid-responsive branch.
fn night_series(steps: usize, residual_mwh: f64) -> TimeSeries {
    let stamps: Vec<_> = year_grid(common::TEST_YEAR)
        .into_iter()
        .take(steps)
        .collect();
    let mut series = TimeSeries::new(stamps);
    series.push_column(COL_RESIDUAL, vec![residual_mwh; steps]);
    series
}

#[test]
fn sustained_surplus_means_negative_power() {
    let sim = fleet(&common::small_fleet_config());
    let mut series = night_series(8, 100.0);
    let result = sim.dispatch(&mut series, Some(&[0.0; 8]), None, None);
    assert!(result.is_ok(), "{:?}", result.err());

    let power = series.column("ev_power_mw").unwrap_or_default();
    let charged = series.column("ev_charged_mwh").unwrap_or_default();
    assert!(power.iter().all(|p| *p <= 0.0), "charging must be negative");
    assert!(power.iter().any(|p| *p < 0.0));
    assert!(charged.iter().sum::<f64>() > 0.0);
}

#[test]
fn sustained_deficit_means_positive_power() {
    let sim = fleet(&common::small_fleet_config());
    let mut series = night_series(8, -100.0);
    let result = sim.dispatch(&mut series, Some(&[0.0; 8]), None, None);
    assert!(result.is_ok(), "{:?}", result.err());

    let power = series.column("ev_power_mw").unwrap_or_default();
    let discharged = series.column("ev_discharged_mwh").unwrap_or_default();
    assert!(power.iter().all(|p| *p >= 0.0), "discharge must be positive");
    assert!(discharged.iter().sum::<f64>() > 0.0);
}

#[test]
fn v2g_share_scales_discharge_linearly() {
    // Deep deficit, plenty of stored energy, zero driving: discharge is
    // purely power-limited, so doubling the participation share must
    // exactly double the delivered energy.
    let base_cfg = common::small_fleet_config();
    let mut totals = Vec::new();
    for v2g_share in [0.15, 0.3] {
        let cfg = EvFleetConfig {
            v2g_share,
            ..base_cfg.clone()
        };
        let sim = fleet(&cfg);
        let mut series = night_series(8, -1000.0);
        let result = sim.dispatch(&mut series, Some(&[0.0; 8]), None, None);
        assert!(result.is_ok(), "{:?}", result.err());
        let total: f64 = series
            .column("ev_discharged_mwh")
            .unwrap_or_default()
            .iter()
            .sum();
        totals.push(total);
    }
    assert!(totals[0] > 0.0);
    assert!(
        (totals[1] / totals[0] - 2.0).abs() < 1e-9,
        "expected exact doubling, got ratio {}",
        totals[1] / totals[0]
    );
}

#[test]
fn zero_v2g_share_never_discharges() {
    let cfg = EvFleetConfig {
        v2g_share: 0.0,
        ..common::small_fleet_config()
    };
    let sim = fleet(&cfg);
    let mut series = night_series(8, -1000.0);
    let result = sim.dispatch(&mut series, Some(&[0.0; 8]), None, None);
    assert!(result.is_ok());
    let discharged = series.column("ev_discharged_mwh").unwrap_or_default();
    assert!(discharged.iter().all(|v| *v == 0.0));
}

#[test]
fn morning_window_recovers_the_target_soc() {
    // Start the fleet well below the morning target and give the grid
    // nothing to offer: the window alone must pull the SoC back up.
    let cfg = EvFleetConfig {
        initial_soc: 0.25,
        ..common::small_fleet_config()
    };
    let sim = fleet(&cfg);
    let params = EvFleetParams::from_config(&cfg);

    // 05:00 through 08:00 on Jan 1 is steps 20..32.
    let stamps: Vec<_> = year_grid(common::TEST_YEAR)
        .into_iter()
        .skip(20)
        .take(12)
        .collect();
    let mut series = TimeSeries::new(stamps);
    series.push_column(COL_RESIDUAL, vec![0.0; 12]);
    // Keep the full parked share on the plug through the window; the
    // time-of-day share would drop to a tenth from 06:00 onward.
    let result = sim.dispatch(&mut series, Some(&[0.0; 12]), Some(&[0.6; 12]), None);
    assert!(result.is_ok(), "{:?}", result.err());

    let soc = series.column("ev_soc_mwh").unwrap_or_default();
    let final_soc = soc.last().copied().unwrap_or_default();
    // 17.5 MWh below target at 6.6 MW charge power over 3 hours: reachable.
    assert!(
        (final_soc - params.morning_target_mwh).abs() < 1e-6,
        "final soc {final_soc} missed target {}",
        params.morning_target_mwh
    );
}

#[test]
fn driving_drain_is_recorded_and_depletes_soc() {
    let sim = fleet(&common::small_fleet_config());
    // Midday steps with a balanced grid: only driving moves the SoC.
    let stamps: Vec<_> = year_grid(common::TEST_YEAR)
        .into_iter()
        .skip(40)
        .take(8)
        .collect();
    let mut series = TimeSeries::new(stamps);
    series.push_column(COL_RESIDUAL, vec![0.0; 8]);
    let drive = vec![0.5; 8];
    let result = sim.dispatch(&mut series, Some(&drive), None, None);
    assert!(result.is_ok());

    let recorded = series.column("ev_drive_mwh").unwrap_or_default();
    assert_eq!(recorded, &drive[..]);
    let soc = series.column("ev_soc_mwh").unwrap_or_default();
    assert!((soc[7] - (25.0 - 4.0)).abs() < 1e-9);
}
