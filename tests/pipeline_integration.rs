//! Integration tests for the full scenario pipeline.

mod common;

use rebal_sim::config::ScenarioConfig;
use rebal_sim::series::{COL_BALANCE, COL_CONSUMPTION, COL_PRODUCTION, COL_RESIDUAL, days_in_year};
use rebal_sim::sim::pipeline::{Pipeline, RunInputs, ScenarioOutcome};
use rebal_sim::synth;

fn run_baseline(seed: u64) -> ScenarioOutcome {
    let cfg = ScenarioConfig::baseline();
    let year = cfg.simulation.year;
    let production = synth::synthetic_production(year, 62_000.0, seed);
    let consumption = synth::synthetic_consumption(year, 55_000.0, seed.wrapping_add(1));
    let weather = synth::synthetic_weather(year, seed);

    let pipeline = Pipeline::new(cfg, synth::synthetic_load_factors());
    let inputs = RunInputs {
        weather: Some(&weather),
        ..RunInputs::new(&production, &consumption)
    };
    pipeline
        .run(inputs)
        .unwrap_or_else(|e| panic!("baseline run failed: {e}"))
}

#[test]
fn full_run_covers_the_whole_year() {
    let outcome = run_baseline(42);
    assert_eq!(outcome.series.len(), days_in_year(2030) * 96);
}

#[test]
fn balance_identity_holds_per_step() {
    let outcome = run_baseline(42);
    let prod = outcome.series.column(COL_PRODUCTION).unwrap_or_default();
    let cons = outcome.series.column(COL_CONSUMPTION).unwrap_or_default();
    let balance = outcome.series.column(COL_BALANCE).unwrap_or_default();
    for i in (0..balance.len()).step_by(997) {
        assert!(
            (balance[i] - (prod[i] - cons[i])).abs() < 1e-9,
            "identity broken at step {i}"
        );
    }
}

#[test]
fn residual_accounts_for_every_dispatch_stage() {
    let outcome = run_baseline(42);
    let s = &outcome.series;
    let balance = s.column(COL_BALANCE).unwrap_or_default();
    let residual = s.column(COL_RESIDUAL).unwrap_or_default();

    let mut expected: Vec<f64> = balance.to_vec();
    for stage in ["ev", "battery", "pumped_hydro", "hydrogen"] {
        let charged = s.column(&format!("{stage}_charged_mwh")).unwrap_or_default();
        let discharged = s
            .column(&format!("{stage}_discharged_mwh"))
            .unwrap_or_default();
        for i in 0..expected.len() {
            expected[i] += discharged[i] - charged[i];
        }
    }
    for i in (0..residual.len()).step_by(499) {
        assert!(
            (residual[i] - expected[i]).abs() < 1e-6,
            "residual mismatch at step {i}: {} vs {}",
            residual[i],
            expected[i]
        );
    }
}

#[test]
fn dispatch_never_grows_the_surplus() {
    // The EV morning charge may deepen a deficit, but no stage ever makes
    // the residual more positive than its input.
    let outcome = run_baseline(42);
    assert!(outcome.after.surplus_twh <= outcome.before.surplus_twh);
}

#[test]
fn storage_only_dispatch_shrinks_both_sides() {
    let cfg = common::storage_only_config();
    let year = cfg.simulation.year;
    let production = synth::synthetic_production(year, 62_000.0, 3);
    let consumption = synth::synthetic_consumption(year, 55_000.0, 4);
    let pipeline = Pipeline::new(cfg, common::unit_matrix());
    let outcome = pipeline.run(RunInputs::new(&production, &consumption));
    assert!(outcome.is_ok(), "{:?}", outcome.err());
    let outcome = outcome.ok();
    let shrunk = outcome.as_ref().is_some_and(|o| {
        o.after.surplus_twh <= o.before.surplus_twh
            && o.after.deficit_twh <= o.before.deficit_twh
    });
    assert!(shrunk, "storage-only dispatch grew an imbalance side");
}

#[test]
fn two_identical_runs_are_deterministic() {
    let a = run_baseline(7);
    let b = run_baseline(7);
    assert_eq!(a.series.len(), b.series.len());
    for col in [COL_BALANCE, COL_RESIDUAL, "battery_soc_mwh", "ev_soc_mwh"] {
        assert_eq!(a.series.column(col), b.series.column(col), "column {col}");
    }
    assert_eq!(a.before, b.before);
    assert_eq!(a.after, b.after);
}

#[test]
fn storage_only_scenario_skips_fleet_columns() {
    let cfg = common::storage_only_config();
    let year = cfg.simulation.year;
    let production = common::flat_series(year, "wind_mwh", 1000.0);
    let consumption = common::flat_series(year, "base_mwh", 900.0);
    let pipeline = Pipeline::new(cfg, common::unit_matrix());
    let outcome = pipeline.run(RunInputs::new(&production, &consumption));
    assert!(outcome.is_ok(), "{:?}", outcome.err());
    let outcome = outcome.ok();
    assert!(
        outcome
            .as_ref()
            .is_some_and(|o| o.series.column("ev_soc_mwh").is_none())
    );
    assert!(
        outcome
            .as_ref()
            .is_some_and(|o| o.series.column("battery_soc_mwh").is_some())
    );
}

#[test]
fn reports_expose_production_and_consumption_totals() {
    let outcome = run_baseline(42);
    assert!(outcome.before.production_twh.is_some_and(|p| p > 0.0));
    assert!(outcome.before.consumption_twh.is_some_and(|c| c > 0.0));
    assert!((0.0..=1.0).contains(&outcome.before.self_sufficiency));
}
