//! Regional balance simulator entry point — CLI wiring and scenario runs.

use std::path::{Path, PathBuf};
use std::process;

use tracing::warn;

use rebal_sim::cli;
use rebal_sim::config::ScenarioConfig;
use rebal_sim::io::export::export_csv;
use rebal_sim::io::import::import_csv;
use rebal_sim::series::TimeSeries;
use rebal_sim::sim::pipeline::{Pipeline, RunInputs};
use rebal_sim::synth;

/// Default seed for synthetic input data.
const DEFAULT_SEED: u64 = 42;
/// Mean production power of the synthetic year (MW).
const SYNTH_PRODUCTION_MW: f64 = 62_000.0;
/// Mean base consumption power of the synthetic year (MW).
const SYNTH_CONSUMPTION_MW: f64 = 55_000.0;
/// Seed offset for the consumption series, so production and consumption
/// noise stay uncorrelated.
const CONSUMPTION_SEED_OFFSET: u64 = 19;

fn load_or_synth(
    path: Option<&PathBuf>,
    synth: impl FnOnce() -> TimeSeries,
) -> Result<TimeSeries, String> {
    match path {
        Some(p) => import_csv(p).map_err(|e| format!("cannot read \"{}\": {e}", p.display())),
        None => Ok(synth()),
    }
}

fn run() -> Result<(), String> {
    let opts = cli::parse_args().inspect_err(|_| cli::print_usage())?;

    // Load config: --scenario takes priority, then --preset, then baseline.
    let mut scenario = if let Some(ref path) = opts.scenario {
        ScenarioConfig::from_toml_file(path).map_err(|e| e.to_string())?
    } else if let Some(ref name) = opts.preset {
        ScenarioConfig::from_preset(name).map_err(|e| e.to_string())?
    } else {
        ScenarioConfig::baseline()
    };
    if let Some(year) = opts.year {
        scenario.simulation.year = year;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        return Err(format!("{} configuration error(s)", errors.len()));
    }
    for lint in scenario.lints() {
        warn!(field = %lint.field, "{}", lint.message);
    }

    let year = scenario.simulation.year;
    let seed = opts.seed.unwrap_or(DEFAULT_SEED);
    let production = load_or_synth(opts.production.as_ref(), || {
        synth::synthetic_production(year, SYNTH_PRODUCTION_MW, seed)
    })?;
    let consumption = load_or_synth(opts.consumption.as_ref(), || {
        synth::synthetic_consumption(
            year,
            SYNTH_CONSUMPTION_MW,
            seed.wrapping_add(CONSUMPTION_SEED_OFFSET),
        )
    })?;
    let weather = if scenario.heat_pumps.n_units > 0 {
        Some(load_or_synth(opts.weather.as_ref(), || {
            synth::synthetic_weather(year, seed)
        })?)
    } else {
        None
    };

    let pipeline = Pipeline::new(scenario, synth::synthetic_load_factors());
    let inputs = RunInputs {
        weather: weather.as_ref(),
        ..RunInputs::new(&production, &consumption)
    };
    let outcome = pipeline.run(inputs).map_err(|e| e.to_string())?;

    println!("{}", outcome.before);
    println!("{}", outcome.after);

    if let Some(ref path) = opts.out {
        export_csv(&outcome.series, Path::new(path)).map_err(|e| e.to_string())?;
        eprintln!("Results written to {}", path.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
