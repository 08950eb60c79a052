//! End-to-end scenario run: load synthesis, balance, dispatch, report.

use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::series::{COL_BALANCE, COL_HEAT_PUMPS, COL_RESIDUAL, COL_TOTAL, TimeSeries, year_grid};
use crate::sim::balance::{BalanceCalculator, BalanceReport};
use crate::sim::ev_fleet::{EvFleetParams, EvFleetSim};
use crate::sim::heat_pump::{HeatPumpSim, LoadFactorMatrix, prepare_weather};
use crate::sim::storage::{StorageCascade, StorageParams};

/// Input series for one scenario run.
///
/// Production and consumption are mandatory; the rest is optional and
/// activates the corresponding pipeline stage together with the
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct RunInputs<'a> {
    /// Production series, one or more columns.
    pub production: &'a TimeSeries,
    /// Base consumption series, without heat pumps.
    pub consumption: &'a TimeSeries,
    /// Weather series for heat-pump synthesis.
    pub weather: Option<&'a TimeSeries>,
    /// External per-step driving drain (MWh), overrides the synthetic shape.
    pub ev_drive_profile: Option<&'a [f64]>,
    /// External per-step plugged-in share, overrides the time-of-day shape.
    pub ev_plug_profile: Option<&'a [f64]>,
    /// External per-step SoC floor (fraction of capacity).
    pub ev_floor_profile: Option<&'a [f64]>,
}

impl<'a> RunInputs<'a> {
    pub fn new(production: &'a TimeSeries, consumption: &'a TimeSeries) -> Self {
        Self {
            production,
            consumption,
            weather: None,
            ev_drive_profile: None,
            ev_plug_profile: None,
            ev_floor_profile: None,
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// The full augmented series: balance, per-stage columns, residual.
    pub series: TimeSeries,
    /// Balance report before any dispatch.
    pub before: BalanceReport,
    /// Balance report over the residual after all dispatch stages.
    pub after: BalanceReport,
}

/// One configured scenario, ready to run against input series.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ScenarioConfig,
    matrix: LoadFactorMatrix,
}

impl Pipeline {
    pub fn new(config: ScenarioConfig, matrix: LoadFactorMatrix) -> Self {
        Self { config, matrix }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Runs the scenario: heat-pump load onto consumption, quarter-hour
    /// balance, EV dispatch, then the storage cascade. Deterministic and
    /// single-threaded; the stage order is part of the contract.
    ///
    /// # Errors
    ///
    /// Propagates alignment, lookup and profile errors from the stages.
    /// Heat pumps configured without a weather series is fatal.
    pub fn run(&self, inputs: RunInputs<'_>) -> Result<ScenarioOutcome, SimError> {
        let year = self.config.simulation.year;

        // Heat-pump synthesis merges into the consumption side before the
        // balance, so the report's consumption total already includes it.
        let mut consumption = inputs.consumption.align_to_year(year, "consumption")?;
        let mut hp_demand = None;
        if self.config.heat_pumps.n_units > 0 {
            let weather = inputs.weather.ok_or_else(|| SimError::InvalidInput {
                what: "heat pumps configured but no weather series supplied".to_string(),
            })?;
            let temps = prepare_weather(weather, &self.config.heat_pumps.temperature_column, year)?;
            let sim = HeatPumpSim::new(&self.config.heat_pumps, self.matrix.clone());
            let demand = sim.electrical_demand(&year_grid(year), &temps)?;
            info!(
                n_units = self.config.heat_pumps.n_units,
                annual_mwh = demand.iter().sum::<f64>(),
                "heat-pump load synthesized"
            );
            match consumption.column(COL_TOTAL) {
                // An explicit total would hide an extra column, so add
                // the fleet demand into the total itself.
                Some(total) => {
                    let summed: Vec<f64> =
                        total.iter().zip(&demand).map(|(t, d)| t + d).collect();
                    consumption.push_column(COL_TOTAL, summed);
                }
                None => consumption.push_column(COL_HEAT_PUMPS, demand.clone()),
            }
            hp_demand = Some(demand);
        }

        let calc = BalanceCalculator::new(year);
        let mut series = calc.compute(inputs.production, &consumption)?;
        if let Some(demand) = hp_demand {
            series.push_column(COL_HEAT_PUMPS, demand);
        }
        let before = BalanceReport::from_series(&series, COL_BALANCE)?;
        info!(
            surplus_twh = before.surplus_twh,
            deficit_twh = before.deficit_twh,
            "balance computed"
        );

        let ev_params = EvFleetParams::from_config(&self.config.ev_fleet);
        if ev_params.is_enabled() {
            let fleet = EvFleetSim::new(ev_params);
            fleet.dispatch(
                &mut series,
                inputs.ev_drive_profile,
                inputs.ev_plug_profile,
                inputs.ev_floor_profile,
            )?;
            info!("ev fleet dispatched");
        }

        let cascade = StorageCascade::new(vec![
            StorageParams::from_config("battery", &self.config.battery),
            StorageParams::from_config("pumped_hydro", &self.config.pumped_hydro),
            StorageParams::from_config("hydrogen", &self.config.hydrogen),
        ]);
        cascade.dispatch(&mut series)?;

        let after = BalanceReport::from_series(&series, COL_RESIDUAL)?;
        info!(
            remaining_deficit_twh = after.deficit_twh,
            remaining_surplus_twh = after.surplus_twh,
            "storage cascade dispatched"
        );

        Ok(ScenarioOutcome {
            series,
            before,
            after,
        })
    }
}
