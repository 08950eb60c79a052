//! Generic storage bucket model and the fixed dispatch cascade.
//!
//! Every storage technology (battery, pumped hydro, hydrogen) is the same
//! bucket with different parameters: an energy capacity, power limits on each
//! side, asymmetric efficiencies and an SoC band. The cascade runs the
//! buckets in a fixed merit order against the residual balance, each stage
//! seeing only what the previous stage left over.

use crate::config::StorageConfig;
use crate::error::SimError;
use crate::series::{COL_RESIDUAL, DT_HOURS, TimeSeries};

/// Resolved parameters of one storage stage, in absolute MWh/MW terms.
#[derive(Debug, Clone)]
pub struct StorageParams {
    /// Stage label used as the column-name prefix (e.g., `"battery"`).
    pub name: String,
    /// Installed energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Maximum charge power (MW).
    pub max_charge_mw: f64,
    /// Maximum discharge power (MW).
    pub max_discharge_mw: f64,
    /// Charge efficiency (0.0–1.0).
    pub eta_charge: f64,
    /// Discharge efficiency (0.0–1.0).
    pub eta_discharge: f64,
    /// Lowest usable SoC (MWh).
    pub min_soc_mwh: f64,
    /// Highest usable SoC (MWh).
    pub max_soc_mwh: f64,
    /// SoC at simulation start (MWh).
    pub initial_soc_mwh: f64,
}

impl StorageParams {
    /// Resolves fractional SoC bounds from the configuration into MWh.
    pub fn from_config(name: &str, cfg: &StorageConfig) -> Self {
        let initial = cfg
            .initial_soc_fraction
            .clamp(cfg.min_soc_fraction, cfg.max_soc_fraction);
        Self {
            name: name.to_string(),
            capacity_mwh: cfg.capacity_mwh,
            max_charge_mw: cfg.max_charge_mw,
            max_discharge_mw: cfg.max_discharge_mw,
            eta_charge: cfg.eta_charge,
            eta_discharge: cfg.eta_discharge,
            min_soc_mwh: cfg.min_soc_fraction * cfg.capacity_mwh,
            max_soc_mwh: cfg.max_soc_fraction * cfg.capacity_mwh,
            initial_soc_mwh: initial * cfg.capacity_mwh,
        }
    }

    /// Whether this stage participates in dispatch at all.
    pub fn is_enabled(&self) -> bool {
        self.capacity_mwh > 0.0
    }
}

/// Outcome of one dispatch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// SoC after the step (MWh).
    pub soc_mwh: f64,
    /// Energy drawn from the grid this step (MWh, grid side).
    pub charged_mwh: f64,
    /// Energy delivered to the grid this step (MWh, grid side).
    pub discharged_mwh: f64,
    /// Residual balance left over after the step (MWh).
    pub residual_mwh: f64,
}

/// Advances one storage bucket by one step against a residual balance.
///
/// A positive residual is surplus (charge opportunity), a negative residual
/// is deficit (discharge demand). All quantities are grid-side energies per
/// step; efficiency losses land in the SoC update, so the grid only ever
/// sees what actually crossed the connection point.
pub fn storage_step(params: &StorageParams, soc_mwh: f64, residual_mwh: f64) -> StepResult {
    if residual_mwh > 0.0 {
        // Surplus: absorb as much as power, headroom and efficiency allow.
        let headroom = (params.max_soc_mwh - soc_mwh).max(0.0);
        let charged = residual_mwh
            .min(params.max_charge_mw * DT_HOURS)
            .min(headroom / params.eta_charge);
        StepResult {
            soc_mwh: soc_mwh + charged * params.eta_charge,
            charged_mwh: charged,
            discharged_mwh: 0.0,
            residual_mwh: residual_mwh - charged,
        }
    } else if residual_mwh < 0.0 {
        // Deficit: deliver as much as power and usable energy allow.
        let available = (soc_mwh - params.min_soc_mwh).max(0.0);
        let discharged = (-residual_mwh)
            .min(params.max_discharge_mw * DT_HOURS)
            .min(available * params.eta_discharge);
        StepResult {
            soc_mwh: soc_mwh - discharged / params.eta_discharge,
            charged_mwh: 0.0,
            discharged_mwh: discharged,
            residual_mwh: residual_mwh + discharged,
        }
    } else {
        StepResult {
            soc_mwh,
            charged_mwh: 0.0,
            discharged_mwh: 0.0,
            residual_mwh: 0.0,
        }
    }
}

/// Per-stage trajectory over the whole simulation.
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// SoC after each step (MWh).
    pub soc_mwh: Vec<f64>,
    /// Grid-side charge energy per step (MWh).
    pub charged_mwh: Vec<f64>,
    /// Grid-side discharge energy per step (MWh).
    pub discharged_mwh: Vec<f64>,
}

/// Runs one stage over a residual trajectory, mutating the residual in place.
pub fn run_stage(params: &StorageParams, residual: &mut [f64]) -> StageOutput {
    let n = residual.len();
    let mut out = StageOutput {
        soc_mwh: Vec::with_capacity(n),
        charged_mwh: Vec::with_capacity(n),
        discharged_mwh: Vec::with_capacity(n),
    };
    let mut soc = params.initial_soc_mwh;
    for r in residual.iter_mut() {
        let step = storage_step(params, soc, *r);
        soc = step.soc_mwh;
        *r = step.residual_mwh;
        out.soc_mwh.push(step.soc_mwh);
        out.charged_mwh.push(step.charged_mwh);
        out.discharged_mwh.push(step.discharged_mwh);
    }
    out
}

/// The fixed dispatch cascade: battery, then pumped hydro, then hydrogen.
///
/// Fast and efficient technologies always go first; slow seasonal storage
/// only sees what faster stages could not handle.
#[derive(Debug, Clone)]
pub struct StorageCascade {
    stages: Vec<StorageParams>,
}

impl StorageCascade {
    /// Builds a cascade from stages in merit order.
    ///
    /// Disabled stages (zero capacity) are skipped at run time but kept in
    /// the list so column output stays uniform across scenarios.
    pub fn new(stages: Vec<StorageParams>) -> Self {
        Self { stages }
    }

    /// The stages in dispatch order.
    pub fn stages(&self) -> &[StorageParams] {
        &self.stages
    }

    /// Dispatches the cascade against the series' residual balance column.
    ///
    /// Appends `{stage}_soc_mwh`, `{stage}_charged_mwh` and
    /// `{stage}_discharged_mwh` for each stage and replaces the residual
    /// column with what is left after the final stage.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingColumn` if the series has no residual
    /// balance column.
    pub fn dispatch(&self, series: &mut TimeSeries) -> Result<(), SimError> {
        let mut residual = series
            .column(COL_RESIDUAL)
            .ok_or_else(|| SimError::MissingColumn {
                label: "storage".to_string(),
                column: COL_RESIDUAL.to_string(),
            })?
            .to_vec();

        for params in &self.stages {
            let out = if params.is_enabled() {
                run_stage(params, &mut residual)
            } else {
                StageOutput {
                    soc_mwh: vec![0.0; residual.len()],
                    charged_mwh: vec![0.0; residual.len()],
                    discharged_mwh: vec![0.0; residual.len()],
                }
            };
            series.push_column(&format!("{}_soc_mwh", params.name), out.soc_mwh);
            series.push_column(&format!("{}_charged_mwh", params.name), out.charged_mwh);
            series.push_column(&format!("{}_discharged_mwh", params.name), out.discharged_mwh);
        }

        series.push_column(COL_RESIDUAL, residual);
        Ok(())
    }
}
