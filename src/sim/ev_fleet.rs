//! Aggregate EV fleet model with vehicle-to-grid dispatch.
//!
//! The fleet is one large battery with a driving drain on top. Charging and
//! discharging react to the residual grid balance, bounded by how much of the
//! fleet is plugged in, the per-car power ratings and the V2G participation
//! share. A mandatory pre-departure charge window guarantees the fleet is
//! ready in the morning regardless of grid conditions.

use chrono::{NaiveDateTime, Timelike};
use tracing::warn;

use crate::config::EvFleetConfig;
use crate::error::SimError;
use crate::series::{COL_RESIDUAL, DT_HOURS, TimeSeries, in_daily_window};

/// Driving activity factor during the day window.
const DRIVE_FACTOR_DAY: f64 = 1.3;
/// Driving activity factor during the night window.
const DRIVE_FACTOR_NIGHT: f64 = 0.2;
/// Start of the driving day window (hour of day).
const DAY_START_HOUR: f64 = 6.0;
/// End of the driving day window (hour of day).
const DAY_END_HOUR: f64 = 22.0;
/// Fraction of the maximum plug share still connected during the day
/// window, when most of the fleet is out driving.
const PLUG_FACTOR_DRIVING: f64 = 0.1;

/// Resolved fleet parameters in absolute MWh/MW terms.
#[derive(Debug, Clone)]
pub struct EvFleetParams {
    /// Number of electric vehicles (fleet size times EV share).
    pub n_ev: f64,
    /// Combined battery capacity (MWh).
    pub capacity_mwh: f64,
    /// Combined charge power with the whole fleet plugged in (MW).
    pub charge_power_mw: f64,
    /// Combined V2G discharge power with the whole fleet plugged in (MW),
    /// already scaled by the participation share.
    pub discharge_power_mw: f64,
    /// Highest plugged-in share of the fleet (parked hours).
    pub plug_share_max: f64,
    /// Annual driving consumption of the whole fleet (MWh).
    pub annual_drive_mwh: f64,
    /// SoC floor during the day window (MWh).
    pub floor_day_mwh: f64,
    /// SoC floor during the night window (MWh).
    pub floor_night_mwh: f64,
    /// SoC the fleet must reach before morning departure (MWh).
    pub morning_target_mwh: f64,
    /// Start of the mandatory morning-charge window (hour of day).
    pub morning_start_hour: f64,
    /// End of the mandatory morning-charge window (hour of day).
    pub morning_end_hour: f64,
    /// Grid surplus that triggers charging (MW).
    pub surplus_threshold_mw: f64,
    /// Grid deficit that triggers V2G discharge (MW, positive).
    pub deficit_threshold_mw: f64,
    /// Charge efficiency.
    pub eta_charge: f64,
    /// Discharge efficiency.
    pub eta_discharge: f64,
    /// Fleet SoC at simulation start (MWh).
    pub initial_soc_mwh: f64,
}

impl EvFleetParams {
    /// Resolves per-car configuration into fleet-level quantities.
    pub fn from_config(cfg: &EvFleetConfig) -> Self {
        let n_ev = cfg.n_cars as f64 * cfg.ev_share;
        let capacity_mwh = n_ev * cfg.battery_kwh_per_car / 1000.0;
        Self {
            n_ev,
            capacity_mwh,
            charge_power_mw: n_ev * cfg.charge_kw_per_car / 1000.0,
            discharge_power_mw: n_ev * cfg.v2g_share * cfg.discharge_kw_per_car / 1000.0,
            plug_share_max: cfg.plug_share_max,
            annual_drive_mwh: n_ev * cfg.annual_drive_kwh_per_car / 1000.0,
            floor_day_mwh: cfg.soc_min_day * capacity_mwh,
            floor_night_mwh: cfg.soc_min_night * capacity_mwh,
            morning_target_mwh: cfg.soc_target_morning * capacity_mwh,
            morning_start_hour: cfg.morning_window_start_hour,
            morning_end_hour: cfg.morning_window_end_hour,
            surplus_threshold_mw: cfg.surplus_threshold_mw,
            deficit_threshold_mw: cfg.deficit_threshold_mw,
            eta_charge: cfg.eta_charge,
            eta_discharge: cfg.eta_discharge,
            initial_soc_mwh: cfg.initial_soc * capacity_mwh,
        }
    }

    /// Whether the fleet participates in dispatch at all.
    pub fn is_enabled(&self) -> bool {
        self.n_ev > 0.0 && self.capacity_mwh > 0.0
    }

    fn hour_of(stamp: &NaiveDateTime) -> f64 {
        stamp.hour() as f64 + stamp.minute() as f64 / 60.0
    }

    /// SoC floor in effect at a timestamp, day/night by time of day.
    pub fn floor_at(&self, stamp: &NaiveDateTime) -> f64 {
        if in_daily_window(Self::hour_of(stamp), DAY_START_HOUR, DAY_END_HOUR) {
            self.floor_day_mwh
        } else {
            self.floor_night_mwh
        }
    }

    /// Plugged-in share of the fleet at a timestamp: the full parked share
    /// at night, a small remainder while the fleet is out during the day.
    pub fn plug_share_at(&self, stamp: &NaiveDateTime) -> f64 {
        if in_daily_window(Self::hour_of(stamp), DAY_START_HOUR, DAY_END_HOUR) {
            PLUG_FACTOR_DRIVING * self.plug_share_max
        } else {
            self.plug_share_max
        }
    }

    fn in_morning_window(&self, stamp: &NaiveDateTime) -> bool {
        in_daily_window(
            Self::hour_of(stamp),
            self.morning_start_hour,
            self.morning_end_hour,
        )
    }
}

/// Outcome of one fleet dispatch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvStepResult {
    /// Fleet SoC after the step (MWh).
    pub soc_mwh: f64,
    /// Energy drawn from the grid this step (MWh, grid side).
    pub charged_mwh: f64,
    /// Energy delivered to the grid this step (MWh, grid side).
    pub discharged_mwh: f64,
    /// Driving energy drained this step (MWh).
    pub drive_mwh: f64,
    /// Average grid-side power this step (MW, negative while charging).
    pub power_mw: f64,
    /// Residual balance left over after the step (MWh).
    pub residual_mwh: f64,
}

/// Advances the fleet by one step.
///
/// Order within the step: the driving drain comes off first (floored at an
/// empty battery), then the mandatory morning charge overrides everything,
/// then grid-responsive dispatch applies the surplus/deficit thresholds.
/// `plug_share` scales both available power bounds: only the plugged-in part
/// of the fleet can move energy either way. Charging credits `eta_charge` of
/// the grid draw to the SoC; discharging debits `1 / eta_discharge` of the
/// delivered energy.
pub fn ev_step(
    params: &EvFleetParams,
    soc_mwh: f64,
    drive_mwh: f64,
    plug_share: f64,
    floor_mwh: f64,
    morning_window: bool,
    residual_mwh: f64,
) -> EvStepResult {
    let soc = (soc_mwh - drive_mwh).max(0.0);

    let max_charge_mwh = plug_share * params.charge_power_mw * DT_HOURS;
    let max_discharge_mwh = plug_share * params.discharge_power_mw * DT_HOURS;
    let headroom = (params.capacity_mwh - soc).max(0.0);

    let mut charged = 0.0;
    let mut discharged = 0.0;

    if morning_window && soc < params.morning_target_mwh {
        // Pre-departure charge runs even against a grid deficit.
        let wanted = (params.morning_target_mwh - soc) / params.eta_charge;
        charged = wanted.min(max_charge_mwh).min(headroom / params.eta_charge);
    } else if residual_mwh > params.surplus_threshold_mw * DT_HOURS {
        charged = residual_mwh
            .min(max_charge_mwh)
            .min(headroom / params.eta_charge);
    } else if residual_mwh < -params.deficit_threshold_mw * DT_HOURS {
        let available = (soc - floor_mwh).max(0.0);
        discharged = (-residual_mwh)
            .min(max_discharge_mwh)
            .min(available * params.eta_discharge);
    }

    let soc = soc + charged * params.eta_charge - discharged / params.eta_discharge;
    EvStepResult {
        soc_mwh: soc,
        charged_mwh: charged,
        discharged_mwh: discharged,
        drive_mwh,
        power_mw: (discharged - charged) / DT_HOURS,
        residual_mwh: residual_mwh + discharged - charged,
    }
}

/// Aggregate fleet simulator.
#[derive(Debug, Clone)]
pub struct EvFleetSim {
    params: EvFleetParams,
}

impl EvFleetSim {
    pub fn new(params: EvFleetParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EvFleetParams {
        &self.params
    }

    /// Synthesizes the per-step driving drain (MWh) over a timestamp grid.
    ///
    /// The shape is a flat day/night activity profile, normalized so the
    /// annual total equals the fleet's configured driving consumption.
    pub fn synthesize_drive_profile(&self, timestamps: &[NaiveDateTime]) -> Vec<f64> {
        let factors: Vec<f64> = timestamps
            .iter()
            .map(|ts| {
                let hour = EvFleetParams::hour_of(ts);
                if in_daily_window(hour, DAY_START_HOUR, DAY_END_HOUR) {
                    DRIVE_FACTOR_DAY
                } else {
                    DRIVE_FACTOR_NIGHT
                }
            })
            .collect();
        let total: f64 = factors.iter().sum();
        if total <= 0.0 {
            return vec![0.0; timestamps.len()];
        }
        let scale = self.params.annual_drive_mwh / total;
        factors.into_iter().map(|f| f * scale).collect()
    }

    /// Synthesizes the per-step plugged-in share over a timestamp grid,
    /// the inverse of the driving activity shape.
    pub fn synthesize_plug_profile(&self, timestamps: &[NaiveDateTime]) -> Vec<f64> {
        timestamps
            .iter()
            .map(|ts| self.params.plug_share_at(ts))
            .collect()
    }

    /// Dispatches the fleet against the series' residual balance column.
    ///
    /// `drive_profile`, `plug_profile` and `floor_profile` are optional
    /// external inputs: the driving drain in MWh per step, the plugged-in
    /// share of the fleet per step and the SoC floor as a fraction of
    /// capacity per step. When a supplied profile is shorter than the series
    /// a warning is logged and the simulation continues in degraded mode:
    /// steps past the profile's end fall back to the synthesized drain, the
    /// time-of-day plug share or the time-of-day floor. A longer profile is
    /// silently cut to the grid.
    ///
    /// Appends `ev_soc_mwh`, `ev_charged_mwh`, `ev_discharged_mwh`,
    /// `ev_drive_mwh` and `ev_power_mw` (negative while charging) and updates
    /// the residual column in place.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingColumn` if the series has no residual
    /// balance column.
    pub fn dispatch(
        &self,
        series: &mut TimeSeries,
        drive_profile: Option<&[f64]>,
        plug_profile: Option<&[f64]>,
        floor_profile: Option<&[f64]>,
    ) -> Result<(), SimError> {
        let n = series.len();
        let mut residual = series
            .column(COL_RESIDUAL)
            .ok_or_else(|| SimError::MissingColumn {
                label: "ev_fleet".to_string(),
                column: COL_RESIDUAL.to_string(),
            })?
            .to_vec();

        for (name, profile) in [
            ("drive", drive_profile),
            ("plug share", plug_profile),
            ("soc floor", floor_profile),
        ] {
            if let Some(p) = profile
                && p.len() < n
            {
                warn!(
                    profile = name,
                    expected = n,
                    got = p.len(),
                    "profile shorter than simulation grid, continuing degraded"
                );
            }
        }

        let synthesized;
        let drive: &[f64] = match drive_profile {
            Some(p) => p,
            None => {
                synthesized = self.synthesize_drive_profile(series.timestamps());
                &synthesized
            }
        };

        let mut soc_col = Vec::with_capacity(n);
        let mut charged_col = Vec::with_capacity(n);
        let mut discharged_col = Vec::with_capacity(n);
        let mut drive_col = Vec::with_capacity(n);
        let mut power_col = Vec::with_capacity(n);

        let timestamps = series.timestamps().to_vec();
        let mut soc = self.params.initial_soc_mwh;
        for (i, stamp) in timestamps.iter().enumerate() {
            let drive_mwh = drive.get(i).copied().unwrap_or(0.0);
            // Gaps in an external plug profile fall back to the
            // time-of-day share.
            let plug_share = plug_profile
                .and_then(|p| p.get(i).copied())
                .unwrap_or_else(|| self.params.plug_share_at(stamp));
            let floor_mwh = floor_profile
                .and_then(|p| p.get(i))
                .map(|frac| frac * self.params.capacity_mwh)
                .unwrap_or_else(|| match floor_profile {
                    // Gaps in an external floor profile default to the
                    // night floor, the more permissive of the pair.
                    Some(_) => self.params.floor_night_mwh,
                    None => self.params.floor_at(stamp),
                });

            let step = ev_step(
                &self.params,
                soc,
                drive_mwh,
                plug_share,
                floor_mwh,
                self.params.in_morning_window(stamp),
                residual[i],
            );
            soc = step.soc_mwh;
            residual[i] = step.residual_mwh;
            soc_col.push(step.soc_mwh);
            charged_col.push(step.charged_mwh);
            discharged_col.push(step.discharged_mwh);
            drive_col.push(step.drive_mwh);
            power_col.push(step.power_mw);
        }

        series.push_column("ev_soc_mwh", soc_col);
        series.push_column("ev_charged_mwh", charged_col);
        series.push_column("ev_discharged_mwh", discharged_col);
        series.push_column("ev_drive_mwh", drive_col);
        series.push_column("ev_power_mw", power_col);
        series.push_column(COL_RESIDUAL, residual);
        Ok(())
    }
}
