//! TOML-based scenario configuration and preset definitions.
//!
//! Every business default lives here, in one place: technology efficiencies,
//! SoC bands, EV fleet behavior, dispatch thresholds. Call sites never carry
//! their own defaults.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default. Fields left out of
/// a storage section fall back to that technology's own preset, never to
/// another technology's values.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Simulation year and timing.
    pub simulation: SimulationConfig,
    /// Heat-pump fleet parameters.
    pub heat_pumps: HeatPumpConfig,
    /// Electric-vehicle fleet parameters.
    pub ev_fleet: EvFleetConfig,
    /// Battery storage parameters (first cascade stage).
    pub battery: StorageConfig,
    /// Pumped-hydro storage parameters (second cascade stage).
    pub pumped_hydro: StorageConfig,
    /// Hydrogen storage parameters (third cascade stage).
    pub hydrogen: StorageConfig,
}

/// Raw TOML shape. Storage sections deserialize as sparse patches so each
/// technology keeps its own preset for omitted fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawScenario {
    simulation: SimulationConfig,
    heat_pumps: HeatPumpConfig,
    ev_fleet: EvFleetConfig,
    battery: StoragePatch,
    pumped_hydro: StoragePatch,
    hydrogen: StoragePatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoragePatch {
    capacity_mwh: Option<f64>,
    max_charge_mw: Option<f64>,
    max_discharge_mw: Option<f64>,
    eta_charge: Option<f64>,
    eta_discharge: Option<f64>,
    min_soc_fraction: Option<f64>,
    max_soc_fraction: Option<f64>,
    initial_soc_fraction: Option<f64>,
}

impl StoragePatch {
    fn apply(self, base: StorageConfig) -> StorageConfig {
        StorageConfig {
            capacity_mwh: self.capacity_mwh.unwrap_or(base.capacity_mwh),
            max_charge_mw: self.max_charge_mw.unwrap_or(base.max_charge_mw),
            max_discharge_mw: self.max_discharge_mw.unwrap_or(base.max_discharge_mw),
            eta_charge: self.eta_charge.unwrap_or(base.eta_charge),
            eta_discharge: self.eta_discharge.unwrap_or(base.eta_discharge),
            min_soc_fraction: self.min_soc_fraction.unwrap_or(base.min_soc_fraction),
            max_soc_fraction: self.max_soc_fraction.unwrap_or(base.max_soc_fraction),
            initial_soc_fraction: self
                .initial_soc_fraction
                .unwrap_or(base.initial_soc_fraction),
        }
    }
}

/// Simulation year and timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Target simulation year; the canonical grid covers exactly this year.
    pub year: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { year: 2030 }
    }
}

/// Heat-pump fleet parameters.
///
/// A fleet size of zero disables heat-pump load synthesis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatPumpConfig {
    /// Number of installed heat pumps.
    pub n_units: u64,
    /// Annual thermal demand per unit (kWh).
    pub annual_thermal_kwh: f64,
    /// Average coefficient of performance.
    pub cop: f64,
    /// Name of the temperature column in the weather series.
    pub temperature_column: String,
}

impl Default for HeatPumpConfig {
    fn default() -> Self {
        Self {
            n_units: 1_000_000,
            annual_thermal_kwh: 12_000.0,
            cop: 3.0,
            temperature_column: "average".to_string(),
        }
    }
}

/// Electric-vehicle fleet parameters.
///
/// A car count of zero disables the V2G dispatch stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvFleetConfig {
    /// Total vehicle count in the region.
    pub n_cars: u64,
    /// Share of vehicles that are electric (0.0–1.0).
    pub ev_share: f64,
    /// Battery capacity per vehicle (kWh).
    pub battery_kwh_per_car: f64,
    /// Maximum charge power per vehicle (kW).
    pub charge_kw_per_car: f64,
    /// Maximum discharge power per vehicle (kW).
    pub discharge_kw_per_car: f64,
    /// Annual driving consumption per vehicle (kWh).
    pub annual_drive_kwh_per_car: f64,
    /// Maximum plugged-in share of the fleet (0.0–1.0).
    pub plug_share_max: f64,
    /// Share of plugged-in vehicles participating in V2G discharge (0.0–1.0).
    pub v2g_share: f64,
    /// Minimum SoC fraction during the day window.
    pub soc_min_day: f64,
    /// Minimum SoC fraction during the night window.
    pub soc_min_night: f64,
    /// SoC fraction the fleet must reach before morning departure.
    pub soc_target_morning: f64,
    /// Start of the mandatory morning-charge window (hour of day).
    pub morning_window_start_hour: f64,
    /// End of the mandatory morning-charge window (hour of day).
    pub morning_window_end_hour: f64,
    /// Grid surplus threshold that triggers charging (MW).
    pub surplus_threshold_mw: f64,
    /// Grid deficit threshold that triggers V2G discharge (MW, positive).
    pub deficit_threshold_mw: f64,
    /// Charge efficiency (0.0–1.0).
    pub eta_charge: f64,
    /// Discharge efficiency (0.0–1.0).
    pub eta_discharge: f64,
    /// Initial fleet SoC fraction at simulation start.
    pub initial_soc: f64,
}

impl Default for EvFleetConfig {
    fn default() -> Self {
        Self {
            n_cars: 5_000_000,
            ev_share: 0.9,
            battery_kwh_per_car: 50.0,
            charge_kw_per_car: 11.0,
            discharge_kw_per_car: 11.0,
            annual_drive_kwh_per_car: 2250.0,
            plug_share_max: 0.6,
            v2g_share: 0.3,
            soc_min_day: 0.4,
            soc_min_night: 0.2,
            soc_target_morning: 0.6,
            morning_window_start_hour: 5.0,
            morning_window_end_hour: 8.0,
            surplus_threshold_mw: 200.0,
            deficit_threshold_mw: 200.0,
            eta_charge: 0.95,
            eta_discharge: 0.95,
            initial_soc: 0.5,
        }
    }
}

/// One storage technology of the dispatch cascade.
///
/// `capacity_mwh` is installed energy, never a power rating times an assumed
/// duration. A capacity of zero disables the stage.
#[derive(Debug, Clone)]
pub struct StorageConfig {
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
    /// Lower SoC bound as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Upper SoC bound as a fraction of capacity.
    pub max_soc_fraction: f64,
    /// Initial SoC as a fraction of capacity.
    pub initial_soc_fraction: f64,
}

impl StorageConfig {
    /// Lithium-ion battery defaults: high round-trip efficiency, a 5–95%
    /// SoC band protecting against deep discharge and overcharge.
    pub fn battery() -> Self {
        Self {
            capacity_mwh: 40_000.0,
            max_charge_mw: 10_000.0,
            max_discharge_mw: 10_000.0,
            eta_charge: 0.95,
            eta_discharge: 0.95,
            min_soc_fraction: 0.05,
            max_soc_fraction: 0.95,
            initial_soc_fraction: 0.0,
        }
    }

    /// Pumped-hydro defaults: moderate efficiency, full SoC range.
    pub fn pumped_hydro() -> Self {
        Self {
            capacity_mwh: 40_000.0,
            max_charge_mw: 7_000.0,
            max_discharge_mw: 7_000.0,
            eta_charge: 0.88,
            eta_discharge: 0.88,
            min_soc_fraction: 0.0,
            max_soc_fraction: 1.0,
            initial_soc_fraction: 0.0,
        }
    }

    /// Hydrogen defaults: electrolysis on the charge side, re-electrification
    /// on the discharge side, seasonal-scale capacity.
    pub fn hydrogen() -> Self {
        Self {
            capacity_mwh: 10_000_000.0,
            max_charge_mw: 30_000.0,
            max_discharge_mw: 25_000.0,
            eta_charge: 0.67,
            eta_discharge: 0.58,
            min_soc_fraction: 0.0,
            max_soc_fraction: 1.0,
            initial_soc_fraction: 0.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

fn push_err(errors: &mut Vec<ConfigError>, field: &str, message: impl Into<String>) {
    errors.push(ConfigError {
        field: field.to_string(),
        message: message.into(),
    });
}

fn check_fraction(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        push_err(errors, field, format!("must be in [0.0, 1.0], got {value}"));
    }
}

fn check_efficiency(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        push_err(errors, field, format!("must be in (0.0, 1.0], got {value}"));
    }
}

impl StorageConfig {
    fn validate_into(&self, section: &str, errors: &mut Vec<ConfigError>) {
        if self.capacity_mwh < 0.0 {
            push_err(errors, &format!("{section}.capacity_mwh"), "must be >= 0");
        }
        if self.max_charge_mw < 0.0 {
            push_err(errors, &format!("{section}.max_charge_mw"), "must be >= 0");
        }
        if self.max_discharge_mw < 0.0 {
            push_err(
                errors,
                &format!("{section}.max_discharge_mw"),
                "must be >= 0",
            );
        }
        check_efficiency(errors, &format!("{section}.eta_charge"), self.eta_charge);
        check_efficiency(
            errors,
            &format!("{section}.eta_discharge"),
            self.eta_discharge,
        );
        check_fraction(
            errors,
            &format!("{section}.min_soc_fraction"),
            self.min_soc_fraction,
        );
        check_fraction(
            errors,
            &format!("{section}.max_soc_fraction"),
            self.max_soc_fraction,
        );
        check_fraction(
            errors,
            &format!("{section}.initial_soc_fraction"),
            self.initial_soc_fraction,
        );
        if self.min_soc_fraction > self.max_soc_fraction {
            push_err(
                errors,
                &format!("{section}.min_soc_fraction"),
                "must be <= max_soc_fraction",
            );
        }
    }

    fn lint_into(&self, section: &str, warnings: &mut Vec<ConfigError>) {
        // A capacity smaller than one hour of charge power usually means a
        // power rating was mislabeled as an energy capacity.
        if self.capacity_mwh > 0.0 && self.capacity_mwh < self.max_charge_mw {
            push_err(
                warnings,
                &format!("{section}.capacity_mwh"),
                format!(
                    "capacity {} MWh is below one hour of charge power ({} MW); \
                     this looks like a power rating mislabeled as capacity",
                    self.capacity_mwh, self.max_charge_mw
                ),
            );
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario with all documented defaults.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            heat_pumps: HeatPumpConfig::default(),
            ev_fleet: EvFleetConfig::default(),
            battery: StorageConfig::battery(),
            pumped_hydro: StorageConfig::pumped_hydro(),
            hydrogen: StorageConfig::hydrogen(),
        }
    }

    /// Returns the high-storage preset: doubled battery and pumped-hydro
    /// capacity with matching power.
    pub fn high_storage() -> Self {
        Self {
            battery: StorageConfig {
                capacity_mwh: 80_000.0,
                max_charge_mw: 20_000.0,
                max_discharge_mw: 20_000.0,
                ..StorageConfig::battery()
            },
            pumped_hydro: StorageConfig {
                capacity_mwh: 80_000.0,
                max_charge_mw: 14_000.0,
                max_discharge_mw: 14_000.0,
                ..StorageConfig::pumped_hydro()
            },
            ..Self::baseline()
        }
    }

    /// Returns the no-EV preset: storage-only dispatch, no vehicle fleet.
    pub fn no_ev() -> Self {
        Self {
            ev_fleet: EvFleetConfig {
                n_cars: 0,
                ..EvFleetConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_storage", "no_ev"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_storage" => Ok(Self::high_storage()),
            "no_ev" => Ok(Self::no_ev()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let raw: RawScenario = toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            simulation: raw.simulation,
            heat_pumps: raw.heat_pumps,
            ev_fleet: raw.ev_fleet,
            battery: raw.battery.apply(StorageConfig::battery()),
            pumped_hydro: raw.pumped_hydro.apply(StorageConfig::pumped_hydro()),
            hydrogen: raw.hydrogen.apply(StorageConfig::hydrogen()),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let hp = &self.heat_pumps;
        if hp.annual_thermal_kwh < 0.0 {
            push_err(
                &mut errors,
                "heat_pumps.annual_thermal_kwh",
                "must be >= 0",
            );
        }
        if hp.cop <= 0.0 {
            push_err(&mut errors, "heat_pumps.cop", "must be > 0");
        }

        let ev = &self.ev_fleet;
        check_fraction(&mut errors, "ev_fleet.ev_share", ev.ev_share);
        check_fraction(&mut errors, "ev_fleet.plug_share_max", ev.plug_share_max);
        check_fraction(&mut errors, "ev_fleet.v2g_share", ev.v2g_share);
        check_fraction(&mut errors, "ev_fleet.soc_min_day", ev.soc_min_day);
        check_fraction(&mut errors, "ev_fleet.soc_min_night", ev.soc_min_night);
        check_fraction(
            &mut errors,
            "ev_fleet.soc_target_morning",
            ev.soc_target_morning,
        );
        check_fraction(&mut errors, "ev_fleet.initial_soc", ev.initial_soc);
        check_efficiency(&mut errors, "ev_fleet.eta_charge", ev.eta_charge);
        check_efficiency(&mut errors, "ev_fleet.eta_discharge", ev.eta_discharge);
        if ev.battery_kwh_per_car < 0.0 {
            push_err(&mut errors, "ev_fleet.battery_kwh_per_car", "must be >= 0");
        }
        if !(0.0..24.0).contains(&ev.morning_window_start_hour) {
            push_err(
                &mut errors,
                "ev_fleet.morning_window_start_hour",
                "must be in [0, 24)",
            );
        }
        if !(0.0..24.0).contains(&ev.morning_window_end_hour) {
            push_err(
                &mut errors,
                "ev_fleet.morning_window_end_hour",
                "must be in [0, 24)",
            );
        }
        if ev.surplus_threshold_mw < 0.0 {
            push_err(&mut errors, "ev_fleet.surplus_threshold_mw", "must be >= 0");
        }
        if ev.deficit_threshold_mw < 0.0 {
            push_err(&mut errors, "ev_fleet.deficit_threshold_mw", "must be >= 0");
        }

        self.battery.validate_into("battery", &mut errors);
        self.pumped_hydro.validate_into("pumped_hydro", &mut errors);
        self.hydrogen.validate_into("hydrogen", &mut errors);

        errors
    }

    /// Non-fatal configuration lints, most importantly the check for storage
    /// capacities that look like mislabeled power ratings.
    pub fn lints(&self) -> Vec<ConfigError> {
        let mut warnings = Vec::new();
        self.battery.lint_into("battery", &mut warnings);
        self.pumped_hydro.lint_into("pumped_hydro", &mut warnings);
        self.hydrogen.lint_into("hydrogen", &mut warnings);
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
        assert!(cfg.lints().is_empty());
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
year = 2045

[heat_pumps]
n_units = 2000000
annual_thermal_kwh = 10000.0
cop = 3.5
temperature_column = "south"

[ev_fleet]
n_cars = 8000000
ev_share = 1.0

[battery]
capacity_mwh = 60000.0
max_charge_mw = 15000.0
max_discharge_mw = 15000.0
eta_charge = 0.93
eta_discharge = 0.93
min_soc_fraction = 0.05
max_soc_fraction = 0.95
initial_soc_fraction = 0.5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.year), Some(2045));
        assert_eq!(cfg.as_ref().map(|c| c.ev_fleet.n_cars), Some(8_000_000));
        assert_eq!(cfg.as_ref().map(|c| c.battery.capacity_mwh), Some(60000.0));
        // Untouched section keeps its technology default.
        assert_eq!(cfg.as_ref().map(|c| c.hydrogen.eta_charge), Some(0.67));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
year = 2030
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[ev_fleet]
v2g_share = 0.5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.ev_fleet.v2g_share), Some(0.5));
        assert_eq!(cfg.as_ref().map(|c| c.ev_fleet.n_cars), Some(5_000_000));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.year), Some(2030));
    }

    #[test]
    fn partial_storage_section_keeps_own_technology_defaults() {
        let toml = r#"
[pumped_hydro]
capacity_mwh = 50000.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.pumped_hydro.capacity_mwh), Some(50000.0));
        // Omitted efficiencies stay pumped-hydro, not battery.
        assert_eq!(cfg.as_ref().map(|c| c.pumped_hydro.eta_charge), Some(0.88));
        assert_eq!(cfg.as_ref().map(|c| c.pumped_hydro.max_charge_mw), Some(7_000.0));
    }

    #[test]
    fn validation_catches_bad_soc_band() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.min_soc_fraction = 0.9;
        cfg.battery.max_soc_fraction = 0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.min_soc_fraction"));
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.pumped_hydro.eta_discharge = 1.3;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "pumped_hydro.eta_discharge")
        );
    }

    #[test]
    fn validation_catches_bad_cop() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.heat_pumps.cop = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "heat_pumps.cop"));
    }

    #[test]
    fn lint_flags_capacity_that_looks_like_power() {
        let mut cfg = ScenarioConfig::baseline();
        // 10 GW charge power against a 100 MWh "capacity": almost certainly
        // a power figure in the capacity slot.
        cfg.battery.capacity_mwh = 100.0;
        cfg.battery.max_charge_mw = 10_000.0;
        let warnings = cfg.lints();
        assert!(warnings.iter().any(|w| w.field == "battery.capacity_mwh"));
        assert!(warnings[0].message.contains("mislabeled"));
    }

    #[test]
    fn high_storage_has_larger_battery() {
        let base = ScenarioConfig::baseline();
        let high = ScenarioConfig::high_storage();
        assert!(high.battery.capacity_mwh > base.battery.capacity_mwh);
        assert!(high.pumped_hydro.max_charge_mw > base.pumped_hydro.max_charge_mw);
    }

    #[test]
    fn no_ev_preset_disables_fleet() {
        let cfg = ScenarioConfig::no_ev();
        assert_eq!(cfg.ev_fleet.n_cars, 0);
    }
}
