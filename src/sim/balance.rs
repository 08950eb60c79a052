//! Quarter-hour balance calculation and the annual balance report.

use std::fmt;

use crate::error::SimError;
use crate::series::{
    COL_BALANCE, COL_CONSUMPTION, COL_PRODUCTION, COL_RESIDUAL, COL_TOTAL, TimeSeries,
};

/// Computes the quarter-hour production/consumption balance for one year.
///
/// Both input series are aligned onto the target year's canonical grid before
/// any arithmetic, so misordered or duplicated rows can never skew the sums.
#[derive(Debug, Clone, Copy)]
pub struct BalanceCalculator {
    /// Target simulation year.
    pub year: i32,
}

impl BalanceCalculator {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    /// Builds the balance series from a production and a consumption series.
    ///
    /// Each side is summed across its columns; a series carrying an explicit
    /// total column contributes only that column. The result holds
    /// `production_mwh`, `consumption_mwh`, `balance_mwh` and a
    /// `residual_balance_mwh` column that starts as a copy of the balance and
    /// is consumed by the dispatch stages downstream.
    ///
    /// # Errors
    ///
    /// Returns `SimError::DataCompleteness` if either side leaves gaps on the
    /// target year's grid.
    pub fn compute(
        &self,
        production: &TimeSeries,
        consumption: &TimeSeries,
    ) -> Result<TimeSeries, SimError> {
        let production = production.align_to_year(self.year, "production")?;
        let consumption = consumption.align_to_year(self.year, "consumption")?;

        let prod = side_sum(&production);
        let cons = side_sum(&consumption);
        let balance: Vec<f64> = prod.iter().zip(&cons).map(|(p, c)| p - c).collect();

        let mut out = TimeSeries::new(production.timestamps().to_vec());
        out.push_column(COL_PRODUCTION, prod);
        out.push_column(COL_CONSUMPTION, cons);
        out.push_column(COL_BALANCE, balance.clone());
        out.push_column(COL_RESIDUAL, balance);
        Ok(out)
    }
}

/// Sums one side of the balance: the explicit total column if present,
/// otherwise all numeric columns.
fn side_sum(series: &TimeSeries) -> Vec<f64> {
    match series.column(COL_TOTAL) {
        Some(total) => total.to_vec(),
        None => series.row_sums(),
    }
}

/// Annual metrics over one balance column.
///
/// Energies are reported in TWh, durations in hours and peaks in MW.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    /// Column the report was computed over.
    pub column: String,
    /// Total positive (surplus) energy in TWh.
    pub surplus_twh: f64,
    /// Total negative (deficit) energy in TWh, as a positive number.
    pub deficit_twh: f64,
    /// Hours with a positive balance.
    pub surplus_hours: f64,
    /// Hours with a negative balance.
    pub deficit_hours: f64,
    /// Largest single-step surplus expressed as average power (MW).
    pub peak_surplus_mw: f64,
    /// Largest single-step deficit expressed as average power (MW, positive).
    pub peak_deficit_mw: f64,
    /// Annual production in TWh, when the series carries the column.
    pub production_twh: Option<f64>,
    /// Annual consumption in TWh, when the series carries the column.
    pub consumption_twh: Option<f64>,
    /// Fraction of quarter-hour intervals with a positive balance.
    pub self_sufficiency: f64,
}

impl BalanceReport {
    /// Computes the report over the named balance column of a series.
    ///
    /// # Errors
    ///
    /// Returns `SimError::MissingColumn` if the column is not present.
    pub fn from_series(series: &TimeSeries, column: &str) -> Result<Self, SimError> {
        let values = series.column(column).ok_or_else(|| SimError::MissingColumn {
            label: "balance".to_string(),
            column: column.to_string(),
        })?;

        let mut surplus_mwh = 0.0;
        let mut deficit_mwh = 0.0;
        let mut surplus_steps = 0u64;
        let mut deficit_steps = 0u64;
        let mut max_step = 0.0f64;
        let mut min_step = 0.0f64;
        for &v in values {
            if v > 0.0 {
                surplus_mwh += v;
                surplus_steps += 1;
            } else if v < 0.0 {
                deficit_mwh += -v;
                deficit_steps += 1;
            }
            max_step = max_step.max(v);
            min_step = min_step.min(v);
        }

        let production_twh = series
            .column(COL_PRODUCTION)
            .map(|c| c.iter().sum::<f64>() / 1e6);
        let consumption_twh = series
            .column(COL_CONSUMPTION)
            .map(|c| c.iter().sum::<f64>() / 1e6);
        // Interval count, not energy coverage: an hour of tiny deficit
        // counts against the share the same as an hour of deep deficit.
        let self_sufficiency = if values.is_empty() {
            0.0
        } else {
            surplus_steps as f64 / values.len() as f64
        };

        Ok(Self {
            column: column.to_string(),
            surplus_twh: surplus_mwh / 1e6,
            deficit_twh: deficit_mwh / 1e6,
            surplus_hours: surplus_steps as f64 * 0.25,
            deficit_hours: deficit_steps as f64 * 0.25,
            // A step holds MWh over a quarter hour, so average MW is x4.
            peak_surplus_mw: max_step * 4.0,
            peak_deficit_mw: -min_step * 4.0,
            production_twh,
            consumption_twh,
            self_sufficiency,
        })
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Balance Report ({}) ===", self.column)?;
        if let Some(prod) = self.production_twh {
            writeln!(f, "Production:       {prod:>10.2} TWh")?;
        }
        if let Some(cons) = self.consumption_twh {
            writeln!(f, "Consumption:      {cons:>10.2} TWh")?;
        }
        writeln!(f, "Surplus energy:   {:>10.2} TWh", self.surplus_twh)?;
        writeln!(f, "Deficit energy:   {:>10.2} TWh", self.deficit_twh)?;
        writeln!(f, "Surplus hours:    {:>10.1} h", self.surplus_hours)?;
        writeln!(f, "Deficit hours:    {:>10.1} h", self.deficit_hours)?;
        writeln!(f, "Peak surplus:     {:>10.1} MW", self.peak_surplus_mw)?;
        writeln!(f, "Peak deficit:     {:>10.1} MW", self.peak_deficit_mw)?;
        writeln!(f, "Self-sufficiency: {:>10.1} %", self.self_sufficiency * 100.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::year_grid;

    fn flat_series(year: i32, column: &str, value: f64) -> TimeSeries {
        let stamps = year_grid(year);
        let n = stamps.len();
        let mut series = TimeSeries::new(stamps);
        series.push_column(column, vec![value; n]);
        series
    }

    #[test]
    fn balance_is_production_minus_consumption() {
        let prod = flat_series(2030, "wind_mwh", 120.0);
        let cons = flat_series(2030, "base_mwh", 100.0);
        let calc = BalanceCalculator::new(2030);
        let result = calc.compute(&prod, &cons);
        assert!(result.is_ok());
        let series = result.ok();
        let balance = series.as_ref().and_then(|s| s.column(COL_BALANCE));
        assert!(balance.is_some_and(|b| b.iter().all(|v| (v - 20.0).abs() < 1e-9)));
    }

    #[test]
    fn explicit_total_column_wins_over_row_sum() {
        let stamps = year_grid(2030);
        let n = stamps.len();
        let mut prod = TimeSeries::new(stamps.clone());
        prod.push_column("wind_mwh", vec![50.0; n]);
        prod.push_column("solar_mwh", vec![50.0; n]);
        prod.push_column(COL_TOTAL, vec![70.0; n]);
        let cons = flat_series(2030, "base_mwh", 60.0);

        let result = BalanceCalculator::new(2030).compute(&prod, &cons);
        let balance = result.as_ref().ok().and_then(|s| s.column(COL_BALANCE));
        // 70 - 60, not (50 + 50 + 70) - 60.
        assert!(balance.is_some_and(|b| (b[0] - 10.0).abs() < 1e-9));
    }

    #[test]
    fn multi_column_sides_are_summed() {
        let stamps = year_grid(2030);
        let n = stamps.len();
        let mut prod = TimeSeries::new(stamps);
        prod.push_column("wind_mwh", vec![30.0; n]);
        prod.push_column("solar_mwh", vec![25.0; n]);
        let cons = flat_series(2030, "base_mwh", 40.0);

        let result = BalanceCalculator::new(2030).compute(&prod, &cons);
        let balance = result.as_ref().ok().and_then(|s| s.column(COL_BALANCE));
        assert!(balance.is_some_and(|b| (b[0] - 15.0).abs() < 1e-9));
    }

    #[test]
    fn gappy_input_is_fatal() {
        let mut stamps = year_grid(2030);
        stamps.truncate(stamps.len() - 96);
        let n = stamps.len();
        let mut prod = TimeSeries::new(stamps);
        prod.push_column("wind_mwh", vec![10.0; n]);
        let cons = flat_series(2030, "base_mwh", 10.0);

        let result = BalanceCalculator::new(2030).compute(&prod, &cons);
        assert!(matches!(
            result,
            Err(SimError::DataCompleteness { missing: 96, .. })
        ));
    }

    #[test]
    fn report_metrics() {
        let stamps: Vec<_> = year_grid(2030).into_iter().take(4).collect();
        let mut series = TimeSeries::new(stamps);
        series.push_column(COL_BALANCE, vec![100.0, -50.0, 0.0, 200.0]);
        let report = BalanceReport::from_series(&series, COL_BALANCE);
        assert!(report.is_ok());
        let r = report.ok();
        assert!(r.as_ref().is_some_and(|r| (r.surplus_twh - 300.0 / 1e6).abs() < 1e-12));
        assert!(r.as_ref().is_some_and(|r| (r.deficit_twh - 50.0 / 1e6).abs() < 1e-12));
        assert!(r.as_ref().is_some_and(|r| (r.surplus_hours - 0.5).abs() < 1e-12));
        assert!(r.as_ref().is_some_and(|r| (r.deficit_hours - 0.25).abs() < 1e-12));
        assert!(r.as_ref().is_some_and(|r| (r.peak_surplus_mw - 800.0).abs() < 1e-9));
        assert!(r.as_ref().is_some_and(|r| (r.peak_deficit_mw - 200.0).abs() < 1e-9));
        // 2 of 4 intervals in surplus; the zero step counts as neither.
        assert!(r.as_ref().is_some_and(|r| (r.self_sufficiency - 0.5).abs() < 1e-12));
    }

    #[test]
    fn report_missing_column_is_an_error() {
        let stamps: Vec<_> = year_grid(2030).into_iter().take(4).collect();
        let series = TimeSeries::new(stamps);
        let report = BalanceReport::from_series(&series, COL_BALANCE);
        assert!(matches!(report, Err(SimError::MissingColumn { .. })));
    }

    #[test]
    fn report_display_lists_all_metrics() {
        let stamps: Vec<_> = year_grid(2030).into_iter().take(2).collect();
        let mut series = TimeSeries::new(stamps);
        series.push_column(COL_PRODUCTION, vec![100.0, 100.0]);
        series.push_column(COL_CONSUMPTION, vec![80.0, 120.0]);
        series.push_column(COL_BALANCE, vec![20.0, -20.0]);
        let report = BalanceReport::from_series(&series, COL_BALANCE);
        let text = report.as_ref().map(|r| r.to_string()).unwrap_or_default();
        assert!(text.contains("Surplus energy"));
        assert!(text.contains("Peak deficit"));
        assert!(text.contains("Self-sufficiency"));
    }

    #[test]
    fn self_sufficiency_counts_surplus_intervals_not_energy() {
        // A deep deficit step weighs the same as a shallow one: the metric
        // is the fraction of intervals in surplus, not energy coverage.
        let stamps: Vec<_> = year_grid(2030).into_iter().take(4).collect();
        let mut series = TimeSeries::new(stamps);
        series.push_column(COL_CONSUMPTION, vec![100.0; 4]);
        series.push_column(COL_BALANCE, vec![10.0, 0.0, -0.001, -5000.0]);
        let report = BalanceReport::from_series(&series, COL_BALANCE);
        assert!(
            report
                .ok()
                .map(|r| r.self_sufficiency)
                .is_some_and(|s| (s - 0.25).abs() < 1e-12)
        );
    }
}
