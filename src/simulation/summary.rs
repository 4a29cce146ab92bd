use serde::Serialize;

use super::YieldOutput;
use crate::domain::{ElectricalConfiguration, WeatherSeries};

/// Annual, monthly and daily-profile figures derived from hourly output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySummary {
    pub annual_energy_kwh: f64,
    pub peak_ac_kw: f64,
    pub peak_dc_kw: f64,
    /// Final yield over reference (POA) yield.
    pub performance_ratio: f64,
    /// Fraction of the year at nameplate DC output.
    pub capacity_factor: f64,
    /// kWh per installed kWp.
    pub specific_yield: f64,
    /// AC energy per calendar month, kWh
    pub monthly_energy_kwh: [f64; 12],
    /// Mean AC power for each hour of the day, W
    pub daily_profile_w: [f64; 24],
    pub mean_effective_irradiance: f64,
    pub mean_cell_temperature: f64,
}

impl EnergySummary {
    pub fn from_output(output: &YieldOutput, weather: &WeatherSeries, cfg: &ElectricalConfiguration) -> Self {
        let annual_energy_kwh = output.ac_w.iter().sum::<f64>() / 1000.0;
        let peak = |v: &[f64]| v.iter().copied().fold(0.0, f64::max) / 1000.0;

        let mut monthly_energy_kwh = [0.0; 12];
        for (month, ac) in weather.month_indices().zip(&output.ac_w) {
            monthly_energy_kwh[month] += ac / 1000.0;
        }

        let mut hour_sums = [0.0; 24];
        let mut hour_counts = [0usize; 24];
        for (hour, ac) in weather.hour_indices().zip(&output.ac_w) {
            hour_sums[hour] += ac;
            hour_counts[hour] += 1;
        }
        let mut daily_profile_w = [0.0; 24];
        for h in 0..24 {
            if hour_counts[h] > 0 {
                daily_profile_w[h] = hour_sums[h] / hour_counts[h] as f64;
            }
        }

        let dc_kw = cfg.realized_dc_kw();
        let hours = output.ac_w.len() as f64;
        let reference_yield = output.poa_global.iter().sum::<f64>() / 1000.0;
        let specific_yield = if dc_kw > 0.0 { annual_energy_kwh / dc_kw } else { 0.0 };
        let performance_ratio = if reference_yield > 0.0 {
            specific_yield / reference_yield
        } else {
            0.0
        };
        let capacity_factor = if dc_kw > 0.0 && hours > 0.0 {
            annual_energy_kwh / (dc_kw * hours)
        } else {
            0.0
        };

        Self {
            annual_energy_kwh,
            peak_ac_kw: peak(&output.ac_w),
            peak_dc_kw: peak(&output.dc_w),
            performance_ratio,
            capacity_factor,
            specific_yield,
            monthly_energy_kwh,
            daily_profile_w,
            mean_effective_irradiance: output.mean_effective_irradiance,
            mean_cell_temperature: output.mean_cell_temperature,
        }
    }
}
