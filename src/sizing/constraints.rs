use serde::{Deserialize, Serialize};

use crate::config::SizingConfig;

/// Fixed design limits of the sizing search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingConstraints {
    /// Hard ceiling used for the inverter count.
    pub max_dc_ac_ratio: f64,
    /// Lower edge of the advisory DC:AC window.
    pub min_dc_ac_ratio: f64,
    pub min_inverter_utilization: f64,
    pub excess_ac_threshold_w: f64,
    pub system_max_voltage_v: f64,
    /// Cell temperature above the ambient design maximum, °C
    pub cell_temperature_rise_c: f64,
}

impl Default for SizingConstraints {
    fn default() -> Self {
        SizingConfig::default().into()
    }
}

impl From<SizingConfig> for SizingConstraints {
    fn from(cfg: SizingConfig) -> Self {
        Self {
            max_dc_ac_ratio: cfg.max_dc_ac_ratio,
            min_dc_ac_ratio: cfg.min_dc_ac_ratio,
            min_inverter_utilization: cfg.min_inverter_utilization,
            excess_ac_threshold_w: cfg.excess_ac_threshold_kw * 1000.0,
            system_max_voltage_v: cfg.system_max_voltage_v,
            cell_temperature_rise_c: cfg.cell_temperature_rise_c,
        }
    }
}
