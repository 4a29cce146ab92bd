use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Concrete module/string/inverter layout for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalConfiguration {
    pub modules_per_string: u32,
    pub strings_per_inverter: u32,
    pub inverter_count: u32,
    pub total_modules: u32,
    pub module_power_w: f64,
    pub module_area_m2: f64,
    pub requested_dc_w: f64,
    pub realized_dc_w: f64,
    pub inverter_ac_w: f64,
    pub dc_ac_ratio: f64,
    /// Voltage window actually used for the string-length bounds.
    pub string_bounds: StringBounds,
}

impl ElectricalConfiguration {
    pub fn total_strings(&self) -> u32 {
        self.strings_per_inverter * self.inverter_count
    }

    pub fn realized_dc_kw(&self) -> f64 {
        self.realized_dc_w / 1000.0
    }

    pub fn total_ac_w(&self) -> f64 {
        self.inverter_ac_w * self.inverter_count as f64
    }

    pub fn total_module_area_m2(&self) -> f64 {
        self.module_area_m2 * self.total_modules as f64
    }

    /// Land needed at the given ground-coverage ratio.
    pub fn required_land_area_m2(&self, ground_coverage_ratio: f64) -> f64 {
        if ground_coverage_ratio > 0.0 {
            self.total_module_area_m2() / ground_coverage_ratio
        } else {
            0.0
        }
    }
}

/// Temperature-adjusted limits that bounded modules-per-string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StringBounds {
    pub min_modules: u32,
    pub max_modules: u32,
    pub max_strings_per_inverter: u32,
    /// Module Voc at the minimum design temperature, V
    pub cold_voc_v: f64,
    /// Module Vmp at the maximum design cell temperature, V
    pub hot_vmp_v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdvisoryKind {
    DcAcRatioLow,
    DcAcRatioHigh,
    LowInverterUtilization,
    ExcessAcCapacity,
}

/// Non-blocking design warning paired with a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingAdvisory {
    pub kind: AdvisoryKind,
    pub warning: String,
    pub recommendation: String,
}

/// Coarse inverter-vs-target sizing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompatibilityStatus {
    Ok,
    Oversized,
    Undersized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCheck {
    pub status: CompatibilityStatus,
    pub message: String,
    pub inverters_needed: u32,
}
