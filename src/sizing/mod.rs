//! Electrical sizing: target DC capacity to a module/string/inverter layout.
//!
//! String length is bounded by the inverter MPPT window and the system voltage
//! limit at design-temperature extremes; parallel strings by the inverter DC
//! power and current limits. Inside those bounds the layout with the least
//! capacity overshoot wins, ties going to the longer string.

pub mod constraints;

pub use constraints::*;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    AdvisoryKind, CompatibilityCheck, CompatibilityStatus, ElectricalConfiguration,
    InverterRatings, ModuleRatings, SizingAdvisory, StringBounds,
};
use crate::weather::DesignTemperatures;

/// Share of the target an inverter bank must cover to count as adequate.
const MIN_AC_COVERAGE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SizingErrorKind {
    InvalidTarget,
    InvalidRating,
    VoltageIncompatible,
    CurrentIncompatible,
    DcPowerIncompatible,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SizingError {
    pub kind: SizingErrorKind,
    pub message: String,
}

impl SizingError {
    fn new(kind: SizingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when no layout exists for the component pair.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self.kind,
            SizingErrorKind::VoltageIncompatible
                | SizingErrorKind::CurrentIncompatible
                | SizingErrorKind::DcPowerIncompatible
        )
    }
}

/// A layout plus the advisories raised for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingOutcome {
    pub configuration: ElectricalConfiguration,
    pub advisories: Vec<SizingAdvisory>,
}

#[derive(Debug, Clone, Default)]
pub struct SizingOptimizer {
    constraints: SizingConstraints,
}

struct Candidate {
    modules_per_string: u32,
    strings_per_inverter: u32,
    inverter_count: u32,
    total_modules: u32,
}

fn to_count(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= u32::MAX as f64).then_some(value as u32)
}

impl SizingOptimizer {
    pub fn new(constraints: SizingConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &SizingConstraints {
        &self.constraints
    }

    /// Size against the fallback design temperatures.
    pub fn size(
        &self,
        target_dc_kw: f64,
        module: &ModuleRatings,
        inverter: &InverterRatings,
    ) -> Result<SizingOutcome, SizingError> {
        self.size_with_temperatures(target_dc_kw, module, inverter, &DesignTemperatures::fallback())
    }

    pub fn size_with_temperatures(
        &self,
        target_dc_kw: f64,
        module: &ModuleRatings,
        inverter: &InverterRatings,
        temps: &DesignTemperatures,
    ) -> Result<SizingOutcome, SizingError> {
        if !(target_dc_kw.is_finite() && target_dc_kw > 0.0) {
            return Err(SizingError::new(
                SizingErrorKind::InvalidTarget,
                format!("target capacity must be positive, got {target_dc_kw} kW"),
            ));
        }
        validate_ratings(module, inverter)?;

        let bounds = self.string_bounds(module, inverter, temps)?;
        let module_w = module.rated_power_w();
        let requested_w = target_dc_kw * 1000.0;

        let best = self
            .search(requested_w, module, inverter, &bounds)?
            .ok_or_else(|| single_string_rejected(module, inverter, &bounds))?;

        let realized_dc_w = best.total_modules as f64 * module_w;
        let total_ac_w = best.inverter_count as f64 * inverter.pac_max_w;
        let configuration = ElectricalConfiguration {
            modules_per_string: best.modules_per_string,
            strings_per_inverter: best.strings_per_inverter,
            inverter_count: best.inverter_count,
            total_modules: best.total_modules,
            module_power_w: module_w,
            module_area_m2: module.area_m2,
            requested_dc_w: requested_w,
            realized_dc_w,
            inverter_ac_w: inverter.pac_max_w,
            dc_ac_ratio: realized_dc_w / total_ac_w,
            string_bounds: StringBounds {
                max_strings_per_inverter: self.max_strings(best.modules_per_string, module, inverter),
                ..bounds
            },
        };
        let advisories = self.advisories(&configuration, inverter);

        debug!(
            modules_per_string = configuration.modules_per_string,
            strings_per_inverter = configuration.strings_per_inverter,
            inverters = configuration.inverter_count,
            dc_ac_ratio = configuration.dc_ac_ratio,
            advisories = advisories.len(),
            "sizing complete"
        );

        Ok(SizingOutcome {
            configuration,
            advisories,
        })
    }

    /// Modules-per-string window at the design-temperature extremes.
    pub fn string_bounds(
        &self,
        module: &ModuleRatings,
        inverter: &InverterRatings,
        temps: &DesignTemperatures,
    ) -> Result<StringBounds, SizingError> {
        let cold_voc = module.voc_at(temps.min_c);
        let hot_vmp = module.vmp_at(temps.max_c + self.constraints.cell_temperature_rise_c);
        let system_max = inverter
            .vdc_max_v
            .filter(|v| *v > 0.0)
            .map_or(self.constraints.system_max_voltage_v, |v| {
                v.min(self.constraints.system_max_voltage_v)
            });

        let upper = (inverter.mppt_max_v / module.vmp)
            .floor()
            .min((system_max / cold_voc).floor());
        let lower = (inverter.mppt_min_v / hot_vmp).ceil();

        let window = match (to_count(lower), to_count(upper)) {
            (Some(lo), Some(hi)) if hot_vmp > 0.0 && cold_voc > 0.0 && hi >= lo.max(1) => {
                Some((lo.max(1), hi))
            }
            _ => None,
        };
        let Some((min_modules, max_modules)) = window else {
            return Err(SizingError::new(
                SizingErrorKind::VoltageIncompatible,
                format!(
                    "no string length fits {}: needs at least {lower} modules for MPPT min {:.0} V (hot Vmp {hot_vmp:.2} V) \
                     but at most {upper} for MPPT max {:.0} V / system max {system_max:.0} V (cold Voc {cold_voc:.2} V)",
                    inverter.name, inverter.mppt_min_v, inverter.mppt_max_v
                ),
            ));
        };

        Ok(StringBounds {
            min_modules,
            max_modules,
            max_strings_per_inverter: 0,
            cold_voc_v: cold_voc,
            hot_vmp_v: hot_vmp,
        })
    }

    /// Parallel strings one inverter accepts at a given string length.
    fn max_strings(&self, modules_per_string: u32, module: &ModuleRatings, inverter: &InverterRatings) -> u32 {
        let string_w = modules_per_string as f64 * module.rated_power_w();
        let by_power = (inverter.pdc_max_w / string_w).floor();
        let by_current = (inverter.idc_max_a / module.isc).floor();
        to_count(by_power.min(by_current)).unwrap_or(0)
    }

    fn search(
        &self,
        requested_w: f64,
        module: &ModuleRatings,
        inverter: &InverterRatings,
        bounds: &StringBounds,
    ) -> Result<Option<Candidate>, SizingError> {
        let module_w = module.rated_power_w();
        let modules_needed = to_count((requested_w / module_w).ceil()).ok_or_else(|| {
            SizingError::new(SizingErrorKind::InvalidTarget, "target capacity is too large")
        })?;
        let min_by_ratio = (requested_w / (inverter.pac_max_w * self.constraints.max_dc_ac_ratio)).ceil();

        let mut best: Option<(f64, Candidate)> = None;
        for n in bounds.min_modules..=bounds.max_modules {
            let per_inverter = self.max_strings(n, module, inverter);
            if per_inverter == 0 {
                continue;
            }
            let modules_per_inverter = n as f64 * per_inverter as f64;
            let inverters = (modules_needed as f64 / modules_per_inverter)
                .ceil()
                .max(min_by_ratio);
            let total_strings = (modules_needed as f64 / n as f64).ceil();
            let strings_per_inverter = (total_strings / inverters).ceil();
            let total = n as f64 * strings_per_inverter * inverters;

            let (Some(inverter_count), Some(strings_per_inverter), Some(total_modules)) = (
                to_count(inverters),
                to_count(strings_per_inverter),
                to_count(total),
            ) else {
                continue;
            };

            let waste = total * module_w - requested_w;
            // Iterating upwards, `<=` hands ties to the longer string.
            if best.as_ref().map_or(true, |(w, _)| waste <= *w) {
                best = Some((
                    waste,
                    Candidate {
                        modules_per_string: n,
                        strings_per_inverter,
                        inverter_count,
                        total_modules,
                    },
                ));
            }
        }
        Ok(best.map(|(_, c)| c))
    }

    fn advisories(&self, cfg: &ElectricalConfiguration, inverter: &InverterRatings) -> Vec<SizingAdvisory> {
        let c = &self.constraints;
        let mut out = Vec::new();

        if cfg.dc_ac_ratio < c.min_dc_ac_ratio {
            out.push(SizingAdvisory {
                kind: AdvisoryKind::DcAcRatioLow,
                warning: format!(
                    "DC:AC ratio {:.2} is below {:.2}; the inverters will rarely run near rated output",
                    cfg.dc_ac_ratio, c.min_dc_ac_ratio
                ),
                recommendation: "Use a smaller inverter or fewer inverters, or add modules".to_string(),
            });
        } else if cfg.dc_ac_ratio > c.max_dc_ac_ratio {
            out.push(SizingAdvisory {
                kind: AdvisoryKind::DcAcRatioHigh,
                warning: format!(
                    "DC:AC ratio {:.2} exceeds {:.2}; expect clipping losses",
                    cfg.dc_ac_ratio, c.max_dc_ac_ratio
                ),
                recommendation: "Use a larger inverter or add inverters".to_string(),
            });
        }

        let utilization = cfg.realized_dc_w / cfg.inverter_count as f64 / inverter.pdc_max_w;
        if utilization < c.min_inverter_utilization {
            out.push(SizingAdvisory {
                kind: AdvisoryKind::LowInverterUtilization,
                warning: format!(
                    "each inverter receives {:.0}% of its DC rating",
                    utilization * 100.0
                ),
                recommendation: "Choose an inverter closer to the array size per inverter".to_string(),
            });
        }

        let excess_w = cfg.total_ac_w() - cfg.realized_dc_w;
        if excess_w > c.excess_ac_threshold_w {
            out.push(SizingAdvisory {
                kind: AdvisoryKind::ExcessAcCapacity,
                warning: format!(
                    "installed AC capacity exceeds the array by {:.1} kW",
                    excess_w / 1000.0
                ),
                recommendation: "Reduce the inverter count or rating".to_string(),
            });
        }
        out
    }

    /// Coarse check of one inverter model against a target size.
    pub fn check_compatibility(&self, target_kw: f64, inverter: &InverterRatings) -> CompatibilityCheck {
        let target_w = target_kw * 1000.0;
        let needed = if inverter.pac_max_w > 0.0 {
            to_count((target_w / inverter.pac_max_w).ceil()).unwrap_or(u32::MAX)
        } else {
            0
        };

        let covered_w = inverter.pac_max_w * f64::from(needed);

        let (status, message) = if inverter.pac_max_w > target_w * self.constraints.max_dc_ac_ratio {
            (
                CompatibilityStatus::Oversized,
                format!("Inverter is oversized. Consider using a smaller inverter for {target_kw}kW system."),
            )
        } else if covered_w < target_w * MIN_AC_COVERAGE {
            (
                CompatibilityStatus::Undersized,
                format!("Inverter is undersized. Need {needed} inverters for {target_kw}kW system."),
            )
        } else {
            (
                CompatibilityStatus::Ok,
                format!("Sizing is appropriate. Using {needed} inverter(s)."),
            )
        };

        CompatibilityCheck {
            status,
            message,
            inverters_needed: needed,
        }
    }
}

/// Error for a pair where no inverter takes even one string, named after the
/// limit that ran out.
fn single_string_rejected(module: &ModuleRatings, inverter: &InverterRatings, bounds: &StringBounds) -> SizingError {
    if module.isc > inverter.idc_max_a {
        return SizingError::new(
            SizingErrorKind::CurrentIncompatible,
            format!(
                "{} cannot accept a single string of {}: string current {:.2} A exceeds the {:.2} A DC limit",
                inverter.name, module.name, module.isc, inverter.idc_max_a
            ),
        );
    }
    let shortest_w = bounds.min_modules as f64 * module.rated_power_w();
    SizingError::new(
        SizingErrorKind::DcPowerIncompatible,
        format!(
            "{} cannot accept a single string of {}: the shortest string ({} modules, {:.0} W) exceeds the {:.0} W DC limit",
            inverter.name, module.name, bounds.min_modules, shortest_w, inverter.pdc_max_w
        ),
    )
}

fn validate_ratings(module: &ModuleRatings, inverter: &InverterRatings) -> Result<(), SizingError> {
    let bad_module = module.invalid_fields();
    if !bad_module.is_empty() {
        return Err(SizingError::new(
            SizingErrorKind::InvalidRating,
            format!("module {} has invalid ratings: {}", module.name, bad_module.join(", ")),
        ));
    }
    let bad_inverter = inverter.invalid_fields();
    if !bad_inverter.is_empty() {
        return Err(SizingError::new(
            SizingErrorKind::InvalidRating,
            format!("inverter {} has invalid ratings: {}", inverter.name, bad_inverter.join(", ")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ratings::fixtures;
    use rstest::rstest;

    #[test]
    fn test_reference_pair_stays_in_window() {
        let opt = SizingOptimizer::default();
        let out = opt.size(100.0, &fixtures::module(), &fixtures::inverter()).unwrap();
        let cfg = &out.configuration;
        assert!((7..=18).contains(&cfg.modules_per_string));
        assert!(cfg.string_bounds.min_modules >= 7);
        assert!(cfg.string_bounds.max_modules <= 18);
        assert!(cfg.realized_dc_w >= cfg.requested_dc_w);
        assert!(cfg.strings_per_inverter as f64 * fixtures::module().isc <= fixtures::inverter().idc_max_a);
        assert_eq!(
            cfg.total_modules,
            cfg.modules_per_string * cfg.strings_per_inverter * cfg.inverter_count
        );
    }

    #[test]
    fn test_hot_and_cold_bounds_use_design_temperatures() {
        let opt = SizingOptimizer::default();
        let bounds = opt
            .string_bounds(&fixtures::module(), &fixtures::inverter(), &DesignTemperatures::fallback())
            .unwrap();
        // 32 V × (1 - 0.4 % × 45 K) = 26.24 V, so ceil(200 / 26.24) = 8
        assert_eq!(bounds.min_modules, 8);
        assert_eq!(bounds.max_modules, 18);
        assert!(bounds.cold_voc_v > 40.0);
    }

    #[test]
    fn test_narrow_mppt_window_is_voltage_incompatible() {
        let mut inverter = fixtures::inverter();
        inverter.mppt_min_v = 250.0;
        inverter.mppt_max_v = 260.0;
        let err = SizingOptimizer::default()
            .size(50.0, &fixtures::module(), &inverter)
            .unwrap_err();
        assert_eq!(err.kind, SizingErrorKind::VoltageIncompatible);
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_tiny_current_limit_is_current_incompatible() {
        let mut inverter = fixtures::inverter();
        inverter.idc_max_a = 5.0;
        let err = SizingOptimizer::default()
            .size(50.0, &fixtures::module(), &inverter)
            .unwrap_err();
        assert_eq!(err.kind, SizingErrorKind::CurrentIncompatible);
    }

    #[test]
    fn test_low_dc_power_limit_is_power_incompatible() {
        let mut inverter = fixtures::inverter();
        inverter.pdc_max_w = 2_100.0;
        inverter.idc_max_a = 100.0;
        let err = SizingOptimizer::default()
            .size(5.0, &fixtures::module(), &inverter)
            .unwrap_err();
        assert_eq!(err.kind, SizingErrorKind::DcPowerIncompatible);
        assert_eq!(err.kind.to_string(), "dc_power_incompatible");
        assert!(err.is_infeasible());
        assert!(err.message.contains("2560 W"), "{}", err.message);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn test_invalid_target(#[case] target: f64) {
        let err = SizingOptimizer::default()
            .size(target, &fixtures::module(), &fixtures::inverter())
            .unwrap_err();
        assert_eq!(err.kind, SizingErrorKind::InvalidTarget);
    }

    #[test]
    fn test_invalid_rating_names_field() {
        let mut module = fixtures::module();
        module.vmp = 0.0;
        let err = SizingOptimizer::default()
            .size(10.0, &module, &fixtures::inverter())
            .unwrap_err();
        assert_eq!(err.kind, SizingErrorKind::InvalidRating);
        assert!(err.message.contains("vmp"));
    }

    #[test]
    fn test_small_system_on_large_inverter_raises_advisories() {
        let out = SizingOptimizer::default()
            .size(5.0, &fixtures::module(), &fixtures::inverter())
            .unwrap();
        let kinds: Vec<_> = out.advisories.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AdvisoryKind::DcAcRatioLow));
        assert!(kinds.contains(&AdvisoryKind::LowInverterUtilization));
        assert!(kinds.contains(&AdvisoryKind::ExcessAcCapacity));
    }

    #[rstest]
    #[case(10.0, 100_000.0, CompatibilityStatus::Oversized)]
    #[case(100.0, 50_000.0, CompatibilityStatus::Ok)]
    #[case(100.0, 30_000.0, CompatibilityStatus::Ok)]
    fn test_check_compatibility(#[case] target_kw: f64, #[case] pac: f64, #[case] expected: CompatibilityStatus) {
        let mut inverter = fixtures::inverter();
        inverter.pac_max_w = pac;
        let check = SizingOptimizer::default().check_compatibility(target_kw, &inverter);
        assert_eq!(check.status, expected);
        assert_eq!(check.inverters_needed, (target_kw * 1000.0 / pac).ceil() as u32);
    }

    #[test]
    fn test_check_compatibility_without_ac_rating_is_undersized() {
        let mut inverter = fixtures::inverter();
        inverter.pac_max_w = 0.0;
        let check = SizingOptimizer::default().check_compatibility(20.0, &inverter);
        assert_eq!(check.status, CompatibilityStatus::Undersized);
        assert_eq!(check.inverters_needed, 0);
    }
}
