use serde::{Deserialize, Serialize};

/// Voc temperature coefficient used when the catalog has none, %/°C.
pub const DEFAULT_VOC_TEMP_COEFF_PCT: f64 = -0.30;
/// Vmp temperature coefficient used when the catalog has none, %/°C.
pub const DEFAULT_VMP_TEMP_COEFF_PCT: f64 = -0.40;

/// Electrical ratings of a PV module at STC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRatings {
    pub name: String,
    /// Open-circuit voltage, V
    pub voc: f64,
    /// Short-circuit current, A
    pub isc: f64,
    /// Max-power voltage, V
    pub vmp: f64,
    /// Max-power current, A
    pub imp: f64,
    /// Declared STC power, W. Falls back to Vmp × Imp when absent.
    pub stc_power_w: Option<f64>,
    /// Module area, m²
    pub area_m2: f64,
    pub material: Option<String>,
    /// %/°C
    pub temp_coeff_voc_pct: Option<f64>,
    /// %/°C
    pub temp_coeff_vmp_pct: Option<f64>,
    /// %/°C
    pub temp_coeff_pmax_pct: Option<f64>,
}

impl ModuleRatings {
    pub fn rated_power_w(&self) -> f64 {
        match self.stc_power_w {
            Some(p) if p > 0.0 => p,
            _ => self.vmp * self.imp,
        }
    }

    pub fn voc_coefficient_pct(&self) -> f64 {
        self.temp_coeff_voc_pct.unwrap_or(DEFAULT_VOC_TEMP_COEFF_PCT)
    }

    pub fn vmp_coefficient_pct(&self) -> f64 {
        self.temp_coeff_vmp_pct.unwrap_or(DEFAULT_VMP_TEMP_COEFF_PCT)
    }

    /// Power temperature coefficient; Vmp coefficient when none is declared.
    pub fn pmax_coefficient_pct(&self) -> f64 {
        self.temp_coeff_pmax_pct
            .unwrap_or_else(|| self.vmp_coefficient_pct())
    }

    /// Open-circuit voltage at `cell_temp_c`.
    pub fn voc_at(&self, cell_temp_c: f64) -> f64 {
        self.voc * (1.0 + (cell_temp_c - 25.0) * self.voc_coefficient_pct() / 100.0)
    }

    /// Max-power voltage at `cell_temp_c`, derated with the power coefficient.
    pub fn vmp_at(&self, cell_temp_c: f64) -> f64 {
        self.vmp * (1.0 + (cell_temp_c - 25.0) * self.pmax_coefficient_pct() / 100.0)
    }

    /// Names of fields that are missing or non-positive.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        for (name, value) in [
            ("voc", self.voc),
            ("isc", self.isc),
            ("vmp", self.vmp),
            ("imp", self.imp),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bad.push(name);
            }
        }
        if !(self.rated_power_w().is_finite() && self.rated_power_w() > 0.0) && bad.is_empty() {
            bad.push("stc_power_w");
        }
        bad
    }
}

/// Electrical ratings of a string inverter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterRatings {
    pub name: String,
    /// AC power limit, W
    pub pac_max_w: f64,
    /// DC power limit, W
    pub pdc_max_w: f64,
    /// MPPT window lower bound, V
    pub mppt_min_v: f64,
    /// MPPT window upper bound, V
    pub mppt_max_v: f64,
    /// Max DC input current, A
    pub idc_max_a: f64,
    /// Absolute max DC input voltage, V
    pub vdc_max_v: Option<f64>,
}

impl InverterRatings {
    /// Nominal conversion efficiency (Pac / Pdc), capped at 1.
    pub fn nominal_efficiency(&self) -> f64 {
        if self.pdc_max_w > 0.0 {
            (self.pac_max_w / self.pdc_max_w).min(1.0)
        } else {
            0.0
        }
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut bad = Vec::new();
        for (name, value) in [
            ("pac_max_w", self.pac_max_w),
            ("pdc_max_w", self.pdc_max_w),
            ("mppt_min_v", self.mppt_min_v),
            ("mppt_max_v", self.mppt_max_v),
            ("idc_max_a", self.idc_max_a),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bad.push(name);
            }
        }
        if bad.is_empty() && self.mppt_min_v >= self.mppt_max_v {
            bad.push("mppt_window");
        }
        bad
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn module() -> ModuleRatings {
        ModuleRatings {
            name: "Test 320W".to_string(),
            voc: 40.0,
            isc: 10.0,
            vmp: 32.0,
            imp: 10.0,
            stc_power_w: None,
            area_m2: 1.7,
            material: Some("mc-Si".to_string()),
            temp_coeff_voc_pct: Some(-0.3),
            temp_coeff_vmp_pct: Some(-0.4),
            temp_coeff_pmax_pct: None,
        }
    }

    pub fn inverter() -> InverterRatings {
        InverterRatings {
            name: "Test 50kW".to_string(),
            pac_max_w: 50_000.0,
            pdc_max_w: 52_000.0,
            mppt_min_v: 200.0,
            mppt_max_v: 600.0,
            idc_max_a: 120.0,
            vdc_max_v: Some(1000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_rated_power_prefers_declared_stc() {
        let mut m = module();
        assert_eq!(m.rated_power_w(), 320.0);
        m.stc_power_w = Some(330.0);
        assert_eq!(m.rated_power_w(), 330.0);
    }

    #[test]
    fn test_cold_voc_rises_and_hot_vmp_falls() {
        let m = module();
        assert!(m.voc_at(-10.0) > m.voc);
        assert!(m.vmp_at(70.0) < m.vmp);
        assert!((m.voc_at(25.0) - m.voc).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_fields() {
        let mut m = module();
        m.vmp = 0.0;
        assert_eq!(m.invalid_fields(), vec!["vmp"]);

        let mut inv = inverter();
        assert!(inv.invalid_fields().is_empty());
        inv.mppt_min_v = 700.0;
        assert_eq!(inv.invalid_fields(), vec!["mppt_window"]);
    }

    #[test]
    fn test_nominal_efficiency() {
        let inv = inverter();
        assert!((inv.nominal_efficiency() - 50.0 / 52.0).abs() < 1e-12);
    }
}
