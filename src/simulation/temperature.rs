//! Cell temperature models and their mounting presets.

use serde::{Deserialize, Serialize};

/// Absorbed share of incident irradiance in the PVsyst model.
const PVSYST_ABSORPTION: f64 = 0.9;
/// Electrical efficiency assumed by the PVsyst model.
const PVSYST_EFFICIENCY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TemperatureModel {
    /// Sandia array model: `a`, `b` empirical, `delta_t` cell-to-back rise at 1000 W/m².
    Sapm { a: f64, b: f64, delta_t: f64 },
    /// PVsyst heat-loss model: constant and wind-dependent loss factors.
    Pvsyst { u_c: f64, u_v: f64 },
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::sapm("open_rack_glass_polymer")
    }
}

impl TemperatureModel {
    /// SAPM parameters for a mounting configuration.
    pub fn sapm(mount: &str) -> Self {
        let (a, b, delta_t) = match mount {
            "open_rack_glass_glass" => (-3.47, -0.0594, 3.0),
            "close_mount_glass_glass" => (-2.98, -0.0471, 1.0),
            "open_rack_glass_polymer" => (-3.56, -0.0750, 3.0),
            "insulated_back_glass_polymer" => (-2.81, -0.0455, 0.0),
            _ => (-3.56, -0.075, 3.0),
        };
        Self::Sapm { a, b, delta_t }
    }

    /// PVsyst parameters for a mounting configuration.
    pub fn pvsyst(mount: &str) -> Self {
        let (u_c, u_v) = match mount {
            "insulated" => (15.0, 0.0),
            _ => (29.0, 0.0),
        };
        Self::Pvsyst { u_c, u_v }
    }

    /// Preset lookup by model name (`sapm` or `pvsyst`) and mount type.
    pub fn preset(model: &str, mount: &str) -> Self {
        if model.eq_ignore_ascii_case("pvsyst") {
            Self::pvsyst(mount)
        } else {
            Self::sapm(mount)
        }
    }

    /// Cell temperature, °C.
    pub fn cell_temperature(&self, poa_global: f64, air_temperature: f64, wind_speed: f64) -> f64 {
        match *self {
            Self::Sapm { a, b, delta_t } => {
                let module = poa_global * (a + b * wind_speed).exp() + air_temperature;
                module + poa_global / 1000.0 * delta_t
            }
            Self::Pvsyst { u_c, u_v } => {
                let u = u_c + u_v * wind_speed;
                if u <= 0.0 {
                    return air_temperature;
                }
                air_temperature + poa_global * PVSYST_ABSORPTION * (1.0 - PVSYST_EFFICIENCY) / u
            }
        }
    }
}
