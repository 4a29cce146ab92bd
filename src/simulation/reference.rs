use tracing::debug;

use super::solar::{isotropic_poa, solar_position};
use super::{SimulationError, SimulationInput, YieldOutput, YieldSimulator};

/// PVWatts-style loss factors, as fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemLosses {
    pub soiling: f64,
    pub mismatch: f64,
    pub wiring: f64,
}

impl Default for SystemLosses {
    fn default() -> Self {
        Self {
            soiling: 0.02,
            mismatch: 0.02,
            wiring: 0.02,
        }
    }
}

impl SystemLosses {
    /// Multiplier applied to DC power.
    pub fn derate(&self) -> f64 {
        (1.0 - self.soiling) * (1.0 - self.mismatch) * (1.0 - self.wiring)
    }
}

/// Isotropic transposition, configurable cell temperature, linear power
/// temperature coefficient and a flat-efficiency inverter clipped at its AC rating.
#[derive(Debug, Clone, Default)]
pub struct ReferenceYieldSimulator {
    losses: SystemLosses,
}

impl ReferenceYieldSimulator {
    pub fn new(losses: SystemLosses) -> Self {
        Self { losses }
    }
}

impl YieldSimulator for ReferenceYieldSimulator {
    fn simulate(&self, input: &SimulationInput<'_>) -> Result<YieldOutput, SimulationError> {
        let site = input.site;
        if !(0.0..=90.0).contains(&site.tilt_deg) {
            return Err(SimulationError::Geometry(format!(
                "tilt must be within 0..=90 degrees, got {}",
                site.tilt_deg
            )));
        }
        if !site.azimuth_deg.is_finite() {
            return Err(SimulationError::Geometry("azimuth is not finite".to_string()));
        }

        let cfg = input.configuration;
        let gamma = input.module.pmax_coefficient_pct() / 100.0;
        let derate = self.losses.derate();
        let efficiency = input.inverter.nominal_efficiency();
        let inverters = cfg.inverter_count.max(1) as f64;
        let pac_per_inverter = input.inverter.pac_max_w;

        let records = input.weather.records();
        let mut ac_w = Vec::with_capacity(records.len());
        let mut dc_w = Vec::with_capacity(records.len());
        let mut poa_global = Vec::with_capacity(records.len());
        let mut cell_sum = 0.0;

        for r in records {
            let sun = solar_position(site.latitude, site.longitude, r.timestamp);
            let poa = isotropic_poa(
                site.tilt_deg,
                site.azimuth_deg,
                &sun,
                r.dni,
                r.ghi,
                r.dhi,
                r.albedo,
            )
            .global();
            let cell = input
                .temperature_model
                .cell_temperature(poa, r.air_temperature, r.wind_speed);

            let dc = (cfg.realized_dc_w * poa / 1000.0 * (1.0 + gamma * (cell - 25.0)) * derate).max(0.0);
            let ac = (dc / inverters * efficiency).min(pac_per_inverter) * inverters;

            poa_global.push(poa);
            dc_w.push(dc);
            ac_w.push(ac);
            cell_sum += cell;
        }

        let n = records.len().max(1) as f64;
        let output = YieldOutput {
            mean_effective_irradiance: poa_global.iter().sum::<f64>() / n,
            mean_cell_temperature: cell_sum / n,
            ac_w,
            dc_w,
            poa_global,
        };
        if output.ac_w.len() != input.weather.len() {
            return Err(SimulationError::Shape {
                expected: input.weather.len(),
                actual: output.ac_w.len(),
            });
        }

        debug!(
            hours = output.ac_w.len(),
            mean_poa = output.mean_effective_irradiance,
            "reference simulation complete"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ratings::fixtures;
    use crate::simulation::{SiteGeometry, TemperatureModel};
    use crate::sizing::SizingOptimizer;
    use crate::weather::SyntheticWeatherGenerator;

    fn site(tilt: f64) -> SiteGeometry {
        SiteGeometry {
            latitude: 23.81,
            longitude: 90.41,
            tilt_deg: tilt,
            azimuth_deg: 180.0,
            ground_coverage_ratio: 0.4,
        }
    }

    #[test]
    fn test_output_is_aligned_and_clipped() {
        let weather = SyntheticWeatherGenerator::default()
            .generate(2019, 23.81, 90.41, 5)
            .unwrap();
        let module = fixtures::module();
        let inverter = fixtures::inverter();
        let cfg = SizingOptimizer::default()
            .size(100.0, &module, &inverter)
            .unwrap()
            .configuration;

        let out = ReferenceYieldSimulator::default()
            .simulate(&SimulationInput {
                weather: &weather,
                site: site(23.0),
                configuration: &cfg,
                module: &module,
                inverter: &inverter,
                temperature_model: TemperatureModel::default(),
            })
            .unwrap();

        assert_eq!(out.ac_w.len(), weather.len());
        let limit = cfg.total_ac_w() + 1e-6;
        assert!(out.ac_w.iter().all(|p| *p >= 0.0 && *p <= limit));
        assert!(out.ac_w.iter().zip(&out.dc_w).all(|(ac, dc)| ac <= dc));
        assert!(out.ac_w.iter().sum::<f64>() > 0.0);
        assert!(out.mean_cell_temperature > 20.0);
    }

    #[test]
    fn test_rejects_bad_tilt() {
        let weather = SyntheticWeatherGenerator::default()
            .generate(2019, 0.0, 0.0, 1)
            .unwrap();
        let module = fixtures::module();
        let inverter = fixtures::inverter();
        let cfg = SizingOptimizer::default()
            .size(10.0, &module, &inverter)
            .unwrap()
            .configuration;
        let err = ReferenceYieldSimulator::default()
            .simulate(&SimulationInput {
                weather: &weather,
                site: site(120.0),
                configuration: &cfg,
                module: &module,
                inverter: &inverter,
                temperature_model: TemperatureModel::default(),
            })
            .unwrap_err();
        assert!(matches!(err, SimulationError::Geometry(_)));
    }

    #[test]
    fn test_losses_derate() {
        let d = SystemLosses::default().derate();
        assert!((d - 0.98f64.powi(3)).abs() < 1e-12);
    }
}
