//! Energy-yield simulation contract and the in-process reference model.

pub mod reference;
pub mod solar;
pub mod summary;
pub mod temperature;

pub use reference::*;
pub use solar::*;
pub use summary::*;
pub use temperature::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ElectricalConfiguration, InverterRatings, ModuleRatings, WeatherSeries};

#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("invalid array geometry: {0}")]
    Geometry(String),
    #[error("simulation output has {actual} rows, weather has {expected}")]
    Shape { expected: usize, actual: usize },
}

/// Fixed-tilt array placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteGeometry {
    pub latitude: f64,
    pub longitude: f64,
    /// Degrees from horizontal
    pub tilt_deg: f64,
    /// Degrees clockwise from north
    pub azimuth_deg: f64,
    pub ground_coverage_ratio: f64,
}

pub struct SimulationInput<'a> {
    pub weather: &'a WeatherSeries,
    pub site: SiteGeometry,
    pub configuration: &'a ElectricalConfiguration,
    pub module: &'a ModuleRatings,
    pub inverter: &'a InverterRatings,
    pub temperature_model: TemperatureModel,
}

/// Hourly plant output aligned with the weather records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldOutput {
    /// Plant AC power, W
    pub ac_w: Vec<f64>,
    /// Plant DC power, W
    pub dc_w: Vec<f64>,
    /// Plane-of-array global irradiance, W/m²
    pub poa_global: Vec<f64>,
    pub mean_effective_irradiance: f64,
    pub mean_cell_temperature: f64,
}

/// Turns weather plus a plant layout into hourly power.
pub trait YieldSimulator: Send + Sync {
    fn simulate(&self, input: &SimulationInput<'_>) -> Result<YieldOutput, SimulationError>;
}
