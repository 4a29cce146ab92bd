//! Request orchestration: catalog lookup, sizing, weather, simulation, finance.
//!
//! The chain is fail-fast; the first error wins and nothing partial is returned.
//! Weather and design-weather failures never reach this level, the providers
//! recover from them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::config::FinanceDefaults;
use crate::domain::{InverterRatings, ModuleRatings};
use crate::finance::{CostModel, CostOverrides, Currency, FinancialModel, FinancialParameters};
use crate::report::{ConfigurationReport, SystemSelection, WeatherSummary};
use crate::simulation::{
    EnergySummary, SimulationError, SimulationInput, SiteGeometry, TemperatureModel, YieldSimulator,
};
use crate::sizing::{SizingError, SizingOptimizer};
use crate::weather::{DesignTemperatures, DesignWeatherSource, WeatherProvider};

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DesignError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> String {
        match self {
            DesignError::InvalidInput(_) => "invalid_input".to_string(),
            DesignError::Catalog(CatalogError::ModuleNotFound(_))
            | DesignError::Catalog(CatalogError::InverterNotFound(_)) => "not_found".to_string(),
            DesignError::Catalog(_) => "catalog".to_string(),
            DesignError::Sizing(e) => e.kind.to_string(),
            DesignError::Internal(_) => "internal".to_string(),
        }
    }
}

impl From<SimulationError> for DesignError {
    fn from(e: SimulationError) -> Self {
        match e {
            SimulationError::Geometry(msg) => DesignError::InvalidInput(msg),
            other => DesignError::Internal(other.to_string()),
        }
    }
}

/// Economic inputs of a request. Unset fields take the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinanceInputs {
    pub currency: Option<Currency>,
    /// Replaces the computed breakdown total as the capital cost.
    pub installed_cost: Option<f64>,
    pub electricity_rate: Option<f64>,
    pub project_life_years: Option<u32>,
    /// Yearly O&M in the report currency.
    pub maintenance_cost: Option<f64>,
    pub degradation_rate: Option<f64>,
    pub escalation_rate: Option<f64>,
    pub discount_rate: Option<f64>,
    pub federal_incentive_rate: Option<f64>,
    pub state_incentive_rate: Option<f64>,
    pub land_cost: Option<f64>,
    pub cost_overrides: CostOverrides,
}

#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub site: SiteGeometry,
    pub system_size_kw: f64,
    pub module: String,
    pub inverter: String,
    pub temperature_model: TemperatureModel,
    pub finance: FinanceInputs,
}

pub struct PlantDesigner {
    catalog: Arc<Catalog>,
    weather: Arc<dyn WeatherProvider>,
    design_weather: Arc<dyn DesignWeatherSource>,
    simulator: Arc<dyn YieldSimulator>,
    sizing: SizingOptimizer,
    finance: FinancialModel,
    costs: CostModel,
    defaults: FinanceDefaults,
}

impl PlantDesigner {
    pub fn new(
        catalog: Arc<Catalog>,
        weather: Arc<dyn WeatherProvider>,
        design_weather: Arc<dyn DesignWeatherSource>,
        simulator: Arc<dyn YieldSimulator>,
        sizing: SizingOptimizer,
        defaults: FinanceDefaults,
    ) -> Self {
        Self {
            catalog,
            weather,
            design_weather,
            simulator,
            sizing,
            finance: FinancialModel,
            costs: CostModel::default(),
            defaults,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sizing(&self) -> &SizingOptimizer {
        &self.sizing
    }

    pub fn weather(&self) -> &dyn WeatherProvider {
        self.weather.as_ref()
    }

    pub fn components(&self, module: &str, inverter: &str) -> Result<(ModuleRatings, InverterRatings), DesignError> {
        Ok((self.catalog.module(module)?, self.catalog.inverter(inverter)?))
    }

    /// Station extremes for the site, or the fallback pair.
    pub async fn design_temperatures(&self, latitude: f64, longitude: f64) -> DesignTemperatures {
        match self.design_weather.design_temperatures(latitude, longitude).await {
            Some(t) => t,
            None => {
                debug!(latitude, longitude, "using fallback design temperatures");
                DesignTemperatures::fallback()
            }
        }
    }

    pub async fn design(&self, req: &DesignRequest) -> Result<ConfigurationReport, DesignError> {
        let (module, inverter) = self.components(&req.module, &req.inverter)?;

        let temps = self
            .design_temperatures(req.site.latitude, req.site.longitude)
            .await;

        let sized = self
            .sizing
            .size_with_temperatures(req.system_size_kw, &module, &inverter, &temps)?;
        let compatibility = self.sizing.check_compatibility(req.system_size_kw, &inverter);
        let configuration = sized.configuration;

        let weather = self
            .weather
            .fetch(req.site.latitude, req.site.longitude)
            .await
            .map_err(|e| DesignError::Internal(e.to_string()))?;
        if weather.source().is_synthetic() {
            warn!(
                latitude = req.site.latitude,
                longitude = req.site.longitude,
                "report built on synthetic weather"
            );
        }

        let output = self.simulator.simulate(&SimulationInput {
            weather: &weather,
            site: req.site,
            configuration: &configuration,
            module: &module,
            inverter: &inverter,
            temperature_model: req.temperature_model,
        })?;
        let energy = EnergySummary::from_output(&output, &weather, &configuration);

        let f = &req.finance;
        let d = &self.defaults;
        let currency = f.currency.unwrap_or(d.currency);
        let dc_kw = configuration.realized_dc_kw();
        let cost_breakdown = self.costs.breakdown(
            dc_kw,
            currency,
            f.land_cost.unwrap_or(0.0),
            &f.cost_overrides,
        );
        let params = FinancialParameters {
            capital_cost: f.installed_cost.unwrap_or_else(|| cost_breakdown.total()),
            federal_incentive_rate: f.federal_incentive_rate.unwrap_or(d.federal_incentive_rate),
            state_incentive_rate: f.state_incentive_rate.unwrap_or(d.state_incentive_rate),
            electricity_rate: f
                .electricity_rate
                .unwrap_or_else(|| currency.from_usd(d.electricity_rate)),
            maintenance_cost: f
                .maintenance_cost
                .unwrap_or_else(|| currency.from_usd(d.maintenance_per_kw_year * dc_kw)),
            project_life_years: f.project_life_years.unwrap_or(d.project_life_years),
            degradation_rate: f.degradation_rate.unwrap_or(d.degradation_rate),
            escalation_rate: f.escalation_rate.unwrap_or(d.escalation_rate),
            discount_rate: f.discount_rate.unwrap_or(d.discount_rate),
        };
        let (ledger, financials) = self.finance.project(energy.annual_energy_kwh, &params);

        info!(
            module = %module.name,
            inverter = %inverter.name,
            dc_kw,
            annual_kwh = energy.annual_energy_kwh,
            npv = financials.npv,
            weather = weather.source().label(),
            "design complete"
        );

        Ok(ConfigurationReport {
            selection: SystemSelection {
                module_type: module.name.clone(),
                inverter_type: inverter.name.clone(),
                system_size_kw: req.system_size_kw,
            },
            site: req.site,
            configuration,
            advisories: sized.advisories,
            compatibility,
            design_temperatures: temps,
            energy,
            currency,
            cost_breakdown,
            ledger,
            financials,
            weather: WeatherSummary::from_series(&weather),
        })
    }
}
