//! `POST /calculate`

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;
use validator::Validate;

use super::error::ApiError;
use super::response::{success, ApiResponse};
use crate::controller::{AppState, DesignRequest, FinanceInputs};
use crate::domain::{CompatibilityCheck, SizingAdvisory, WeatherDataset};
use crate::finance::{CostBreakdown, CostOverrides, Currency};
use crate::report::ConfigurationReport;
use crate::simulation::{SiteGeometry, TemperatureModel};

pub(super) fn default_latitude() -> f64 {
    23.8103
}
pub(super) fn default_longitude() -> f64 {
    90.4125
}
fn default_system_size() -> f64 {
    5.0
}
fn default_tilt() -> f64 {
    30.0
}
fn default_azimuth() -> f64 {
    180.0
}
fn default_gcr() -> f64 {
    0.4
}
fn default_temp_model() -> String {
    "sapm".to_string()
}
fn default_mount_type() -> String {
    "open_rack_glass_glass".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CalculateRequest {
    #[serde(default = "default_latitude")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    #[validate(range(min = -360.0, max = 360.0))]
    pub longitude: f64,
    /// Target DC capacity, kW
    #[serde(default = "default_system_size")]
    #[validate(range(min = 0.001, max = 1000000.0))]
    pub system_size: f64,
    #[validate(length(min = 1))]
    pub module: Option<String>,
    #[validate(length(min = 1))]
    pub inverter: Option<String>,
    #[serde(default = "default_tilt")]
    #[validate(range(min = 0.0, max = 90.0))]
    pub tilt: f64,
    #[serde(default = "default_azimuth")]
    #[validate(range(min = 0.0, max = 360.0))]
    pub azimuth: f64,
    #[serde(default = "default_gcr")]
    #[validate(range(min = 0.01, max = 1.0))]
    pub gcr: f64,
    #[serde(default = "default_temp_model")]
    pub temp_model: String,
    #[serde(default = "default_mount_type")]
    pub mount_type: String,

    pub currency: Option<Currency>,
    #[validate(range(min = 0.0))]
    pub installed_cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub land_cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub electricity_rate: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    pub project_life: Option<u32>,
    #[validate(range(min = 0.0))]
    pub maintenance_cost: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub degradation_rate: Option<f64>,
    #[validate(range(min = -1.0, max = 1.0))]
    pub escalation_rate: Option<f64>,
    #[serde(alias = "interest_rate")]
    #[validate(range(min = -0.99, max = 1.0))]
    pub discount_rate: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub federal_incentive: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub state_incentive: Option<f64>,
    #[serde(default)]
    pub cost_overrides: CostOverrides,
}

impl CalculateRequest {
    fn into_design(self, default_module: Option<&str>, default_inverter: Option<&str>) -> Result<DesignRequest, ApiError> {
        let module = self
            .module
            .or_else(|| default_module.map(str::to_string))
            .ok_or_else(|| ApiError::BadRequest("No module specified".to_string()))?;
        let inverter = self
            .inverter
            .or_else(|| default_inverter.map(str::to_string))
            .ok_or_else(|| ApiError::BadRequest("No inverter specified".to_string()))?;

        Ok(DesignRequest {
            site: SiteGeometry {
                latitude: self.latitude,
                longitude: self.longitude,
                tilt_deg: self.tilt,
                azimuth_deg: self.azimuth,
                ground_coverage_ratio: self.gcr,
            },
            system_size_kw: self.system_size,
            module,
            inverter,
            temperature_model: TemperatureModel::preset(&self.temp_model, &self.mount_type),
            finance: FinanceInputs {
                currency: self.currency,
                installed_cost: self.installed_cost,
                electricity_rate: self.electricity_rate,
                project_life_years: self.project_life,
                maintenance_cost: self.maintenance_cost,
                degradation_rate: self.degradation_rate,
                escalation_rate: self.escalation_rate,
                discount_rate: self.discount_rate,
                federal_incentive_rate: self.federal_incentive,
                state_incentive_rate: self.state_incentive,
                land_cost: self.land_cost,
                cost_overrides: self.cost_overrides,
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SystemAnalysis {
    pub annual_energy: f64,
    pub peak_dc_power: f64,
    pub peak_ac_power: f64,
    pub performance_ratio: f64,
    pub capacity_factor: f64,
    pub specific_yield: f64,
    pub modules_per_string: u32,
    pub strings_per_inverter: u32,
    pub number_of_inverters: u32,
    pub dc_ac_ratio: f64,
    pub total_module_area: f64,
    pub module_area: f64,
    pub module_type: String,
    pub total_modules: u32,
    pub inverter_type: String,
    pub system_size: f64,
    pub realized_dc_size: f64,
    pub inverter_power: f64,
    pub module_power: f64,
    pub land_area: f64,
    pub daily_energy: Vec<f64>,
    pub monthly_energy: Vec<f64>,
    pub min_design_temp: f64,
    pub max_design_temp: f64,
    pub design_temp_fallback: bool,
    pub effective_irradiance: f64,
    pub cell_temperature: f64,
    pub warnings: Vec<SizingAdvisory>,
}

#[derive(Debug, Serialize)]
pub struct FinancialMetrics {
    pub annual_savings: f64,
    pub simple_payback: u32,
    pub payback_recovered: bool,
    pub lcoe: Option<f64>,
    pub co2_savings: f64,
    pub net_present_value: f64,
    pub total_savings: f64,
}

#[derive(Debug, Serialize)]
pub struct WeatherData {
    pub source: &'static str,
    pub dataset: Option<WeatherDataset>,
    pub demonstrative: bool,
    pub monthly_ghi: Vec<f64>,
    pub monthly_temperature: Vec<f64>,
    pub monthly_energy: Vec<f64>,
    pub hourly_wind_speed: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct Financials {
    pub currency: Currency,
    pub lcoe: Option<f64>,
    pub npv: f64,
    pub payback_period: u32,
    pub payback_recovered: bool,
    pub net_capital_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub total_installation_cost: f64,
    pub cumulative_cashflow: Vec<f64>,
    pub annual_cashflow: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub system_analysis: SystemAnalysis,
    pub financial_metrics: FinancialMetrics,
    pub weather_data: WeatherData,
    pub financials: Financials,
    pub sizing_status: CompatibilityCheck,
}

impl From<ConfigurationReport> for CalculateResponse {
    fn from(r: ConfigurationReport) -> Self {
        let land_area = r.land_area_m2();
        let cfg = &r.configuration;
        let fin = &r.financials;
        let monthly_energy = r.energy.monthly_energy_kwh.to_vec();
        let total_savings = r.ledger.entries().iter().map(|e| e.revenue).sum();

        Self {
            system_analysis: SystemAnalysis {
                annual_energy: r.energy.annual_energy_kwh,
                peak_dc_power: r.energy.peak_dc_kw,
                peak_ac_power: r.energy.peak_ac_kw,
                performance_ratio: r.energy.performance_ratio,
                capacity_factor: r.energy.capacity_factor,
                specific_yield: r.energy.specific_yield,
                modules_per_string: cfg.modules_per_string,
                strings_per_inverter: cfg.strings_per_inverter,
                number_of_inverters: cfg.inverter_count,
                dc_ac_ratio: cfg.dc_ac_ratio,
                total_module_area: cfg.total_module_area_m2(),
                module_area: cfg.module_area_m2,
                module_type: r.selection.module_type.clone(),
                total_modules: cfg.total_modules,
                inverter_type: r.selection.inverter_type.clone(),
                system_size: r.selection.system_size_kw,
                realized_dc_size: cfg.realized_dc_kw(),
                inverter_power: cfg.inverter_ac_w,
                module_power: cfg.module_power_w,
                land_area,
                daily_energy: r.energy.daily_profile_w.to_vec(),
                monthly_energy: monthly_energy.clone(),
                min_design_temp: r.design_temperatures.min_c,
                max_design_temp: r.design_temperatures.max_c,
                design_temp_fallback: r.design_temperatures.from_fallback,
                effective_irradiance: r.energy.mean_effective_irradiance,
                cell_temperature: r.energy.mean_cell_temperature,
                warnings: r.advisories.clone(),
            },
            financial_metrics: FinancialMetrics {
                annual_savings: fin.annual_savings,
                simple_payback: fin.payback.display_years(),
                payback_recovered: fin.payback.is_recovered(),
                lcoe: fin.lcoe,
                co2_savings: fin.co2_offset_tonnes_per_year,
                net_present_value: fin.npv,
                total_savings,
            },
            weather_data: WeatherData {
                source: r.weather.source,
                dataset: r.weather.dataset,
                demonstrative: r.weather.demonstrative,
                monthly_ghi: r.weather.monthly_ghi.to_vec(),
                monthly_temperature: r.weather.monthly_temperature.to_vec(),
                monthly_energy,
                hourly_wind_speed: r.weather.hourly_wind_speed.clone(),
            },
            financials: Financials {
                currency: r.currency,
                lcoe: fin.lcoe,
                npv: fin.npv,
                payback_period: fin.payback.display_years(),
                payback_recovered: fin.payback.is_recovered(),
                net_capital_cost: fin.net_capital_cost,
                cost_breakdown: r.cost_breakdown,
                total_installation_cost: r.cost_breakdown.total(),
                cumulative_cashflow: r.ledger.cumulative_cashflows(),
                annual_cashflow: r.ledger.annual_cashflows(),
            },
            sizing_status: r.compatibility.clone(),
        }
    }
}

/// POST /calculate - size, simulate and price a plant
pub async fn calculate(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> Result<ApiResponse<CalculateResponse>, ApiError> {
    req.validate()?;
    let catalog = &state.cfg.catalog;
    let design = req.into_design(catalog.default_module.as_deref(), catalog.default_inverter.as_deref())?;

    let span = info_span!(
        "calculate",
        request_id = %Uuid::new_v4(),
        latitude = design.site.latitude,
        longitude = design.site.longitude,
        system_size_kw = design.system_size_kw,
    );
    let report = state
        .designer
        .design(&design)
        .instrument(span)
        .await
        .map_err(|e| {
            warn!(kind = %e.kind(), error = %e, "design failed");
            ApiError::from(e)
        })?;

    Ok(success(CalculateResponse::from(report)))
}
