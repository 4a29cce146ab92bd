//! Component catalog endpoints

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::design::{default_latitude, default_longitude};
use super::error::ApiError;
use super::response::{success, ApiResponse};
use crate::catalog::{InverterDetails, ModuleDetails};
use crate::controller::AppState;
use crate::domain::{CompatibilityCheck, ElectricalConfiguration, SizingAdvisory};
use crate::weather::DesignTemperatures;

#[derive(Debug, Serialize)]
pub struct ModuleList {
    pub modules: Vec<String>,
    pub default_index: usize,
}

#[derive(Debug, Serialize)]
pub struct InverterList {
    pub inverters: Vec<String>,
    pub default_index: usize,
}

/// GET /api/get_modules
pub async fn get_modules(State(state): State<AppState>) -> Result<ApiResponse<ModuleList>, ApiError> {
    let catalog = state.designer.catalog();
    Ok(success(ModuleList {
        modules: catalog.module_names()?,
        default_index: catalog.default_module_index()?,
    }))
}

/// GET /api/get_inverters
pub async fn get_inverters(State(state): State<AppState>) -> Result<ApiResponse<InverterList>, ApiError> {
    let catalog = state.designer.catalog();
    Ok(success(InverterList {
        inverters: catalog.inverter_names()?,
        default_index: catalog.default_inverter_index()?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    pub module: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InverterQuery {
    pub inverter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModuleDetailsResponse {
    pub details: ModuleDetails,
}

#[derive(Debug, Serialize)]
pub struct InverterDetailsResponse {
    pub details: InverterDetails,
}

fn required(value: Option<String>, what: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("No {what} specified")))
}

/// GET /api/get_module_details?module=
pub async fn get_module_details(
    State(state): State<AppState>,
    Query(q): Query<ModuleQuery>,
) -> Result<ApiResponse<ModuleDetailsResponse>, ApiError> {
    let name = required(q.module, "module")?;
    let details = state.designer.catalog().module_details(&name)?;
    Ok(success(ModuleDetailsResponse { details }))
}

/// GET /api/get_inverter_details?inverter=
pub async fn get_inverter_details(
    State(state): State<AppState>,
    Query(q): Query<InverterQuery>,
) -> Result<ApiResponse<InverterDetailsResponse>, ApiError> {
    let name = required(q.inverter, "inverter")?;
    let details = state.designer.catalog().inverter_details(&name)?;
    Ok(success(InverterDetailsResponse { details }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SizingQuery {
    pub module: Option<String>,
    pub inverter: Option<String>,
    #[validate(range(min = 0.001, max = 1000000.0))]
    pub system_size: Option<f64>,
    /// Site used for the design-temperature lookup, same defaults as `/calculate`.
    #[serde(default = "default_latitude")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    #[validate(range(min = -360.0, max = 360.0))]
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct SizingCheckResponse {
    pub sizing_status: CompatibilityCheck,
    pub design_temperatures: DesignTemperatures,
    /// Layout for the pair at `design_temperatures`, when one exists.
    pub configuration: Option<ElectricalConfiguration>,
    pub warnings: Vec<SizingAdvisory>,
    /// Why no layout exists, when it doesn't.
    pub sizing_error: Option<String>,
}

/// GET /api/check_sizing?module=&inverter=&system_size=&latitude=&longitude=
pub async fn check_sizing(
    State(state): State<AppState>,
    Query(q): Query<SizingQuery>,
) -> Result<ApiResponse<SizingCheckResponse>, ApiError> {
    q.validate()?;
    let defaults = &state.cfg.catalog;
    let module = required(q.module.or_else(|| defaults.default_module.clone()), "module")?;
    let inverter = required(q.inverter.or_else(|| defaults.default_inverter.clone()), "inverter")?;
    let target_kw = q.system_size.unwrap_or(5.0);

    let designer = &state.designer;
    let (module, inverter) = designer.components(&module, &inverter)?;
    let sizing_status = designer.sizing().check_compatibility(target_kw, &inverter);

    let temps = designer.design_temperatures(q.latitude, q.longitude).await;

    let response = match designer
        .sizing()
        .size_with_temperatures(target_kw, &module, &inverter, &temps)
    {
        Ok(outcome) => SizingCheckResponse {
            sizing_status,
            design_temperatures: temps,
            configuration: Some(outcome.configuration),
            warnings: outcome.advisories,
            sizing_error: None,
        },
        Err(e) if e.is_infeasible() => SizingCheckResponse {
            sizing_status,
            design_temperatures: temps,
            configuration: None,
            warnings: Vec::new(),
            sizing_error: Some(e.to_string()),
        },
        Err(e) => return Err(ApiError::Sizing(e)),
    };
    Ok(success(response))
}
