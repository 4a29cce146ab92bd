//! Weather lookup endpoint

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::ApiError;
use super::response::{success, ApiResponse};
use crate::controller::AppState;
use crate::report::WeatherSummary;

#[derive(Debug, Deserialize, Validate)]
pub struct WeatherQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -360.0, max = 360.0))]
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct WeatherDataResponse {
    #[serde(flatten)]
    pub summary: WeatherSummary,
    /// Mean GHI per month, W/m²
    pub monthly_mean_ghi: [f64; 12],
    pub hours: usize,
}

/// GET /get_weather_data?latitude=&longitude=
pub async fn get_weather_data(
    State(state): State<AppState>,
    Query(q): Query<WeatherQuery>,
) -> Result<ApiResponse<WeatherDataResponse>, ApiError> {
    q.validate()?;
    let series = state
        .designer
        .weather()
        .fetch(q.latitude, q.longitude)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(success(WeatherDataResponse {
        summary: WeatherSummary::from_series(&series),
        monthly_mean_ghi: series.monthly_mean(|r| r.ghi),
        hours: series.len(),
    }))
}
