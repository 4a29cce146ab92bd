//! NSRDB (NREL National Solar Radiation Database) PSM3 download client.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::endpoint::{dataset_for_longitude, download_path};
use super::psm3::parse_psm3;
use crate::config::WeatherConfig;
use crate::domain::{WeatherError, WeatherSeries, WeatherSource};

/// Attributes requested from every dataset.
pub const ATTRIBUTES: &str =
    "air_temperature,dew_point,dhi,dni,ghi,surface_albedo,surface_pressure,wind_direction,wind_speed";

/// Fetches one historical year at 60-minute resolution.
#[derive(Clone)]
pub struct NsrdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    email: String,
    full_name: String,
    affiliation: String,
    year: i32,
}

impl NsrdbClient {
    pub fn new(cfg: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            email: cfg.email.clone(),
            full_name: cfg.full_name.clone(),
            affiliation: cfg.affiliation.clone(),
            year: cfg.year,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Download and parse the series for a point. Any failure is returned as-is.
    pub async fn fetch_series(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError> {
        let dataset = dataset_for_longitude(longitude);
        let url = format!("{}{}", self.base_url, download_path(dataset));
        let wkt = format!("POINT({:.4} {:.4})", longitude, latitude);
        let year = self.year.to_string();
        let leap_day = if is_leap_year(self.year) { "true" } else { "false" };

        debug!(%url, %wkt, %dataset, "requesting NSRDB series");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("full_name", self.full_name.as_str()),
                ("email", self.email.as_str()),
                ("affiliation", self.affiliation.as_str()),
                ("reason", "pv plant design"),
                ("mailing_list", "false"),
                ("wkt", wkt.as_str()),
                ("names", year.as_str()),
                ("attributes", ATTRIBUTES),
                ("leap_day", leap_day),
                ("utc", "false"),
                ("interval", "60"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let data = parse_psm3(&body)?;
        let series = WeatherSeries::new(
            data.records,
            WeatherSource::Remote { dataset },
            Some(data.metadata),
        )?;

        info!(latitude, longitude, %dataset, rows = series.len(), "fetched NSRDB series");
        Ok(series)
    }
}

/// Leap years are requested with Feb 29 so the series stays hourly-contiguous.
fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<String>,
}

/// The `errors` array of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => body.trim().to_string(),
    }
}
