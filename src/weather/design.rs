//! Design-day temperature extremes from an ASHRAE-meteo style service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DesignWeatherConfig;

/// Heating design dry bulb used when no station data is available, °C
pub const FALLBACK_MIN_TEMP_C: f64 = -3.7;
/// Cooling design dry bulb used when no station data is available, °C
pub const FALLBACK_MAX_TEMP_C: f64 = 45.0;

/// Worst-case ambient temperatures bounding the string voltage design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignTemperatures {
    /// 99.6 % heating dry bulb, °C
    pub min_c: f64,
    /// 0.4 % cooling dry bulb, °C
    pub max_c: f64,
    pub from_fallback: bool,
}

impl DesignTemperatures {
    pub fn fallback() -> Self {
        Self {
            min_c: FALLBACK_MIN_TEMP_C,
            max_c: FALLBACK_MAX_TEMP_C,
            from_fallback: true,
        }
    }
}

#[async_trait]
pub trait DesignWeatherSource: Send + Sync {
    /// Extremes for the nearest station, `None` when unavailable.
    async fn design_temperatures(&self, latitude: f64, longitude: f64) -> Option<DesignTemperatures>;
}

/// Always answers with the fallback pair.
pub struct FixedDesignWeather;

#[async_trait]
impl DesignWeatherSource for FixedDesignWeather {
    async fn design_temperatures(&self, _latitude: f64, _longitude: f64) -> Option<DesignTemperatures> {
        None
    }
}

#[derive(Clone)]
pub struct AshraeMeteoClient {
    client: Client,
    base_url: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct StationList {
    #[serde(default)]
    meteo_stations: Vec<serde_json::Map<String, Value>>,
}

impl AshraeMeteoClient {
    pub fn new(cfg: &DesignWeatherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            version: cfg.ashrae_version.clone(),
        })
    }

    async fn post(&self, path: &str, form: &[(&str, String)]) -> anyhow::Result<StationList> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.client.post(&url).form(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("ASHRAE meteo HTTP {status} from {path}");
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> anyhow::Result<Option<DesignTemperatures>> {
        let places = self
            .post(
                "request_places.php",
                &[
                    ("lat", latitude.to_string()),
                    ("long", longitude.to_string()),
                    ("number", "10".to_string()),
                    ("ashrae_version", self.version.clone()),
                ],
            )
            .await?;
        let Some(wmo) = places
            .meteo_stations
            .first()
            .and_then(|s| s.get("wmo"))
            .and_then(value_as_string)
        else {
            return Ok(None);
        };
        debug!(%wmo, "nearest ASHRAE station");

        let params = self
            .post(
                "request_meteo_parametres.php",
                &[
                    ("wmo", wmo),
                    ("ashrae_version", self.version.clone()),
                    ("si_ip", "SI".to_string()),
                ],
            )
            .await?;
        let Some(station) = params.meteo_stations.first() else {
            return Ok(None);
        };

        let min_c = station
            .get("heating_DB_99.6")
            .and_then(value_as_f64)
            .unwrap_or(0.0);
        let max_c = station
            .get("cooling_DB_MCWB_0.4_DB")
            .and_then(value_as_f64)
            .unwrap_or(FALLBACK_MAX_TEMP_C);
        Ok(Some(DesignTemperatures {
            min_c,
            max_c,
            from_fallback: false,
        }))
    }
}

#[async_trait]
impl DesignWeatherSource for AshraeMeteoClient {
    async fn design_temperatures(&self, latitude: f64, longitude: f64) -> Option<DesignTemperatures> {
        match self.lookup(latitude, longitude).await {
            Ok(found) => found,
            Err(e) => {
                warn!(latitude, longitude, error = %e, "design weather lookup failed");
                None
            }
        }
    }
}

// The service returns numbers as JSON strings.
fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_accept_numbers_and_strings() {
        assert_eq!(value_as_f64(&json!("-3.7")), Some(-3.7));
        assert_eq!(value_as_f64(&json!(41.2)), Some(41.2));
        assert_eq!(value_as_f64(&json!("n/a")), None);
        assert_eq!(value_as_string(&json!(419230)), Some("419230".to_string()));
        assert_eq!(value_as_string(&json!("")), None);
    }

    #[tokio::test]
    async fn test_fixed_source_yields_none() {
        assert!(FixedDesignWeather.design_temperatures(0.0, 0.0).await.is_none());
        let fb = DesignTemperatures::fallback();
        assert_eq!((fb.min_c, fb.max_c, fb.from_fallback), (-3.7, 45.0, true));
    }
}
