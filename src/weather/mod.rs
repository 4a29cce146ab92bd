pub mod design;
pub mod endpoint;
pub mod nsrdb;
pub mod psm3;
pub mod synthetic;

pub use design::*;
pub use endpoint::*;
pub use nsrdb::*;
pub use psm3::*;
pub use synthetic::*;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::config::WeatherConfig;
use crate::domain::{WeatherError, WeatherSeries};

/// Resolves a point to one year of hourly weather.
///
/// Upstream failures are recovered inside the provider and recorded as the
/// series provenance. An `Err` means no series could be produced at all, which
/// only happens on a broken configuration.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError>;
}

/// NSRDB download with a synthetic year as fallback.
pub struct WeatherService {
    remote: Option<NsrdbClient>,
    generator: SyntheticWeatherGenerator,
    year: i32,
    seed: Option<u64>,
}

impl WeatherService {
    pub fn new(cfg: &WeatherConfig) -> Self {
        let remote = match NsrdbClient::new(cfg) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "NSRDB client unavailable, weather will be synthetic");
                None
            }
        };
        Self {
            remote,
            generator: SyntheticWeatherGenerator::default(),
            year: cfg.year,
            seed: cfg.synthetic_seed,
        }
    }

    pub fn with_generator(mut self, generator: SyntheticWeatherGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn synthesize(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError> {
        let seed = self
            .seed
            .unwrap_or_else(|| coordinate_seed(latitude, longitude));
        self.generator
            .generate(self.year, latitude, longitude, seed)
            .map_err(|e| {
                error!(error = %e, year = self.year, "synthetic weather generation failed");
                e
            })
    }

    async fn fetch_remote(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError> {
        match &self.remote {
            Some(client) => client.fetch_series(latitude, longitude).await,
            None => Err(WeatherError::Network("no NSRDB client".to_string())),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherService {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError> {
        match self.fetch_remote(latitude, longitude).await {
            Ok(series) => Ok(series),
            Err(e) => {
                warn!(latitude, longitude, error = %e, "weather fetch failed, falling back to synthetic data");
                self.synthesize(latitude, longitude)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_remote_falls_back_to_synthetic() {
        let cfg = WeatherConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 1,
            synthetic_seed: Some(11),
            ..Default::default()
        };
        let service = WeatherService::new(&cfg);
        let series = service.fetch(23.81, 90.41).await.unwrap();
        assert!(series.source().is_synthetic());
        assert_eq!(series.len(), 8760);
        assert_eq!(series.records(), service.synthesize(23.81, 90.41).unwrap().records());
    }
}
