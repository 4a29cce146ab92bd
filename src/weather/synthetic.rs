//! Synthetic weather year used when no remote series is available.
//!
//! Seasonal sinusoidal envelopes times a daylight bell, plus normal noise
//! clamped to ±3σ. Irradiance and wind are clipped to be non-negative.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::domain::{WeatherError, WeatherRecord, WeatherSeries, WeatherSource};

/// Shape and noise parameters of the generator.
#[derive(Debug, Clone)]
pub struct SyntheticWeatherConfig {
    pub mean_temperature_c: f64,
    pub seasonal_temperature_swing_c: f64,
    pub diurnal_temperature_swing_c: f64,
    pub temperature_noise_c: f64,
    pub peak_ghi: f64,
    pub peak_dni: f64,
    pub peak_dhi: f64,
    pub ghi_noise: f64,
    pub dni_noise: f64,
    pub dhi_noise: f64,
    pub mean_wind_speed: f64,
    pub wind_noise: f64,
    pub surface_pressure_pa: f64,
    pub albedo: f64,
}

impl Default for SyntheticWeatherConfig {
    fn default() -> Self {
        Self {
            mean_temperature_c: 25.0,
            seasonal_temperature_swing_c: 5.0,
            diurnal_temperature_swing_c: 4.0,
            temperature_noise_c: 1.0,
            peak_ghi: 1000.0,
            peak_dni: 800.0,
            peak_dhi: 200.0,
            ghi_noise: 50.0,
            dni_noise: 50.0,
            dhi_noise: 20.0,
            mean_wind_speed: 5.0,
            wind_noise: 1.0,
            surface_pressure_pa: 101_325.0,
            albedo: 0.2,
        }
    }
}

/// Seed derived from the coordinates so repeated requests get the same year.
pub fn coordinate_seed(latitude: f64, longitude: f64) -> u64 {
    let lat = (latitude * 1e4).round() as i64 as u64;
    let lon = (longitude * 1e4).round() as i64 as u64;
    lat.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ lon.rotate_left(29)
}

/// UTC offset (whole hours) implied by a longitude.
fn offset_for_longitude(longitude: f64) -> FixedOffset {
    let normalized = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    let hours = if normalized.is_finite() {
        (normalized / 15.0).round().clamp(-12.0, 14.0) as i32
    } else {
        0
    };
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Zero-mean normal noise clamped to ±3σ.
struct BoundedNormal {
    dist: Option<Normal<f64>>,
    bound: f64,
}

impl BoundedNormal {
    fn new(std_dev: f64) -> Self {
        let std_dev = std_dev.abs();
        Self {
            dist: Normal::new(0.0, std_dev).ok(),
            bound: 3.0 * std_dev,
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match &self.dist {
            Some(dist) => dist.sample(rng).clamp(-self.bound, self.bound),
            None => 0.0,
        }
    }
}

pub struct SyntheticWeatherGenerator {
    config: SyntheticWeatherConfig,
}

impl SyntheticWeatherGenerator {
    pub fn new(config: SyntheticWeatherConfig) -> Self {
        Self { config }
    }

    /// Generate a full `year` for the given point.
    pub fn generate(
        &self,
        year: i32,
        latitude: f64,
        longitude: f64,
        seed: u64,
    ) -> Result<WeatherSeries, WeatherError> {
        let c = &self.config;
        let mut rng = StdRng::seed_from_u64(seed);
        let temp_noise = BoundedNormal::new(c.temperature_noise_c);
        let ghi_noise = BoundedNormal::new(c.ghi_noise);
        let dni_noise = BoundedNormal::new(c.dni_noise);
        let dhi_noise = BoundedNormal::new(c.dhi_noise);
        let wind_noise = BoundedNormal::new(c.wind_noise);

        let offset = offset_for_longitude(longitude);
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|t| offset.from_local_datetime(&t).single())
            .ok_or_else(|| WeatherError::Parse(format!("invalid synthetic year {year}")))?;
        let days = NaiveDate::from_ymd_opt(year, 12, 31)
            .map(|d| d.ordinal0() + 1)
            .unwrap_or(365) as usize;
        let hours = days * 24;

        // Summer peaks mid-year in the northern hemisphere and at new year in the south.
        let hemisphere = if latitude < 0.0 { -1.0 } else { 1.0 };

        let records = (0..hours)
            .map(|h| {
                let hour_of_day = (h % 24) as f64;
                let phase = 2.0 * PI * (h as f64) / (hours as f64);
                let season = -phase.cos() * hemisphere;
                let daylight = (PI * (hour_of_day - 6.0) / 12.0).sin().max(0.0);
                let sky = 0.75 + 0.25 * season;

                let diurnal = (2.0 * PI * (hour_of_day - 9.0) / 24.0).sin();
                let air_temperature = c.mean_temperature_c
                    + c.seasonal_temperature_swing_c * season
                    + c.diurnal_temperature_swing_c * diurnal
                    + temp_noise.sample(&mut rng);

                let ghi = c.peak_ghi * sky * daylight + ghi_noise.sample(&mut rng) * daylight;
                let dni = c.peak_dni * sky * daylight + dni_noise.sample(&mut rng) * daylight;
                let dhi = c.peak_dhi * sky * daylight + dhi_noise.sample(&mut rng) * daylight;
                let wind_speed = c.mean_wind_speed + wind_noise.sample(&mut rng);

                WeatherRecord {
                    timestamp: start + Duration::hours(h as i64),
                    dni: dni.max(0.0),
                    dhi: dhi.max(0.0),
                    ghi: ghi.max(0.0),
                    air_temperature,
                    wind_speed: wind_speed.max(0.0),
                    surface_pressure: c.surface_pressure_pa,
                    albedo: c.albedo,
                }
            })
            .collect();

        WeatherSeries::new(records, WeatherSource::Synthetic, None)
    }
}

impl Default for SyntheticWeatherGenerator {
    fn default() -> Self {
        Self::new(SyntheticWeatherConfig::default())
    }
}
