//! Hourly weather series for one calendar year.
//!
//! A [`WeatherSeries`] is built once per request, validated on construction and
//! never mutated afterwards. It always carries its provenance so figures derived
//! from synthetic data can be flagged downstream.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use thiserror::Error;

/// Hours in a common year.
pub const HOURS_PER_YEAR: usize = 8760;
/// Hours in a leap year.
pub const HOURS_PER_LEAP_YEAR: usize = 8784;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Network(String),
    #[error("weather API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed weather payload: {0}")]
    Parse(String),
    #[error("weather series has {0} hourly records, expected 8760 or 8784")]
    Length(usize),
    #[error("weather series is not contiguous at record {index}: {previous} -> {current}")]
    Gap {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },
}

/// NSRDB dataset a remote series was downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeatherDataset {
    /// Americas coverage, also the residual band.
    Psm3,
    /// Meteosat Indian Ocean coverage (Europe, Africa, western Asia).
    MsgIodc,
    /// Himawari coverage (eastern Asia, Oceania).
    Himawari,
}

/// Where a [`WeatherSeries`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeatherSource {
    Remote { dataset: WeatherDataset },
    Synthetic,
}

impl WeatherSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, WeatherSource::Synthetic)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherSource::Remote { .. } => "remote",
            WeatherSource::Synthetic => "synthetic",
        }
    }
}

/// Station header of a PSM3 download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMetadata {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i64,
    /// UTC offset of the data rows in hours.
    pub time_zone: i32,
    pub local_time_zone: i32,
    /// Remaining header fields, untyped.
    pub extra: BTreeMap<String, String>,
}

/// One hour of weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub timestamp: DateTime<FixedOffset>,
    /// Direct normal irradiance, W/m²
    pub dni: f64,
    /// Diffuse horizontal irradiance, W/m²
    pub dhi: f64,
    /// Global horizontal irradiance, W/m²
    pub ghi: f64,
    /// Ambient air temperature, °C
    pub air_temperature: f64,
    /// m/s
    pub wind_speed: f64,
    /// Pa
    pub surface_pressure: f64,
    pub albedo: f64,
}

impl WeatherRecord {
    fn clamped(mut self) -> Self {
        self.dni = self.dni.max(0.0);
        self.dhi = self.dhi.max(0.0);
        self.ghi = self.ghi.max(0.0);
        self.wind_speed = self.wind_speed.max(0.0);
        self.surface_pressure = self.surface_pressure.max(0.0);
        self.albedo = self.albedo.max(0.0);
        self
    }
}

/// Validated hourly series covering exactly one year.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherSeries {
    records: Vec<WeatherRecord>,
    source: WeatherSource,
    metadata: Option<StationMetadata>,
}

impl WeatherSeries {
    /// Build a series, clamping irradiance/wind to be non-negative and checking
    /// the length and hourly contiguity invariants.
    pub fn new(
        records: Vec<WeatherRecord>,
        source: WeatherSource,
        metadata: Option<StationMetadata>,
    ) -> Result<Self, WeatherError> {
        if records.len() != HOURS_PER_YEAR && records.len() != HOURS_PER_LEAP_YEAR {
            return Err(WeatherError::Length(records.len()));
        }

        let hour = Duration::hours(1);
        for (index, pair) in records.windows(2).enumerate() {
            if pair[1].timestamp != pair[0].timestamp + hour {
                return Err(WeatherError::Gap {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }

        let records = records.into_iter().map(WeatherRecord::clamped).collect();
        Ok(Self {
            records,
            source,
            metadata,
        })
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> WeatherSource {
        self.source
    }

    pub fn metadata(&self) -> Option<&StationMetadata> {
        self.metadata.as_ref()
    }

    /// Calendar month (0-based) of every record, in record order.
    pub fn month_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|r| r.timestamp.month0() as usize)
    }

    /// Local hour of day of every record, in record order.
    pub fn hour_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|r| r.timestamp.hour() as usize)
    }

    /// Sum of a field per calendar month.
    pub fn monthly_sum(&self, field: impl Fn(&WeatherRecord) -> f64) -> [f64; 12] {
        let mut out = [0.0; 12];
        for r in &self.records {
            out[r.timestamp.month0() as usize] += field(r);
        }
        out
    }

    /// Mean of a field per calendar month.
    pub fn monthly_mean(&self, field: impl Fn(&WeatherRecord) -> f64) -> [f64; 12] {
        let sums = self.monthly_sum(&field);
        let mut counts = [0usize; 12];
        for month in self.month_indices() {
            counts[month] += 1;
        }
        let mut out = [0.0; 12];
        for m in 0..12 {
            if counts[m] > 0 {
                out[m] = sums[m] / counts[m] as f64;
            }
        }
        out
    }
}
