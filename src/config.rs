use anyhow::Result;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::finance::Currency;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub weather: WeatherConfig,
    pub design_weather: DesignWeatherConfig,
    pub catalog: CatalogConfig,
    pub sizing: SizingConfig,
    pub finance: FinanceDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 120,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub email: String,
    pub full_name: String,
    pub affiliation: String,
    /// Historical year requested from the NSRDB.
    pub year: i32,
    pub timeout_seconds: u64,
    /// Fixed seed for the synthetic fallback; derived from coordinates when unset.
    pub synthetic_seed: Option<u64>,
}
impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://developer.nrel.gov".to_string(),
            api_key: "DEMO_KEY".to_string(),
            email: String::new(),
            full_name: "pv-plant-calculator".to_string(),
            affiliation: "pv-plant-calculator".to_string(),
            year: 2019,
            timeout_seconds: 30,
            synthetic_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignWeatherConfig {
    pub enabled: bool,
    pub base_url: String,
    pub ashrae_version: String,
    pub timeout_seconds: u64,
}
impl Default for DesignWeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://ashrae-meteo.info/v2.0".to_string(),
            ashrae_version: "2021".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SAM-format module CSV; the bundled table is used when unset.
    pub module_path: Option<String>,
    /// SAM-format inverter CSV; the bundled table is used when unset.
    pub inverter_path: Option<String>,
    pub default_module: Option<String>,
    pub default_inverter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    pub max_dc_ac_ratio: f64,
    pub min_dc_ac_ratio: f64,
    pub min_inverter_utilization: f64,
    pub excess_ac_threshold_kw: f64,
    pub system_max_voltage_v: f64,
    pub cell_temperature_rise_c: f64,
}
impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_dc_ac_ratio: 1.3,
            min_dc_ac_ratio: 1.1,
            min_inverter_utilization: 0.8,
            excess_ac_threshold_kw: 10.0,
            system_max_voltage_v: 1000.0,
            cell_temperature_rise_c: 25.0,
        }
    }
}

/// Values used for financial request fields the caller omits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceDefaults {
    pub currency: Currency,
    /// Per kWh, in USD
    pub electricity_rate: f64,
    pub project_life_years: u32,
    /// Per kW-year, in USD
    pub maintenance_per_kw_year: f64,
    pub degradation_rate: f64,
    pub escalation_rate: f64,
    pub discount_rate: f64,
    pub federal_incentive_rate: f64,
    pub state_incentive_rate: f64,
}
impl Default for FinanceDefaults {
    fn default() -> Self {
        Self {
            currency: Currency::Usd,
            electricity_rate: 0.12,
            project_life_years: 25,
            maintenance_per_kw_year: 15.0,
            degradation_rate: 0.005,
            escalation_rate: 0.025,
            discount_rate: 0.06,
            federal_incentive_rate: 0.0,
            state_incentive_rate: 0.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("PVCALC__").split("__"));
        Ok(figment.extract()?)
    }
}
