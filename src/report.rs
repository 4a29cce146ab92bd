//! Aggregation of the sizing, simulation and financial results of one request.

use serde::Serialize;

use crate::domain::{
    CashflowLedger, CompatibilityCheck, ElectricalConfiguration, FinancialSummary, SizingAdvisory,
    StationMetadata, WeatherDataset, WeatherSeries, WeatherSource,
};
use crate::finance::{CostBreakdown, Currency};
use crate::simulation::{EnergySummary, SiteGeometry};
use crate::weather::DesignTemperatures;

/// Where the weather behind a report came from, plus its monthly shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    /// `remote` or `synthetic`
    pub source: &'static str,
    pub dataset: Option<WeatherDataset>,
    /// Figures built on synthetic weather are illustrative only.
    pub demonstrative: bool,
    /// kWh/m² per month
    pub monthly_ghi: [f64; 12],
    /// °C
    pub monthly_temperature: [f64; 12],
    pub hourly_wind_speed: Vec<f64>,
    pub metadata: Option<StationMetadata>,
}

impl WeatherSummary {
    pub fn from_series(series: &WeatherSeries) -> Self {
        let source = series.source();
        let monthly_ghi = series.monthly_sum(|r| r.ghi).map(|wh| wh / 1000.0);
        Self {
            source: source.label(),
            dataset: match source {
                WeatherSource::Remote { dataset } => Some(dataset),
                WeatherSource::Synthetic => None,
            },
            demonstrative: source.is_synthetic(),
            monthly_ghi,
            monthly_temperature: series.monthly_mean(|r| r.air_temperature),
            hourly_wind_speed: series.records().iter().map(|r| r.wind_speed).collect(),
            metadata: series.metadata().cloned(),
        }
    }
}

/// Identifiers of the selected components and the requested size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSelection {
    pub module_type: String,
    pub inverter_type: String,
    pub system_size_kw: f64,
}

/// Everything one design request produced. Holds no logic of its own.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationReport {
    pub selection: SystemSelection,
    pub site: SiteGeometry,
    pub configuration: ElectricalConfiguration,
    pub advisories: Vec<SizingAdvisory>,
    pub compatibility: CompatibilityCheck,
    pub design_temperatures: DesignTemperatures,
    pub energy: EnergySummary,
    pub currency: Currency,
    pub cost_breakdown: CostBreakdown,
    pub ledger: CashflowLedger,
    pub financials: FinancialSummary,
    pub weather: WeatherSummary,
}

impl ConfigurationReport {
    pub fn land_area_m2(&self) -> f64 {
        self.configuration
            .required_land_area_m2(self.site.ground_coverage_ratio)
    }

    pub fn is_demonstrative(&self) -> bool {
        self.weather.demonstrative
    }
}
