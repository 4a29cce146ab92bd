pub mod designer;

pub use designer::*;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::simulation::ReferenceYieldSimulator;
use crate::sizing::SizingOptimizer;
use crate::weather::{AshraeMeteoClient, DesignWeatherSource, FixedDesignWeather, WeatherService};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub designer: Arc<PlantDesigner>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let catalog = Arc::new(Catalog::from_config(&cfg.catalog));
        let weather = Arc::new(WeatherService::new(&cfg.weather));

        let design_weather: Arc<dyn DesignWeatherSource> = if cfg.design_weather.enabled {
            Arc::new(AshraeMeteoClient::new(&cfg.design_weather)?)
        } else {
            info!("design weather lookup disabled, using fallback temperatures");
            Arc::new(FixedDesignWeather)
        };

        let designer = PlantDesigner::new(
            catalog,
            weather,
            design_weather,
            Arc::new(ReferenceYieldSimulator::default()),
            SizingOptimizer::new(cfg.sizing.clone().into()),
            cfg.finance.clone(),
        );

        Ok(Self {
            cfg,
            designer: Arc::new(designer),
        })
    }

    pub fn with_designer(cfg: Config, designer: PlantDesigner) -> Self {
        Self {
            cfg,
            designer: Arc::new(designer),
        }
    }
}
