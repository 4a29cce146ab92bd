pub mod sam;

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::CatalogConfig;
use crate::domain::{InverterRatings, ModuleRatings};

const BUNDLED_MODULES: &str = include_str!("../../data/modules.csv");
const BUNDLED_INVERTERS: &str = include_str!("../../data/inverters.csv");

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("module not found: {0}")]
    ModuleNotFound(String),
    #[error("inverter not found: {0}")]
    InverterNotFound(String),
    #[error("catalog could not be loaded: {0}")]
    Load(String),
    #[error("malformed {table} row at line {line}: {reason}")]
    MalformedRow {
        table: &'static str,
        line: u64,
        reason: String,
    },
}

/// Both component tables, in file order.
#[derive(Debug, Clone, Default)]
pub struct CatalogTables {
    modules: Vec<ModuleRatings>,
    inverters: Vec<InverterRatings>,
    module_index: HashMap<String, usize>,
    inverter_index: HashMap<String, usize>,
}

impl CatalogTables {
    pub fn new(modules: Vec<ModuleRatings>, inverters: Vec<InverterRatings>) -> Self {
        let module_index = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let inverter_index = inverters
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Self {
            modules,
            inverters,
            module_index,
            inverter_index,
        }
    }
}

/// Produces the tables; called at most once per successful [`Catalog`] load.
pub trait CatalogLoader: Send + Sync {
    fn load(&self) -> Result<CatalogTables, CatalogError>;
}

/// Bundled tables unless a file path is configured.
pub struct SamCsvLoader {
    module_path: Option<String>,
    inverter_path: Option<String>,
}

impl SamCsvLoader {
    pub fn new(cfg: &CatalogConfig) -> Self {
        Self {
            module_path: cfg.module_path.clone(),
            inverter_path: cfg.inverter_path.clone(),
        }
    }

    pub fn bundled() -> Self {
        Self {
            module_path: None,
            inverter_path: None,
        }
    }

    fn read(path: &Option<String>, bundled: &'static str) -> Result<String, CatalogError> {
        match path {
            Some(p) => std::fs::read_to_string(p)
                .map_err(|e| CatalogError::Load(format!("{p}: {e}"))),
            None => Ok(bundled.to_string()),
        }
    }
}

impl CatalogLoader for SamCsvLoader {
    fn load(&self) -> Result<CatalogTables, CatalogError> {
        let modules = sam::parse_modules(&Self::read(&self.module_path, BUNDLED_MODULES)?)?;
        let inverters = sam::parse_inverters(&Self::read(&self.inverter_path, BUNDLED_INVERTERS)?)?;
        Ok(CatalogTables::new(modules, inverters))
    }
}

/// Module view for the details endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetails {
    pub name: String,
    /// W
    pub power: f64,
    pub voc: f64,
    pub isc: f64,
    pub vmpp: f64,
    pub impp: f64,
    /// m²
    pub area: f64,
    pub material: String,
    /// %/°C
    pub temp_coeff_pmax: f64,
}

/// Inverter view for the details endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct InverterDetails {
    pub name: String,
    pub pac: f64,
    pub pdc: f64,
    pub vdc_min: f64,
    pub vdc_max: Option<f64>,
    pub idc_max: f64,
    /// Paco / Pdco, %
    pub efficiency: f64,
}

/// Lazily loaded, read-only component catalog shared by all requests.
///
/// The first caller loads the tables; concurrent first callers wait on the same
/// load. A failed load is not cached and is retried by the next caller.
pub struct Catalog {
    loader: Box<dyn CatalogLoader>,
    tables: OnceCell<Arc<CatalogTables>>,
    default_module: Option<String>,
    default_inverter: Option<String>,
}

impl Catalog {
    pub fn new(loader: Box<dyn CatalogLoader>) -> Self {
        Self {
            loader,
            tables: OnceCell::new(),
            default_module: None,
            default_inverter: None,
        }
    }

    pub fn from_config(cfg: &CatalogConfig) -> Self {
        Self::new(Box::new(SamCsvLoader::new(cfg)))
            .with_defaults(cfg.default_module.clone(), cfg.default_inverter.clone())
    }

    pub fn with_defaults(mut self, module: Option<String>, inverter: Option<String>) -> Self {
        self.default_module = module;
        self.default_inverter = inverter;
        self
    }

    fn tables(&self) -> Result<&Arc<CatalogTables>, CatalogError> {
        self.tables.get_or_try_init(|| {
            let tables = self.loader.load()?;
            info!(
                modules = tables.modules.len(),
                inverters = tables.inverters.len(),
                "component catalog loaded"
            );
            Ok(Arc::new(tables))
        })
    }

    pub fn module(&self, name: &str) -> Result<ModuleRatings, CatalogError> {
        let t = self.tables()?;
        t.module_index
            .get(name)
            .map(|i| t.modules[*i].clone())
            .ok_or_else(|| CatalogError::ModuleNotFound(name.to_string()))
    }

    pub fn inverter(&self, name: &str) -> Result<InverterRatings, CatalogError> {
        let t = self.tables()?;
        t.inverter_index
            .get(name)
            .map(|i| t.inverters[*i].clone())
            .ok_or_else(|| CatalogError::InverterNotFound(name.to_string()))
    }

    pub fn module_names(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.tables()?.modules.iter().map(|m| m.name.clone()).collect())
    }

    pub fn inverter_names(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.tables()?.inverters.iter().map(|i| i.name.clone()).collect())
    }

    /// Position of the configured default module, 0 when unset or unknown.
    pub fn default_module_index(&self) -> Result<usize, CatalogError> {
        let t = self.tables()?;
        Ok(self
            .default_module
            .as_ref()
            .and_then(|n| t.module_index.get(n).copied())
            .unwrap_or(0))
    }

    pub fn default_inverter_index(&self) -> Result<usize, CatalogError> {
        let t = self.tables()?;
        Ok(self
            .default_inverter
            .as_ref()
            .and_then(|n| t.inverter_index.get(n).copied())
            .unwrap_or(0))
    }

    pub fn module_details(&self, name: &str) -> Result<ModuleDetails, CatalogError> {
        let m = self.module(name)?;
        Ok(ModuleDetails {
            power: m.rated_power_w(),
            voc: m.voc,
            isc: m.isc,
            vmpp: m.vmp,
            impp: m.imp,
            area: m.area_m2,
            material: m.material.clone().unwrap_or_else(|| "Not specified".to_string()),
            temp_coeff_pmax: m.pmax_coefficient_pct(),
            name: m.name,
        })
    }

    pub fn inverter_details(&self, name: &str) -> Result<InverterDetails, CatalogError> {
        let inv = self.inverter(name)?;
        let efficiency = if inv.pdc_max_w > 0.0 {
            inv.pac_max_w / inv.pdc_max_w * 100.0
        } else {
            0.0
        };
        Ok(InverterDetails {
            pac: inv.pac_max_w,
            pdc: inv.pdc_max_w,
            vdc_min: inv.mppt_min_v,
            vdc_max: inv.vdc_max_v,
            idc_max: inv.idc_max_a,
            efficiency,
            name: inv.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_first: bool,
    }

    impl CatalogLoader for CountingLoader {
        fn load(&self) -> Result<CatalogTables, CatalogError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(CatalogError::Load("transient".to_string()));
            }
            thread::sleep(std::time::Duration::from_millis(20));
            SamCsvLoader::bundled().load()
        }
    }

    #[test]
    fn test_bundled_catalog_contains_defaults() {
        let cfg = crate::config::Config::default().catalog;
        let catalog = Catalog::from_config(&CatalogConfig {
            default_module: Some("Canadian_Solar_CS6X_300M__2013_".to_string()),
            default_inverter: Some("SMA_America__SB7000US__240V_".to_string()),
            ..cfg
        });
        let module = catalog.module("Canadian_Solar_CS6X_300M__2013_").unwrap();
        assert!(module.rated_power_w() > 280.0);
        let names = catalog.module_names().unwrap();
        assert_eq!(names[catalog.default_module_index().unwrap()], module.name);
        let inverters = catalog.inverter_names().unwrap();
        assert_eq!(
            inverters[catalog.default_inverter_index().unwrap()],
            "SMA_America__SB7000US__240V_"
        );
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let catalog = Catalog::new(Box::new(SamCsvLoader::bundled()));
        assert!(matches!(
            catalog.module("nope"),
            Err(CatalogError::ModuleNotFound(_))
        ));
        assert!(matches!(
            catalog.inverter_details("nope"),
            Err(CatalogError::InverterNotFound(_))
        ));
    }

    #[test]
    fn test_inverter_details_efficiency() {
        let catalog = Catalog::new(Box::new(SamCsvLoader::bundled()));
        let details = catalog.inverter_details("SMA_America__SB7000US__240V_").unwrap();
        assert!((details.efficiency - 7000.0 / 7275.14 * 100.0).abs() < 1e-9);
        assert_eq!(details.vdc_max, Some(600.0));
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = Arc::new(Catalog::new(Box::new(CountingLoader {
            calls: calls.clone(),
            fail_first: false,
        })));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = catalog.clone();
                thread::spawn(move || c.module_names().unwrap().len())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap() > 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = Catalog::new(Box::new(CountingLoader {
            calls: calls.clone(),
            fail_first: true,
        }));
        assert!(matches!(catalog.module_names(), Err(CatalogError::Load(_))));
        assert!(catalog.module_names().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let catalog = Catalog::from_config(&CatalogConfig {
            module_path: Some("/nonexistent/modules.csv".to_string()),
            ..Default::default()
        });
        assert!(matches!(catalog.module_names(), Err(CatalogError::Load(_))));
    }
}
