//! Installed-cost breakdown with economies of scale.

use serde::{Deserialize, Serialize};

use super::Currency;

/// Per-watt base prices in USD and the share each shrinks by at full scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub module_per_w: f64,
    pub inverter_per_w: f64,
    pub bos_per_w: f64,
    pub installation_per_w: f64,
    pub soft_per_w: f64,
    pub module_scale_reduction: f64,
    pub inverter_scale_reduction: f64,
    pub bos_scale_reduction: f64,
    pub installation_scale_reduction: f64,
    pub soft_scale_reduction: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            module_per_w: 0.35,
            inverter_per_w: 0.10,
            // racking 0.10 + wiring 0.15 + disconnect 0.05
            bos_per_w: 0.30,
            // labor 0.20 + overhead 0.10 + profit 0.10
            installation_per_w: 0.40,
            // permitting, inspection, interconnection, overhead
            soft_per_w: 0.35,
            module_scale_reduction: 0.10,
            inverter_scale_reduction: 0.10,
            bos_scale_reduction: 0.15,
            installation_scale_reduction: 0.20,
            soft_scale_reduction: 0.10,
        }
    }
}

/// Caller-supplied replacements for computed components, in the report currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostOverrides {
    pub modules: Option<f64>,
    pub inverters: Option<f64>,
    pub balance_of_system: Option<f64>,
    pub installation: Option<f64>,
    pub soft_costs: Option<f64>,
    pub land: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(rename = "Modules")]
    pub modules: f64,
    #[serde(rename = "Inverters")]
    pub inverters: f64,
    #[serde(rename = "Balance of System")]
    pub balance_of_system: f64,
    #[serde(rename = "Installation")]
    pub installation: f64,
    #[serde(rename = "Soft Costs")]
    pub soft_costs: f64,
    #[serde(rename = "Land")]
    pub land: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.modules + self.inverters + self.balance_of_system + self.installation + self.soft_costs + self.land
    }
}

impl CostModel {
    /// 0 at 1 kW, 1 from 100 kW upwards.
    pub fn scale_factor(system_kw: f64) -> f64 {
        if system_kw > 0.0 {
            (system_kw.log10() / 2.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Component costs for `system_kw`, converted to `currency`.
    pub fn breakdown(
        &self,
        system_kw: f64,
        currency: Currency,
        land_cost: f64,
        overrides: &CostOverrides,
    ) -> CostBreakdown {
        let watts = system_kw * 1000.0;
        let f = Self::scale_factor(system_kw);
        let component = |per_w: f64, reduction: f64| currency.from_usd(watts * per_w * (1.0 - reduction * f));

        CostBreakdown {
            modules: overrides
                .modules
                .unwrap_or_else(|| component(self.module_per_w, self.module_scale_reduction)),
            inverters: overrides
                .inverters
                .unwrap_or_else(|| component(self.inverter_per_w, self.inverter_scale_reduction)),
            balance_of_system: overrides
                .balance_of_system
                .unwrap_or_else(|| component(self.bos_per_w, self.bos_scale_reduction)),
            installation: overrides
                .installation
                .unwrap_or_else(|| component(self.installation_per_w, self.installation_scale_reduction)),
            soft_costs: overrides
                .soft_costs
                .unwrap_or_else(|| component(self.soft_per_w, self.soft_scale_reduction)),
            land: overrides.land.unwrap_or(land_cost),
        }
    }
}
