//! Lifecycle financial projection.
//!
//! A pure numeric transform: rates are taken as given fractions and never
//! bounds-checked, and a negative net capital cost is carried through as is.

pub mod cost;
pub mod currency;

pub use cost::*;
pub use currency::*;

use serde::{Deserialize, Serialize};

use crate::domain::{CashflowLedger, FinancialSummary};

/// Grid emission factor used for the CO2 offset, kg/kWh.
pub const CO2_KG_PER_KWH: f64 = 0.7;

/// Economic inputs of one projection, amounts in the report currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialParameters {
    pub capital_cost: f64,
    pub federal_incentive_rate: f64,
    pub state_incentive_rate: f64,
    /// Year-one price per kWh
    pub electricity_rate: f64,
    /// Flat yearly O&M
    pub maintenance_cost: f64,
    pub project_life_years: u32,
    pub degradation_rate: f64,
    pub escalation_rate: f64,
    pub discount_rate: f64,
}

impl FinancialParameters {
    /// Incentives applied independently to the gross cost.
    pub fn net_capital_cost(&self) -> f64 {
        self.capital_cost * (1.0 - self.federal_incentive_rate - self.state_incentive_rate)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialModel;

impl FinancialModel {
    pub fn project(&self, first_year_kwh: f64, p: &FinancialParameters) -> (CashflowLedger, FinancialSummary) {
        let net_capital_cost = p.net_capital_cost();
        let mut ledger = CashflowLedger::opening(net_capital_cost);

        let mut npv = -net_capital_cost;
        let mut discounted_cost = net_capital_cost;
        let mut discounted_energy = 0.0;

        for year in 1..=p.project_life_years {
            let exponent = (year - 1) as i32;
            let energy = first_year_kwh * (1.0 - p.degradation_rate).powi(exponent);
            let price = p.electricity_rate * (1.0 + p.escalation_rate).powi(exponent);
            let revenue = energy * price;
            let net = revenue - p.maintenance_cost;
            ledger.push_year(energy, price, revenue, net);

            let discount = (1.0 + p.discount_rate).powi(year as i32);
            npv += net / discount;
            discounted_cost += p.maintenance_cost / discount;
            discounted_energy += energy / discount;
        }

        let lcoe = (discounted_energy != 0.0).then(|| discounted_cost / discounted_energy);
        let annual_savings = ledger
            .entries()
            .get(1)
            .map(|e| e.revenue)
            .unwrap_or(0.0);
        let lifetime_net_cashflow = ledger
            .entries()
            .last()
            .map(|e| e.cumulative_cashflow)
            .unwrap_or(-net_capital_cost);

        let summary = FinancialSummary {
            net_capital_cost,
            npv,
            lcoe,
            payback: ledger.payback(),
            co2_offset_tonnes_per_year: first_year_kwh * CO2_KG_PER_KWH / 1000.0,
            annual_savings,
            lifetime_net_cashflow,
        };
        (ledger, summary)
    }
}
