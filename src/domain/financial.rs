use serde::{Deserialize, Serialize};

/// One year of the cash-flow ledger. Year 0 holds the capital outlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashflowEntry {
    pub year: u32,
    pub energy_kwh: f64,
    pub price_per_kwh: f64,
    pub revenue: f64,
    pub net_cashflow: f64,
    pub cumulative_cashflow: f64,
}

/// Ordered, append-only ledger for years `0..=project_life`.
///
/// `cumulative[0] = -net_capital_cost` and
/// `cumulative[n] = cumulative[n-1] + cashflow[n]` hold by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowLedger {
    entries: Vec<CashflowEntry>,
}

impl CashflowLedger {
    pub(crate) fn opening(net_capital_cost: f64) -> Self {
        Self {
            entries: vec![CashflowEntry {
                year: 0,
                energy_kwh: 0.0,
                price_per_kwh: 0.0,
                revenue: 0.0,
                net_cashflow: -net_capital_cost,
                cumulative_cashflow: -net_capital_cost,
            }],
        }
    }

    pub(crate) fn push_year(&mut self, energy_kwh: f64, price_per_kwh: f64, revenue: f64, net: f64) {
        let last = self
            .entries
            .last()
            .map(|e| (e.year, e.cumulative_cashflow))
            .unwrap_or((0, 0.0));
        self.entries.push(CashflowEntry {
            year: last.0 + 1,
            energy_kwh,
            price_per_kwh,
            revenue,
            net_cashflow: net,
            cumulative_cashflow: last.1 + net,
        });
    }

    pub fn entries(&self) -> &[CashflowEntry] {
        &self.entries
    }

    /// Last year index in the ledger.
    pub fn horizon(&self) -> u32 {
        self.entries.last().map(|e| e.year).unwrap_or(0)
    }

    pub fn annual_cashflows(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.net_cashflow).collect()
    }

    pub fn cumulative_cashflows(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.cumulative_cashflow).collect()
    }

    /// First year whose cumulative cash flow is non-negative.
    pub fn payback(&self) -> Payback {
        self.entries
            .iter()
            .find(|e| e.cumulative_cashflow >= 0.0)
            .map(|e| Payback::Recovered { years: e.year })
            .unwrap_or(Payback::NotRecovered {
                horizon_years: self.horizon(),
            })
    }
}

/// Simple payback, saturating at the project horizon when never reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Payback {
    Recovered { years: u32 },
    NotRecovered { horizon_years: u32 },
}

impl Payback {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Payback::Recovered { .. })
    }

    /// Bounded value for display: the payback year, or the horizon.
    pub fn display_years(&self) -> u32 {
        match *self {
            Payback::Recovered { years } => years,
            Payback::NotRecovered { horizon_years } => horizon_years,
        }
    }
}

/// Read-only metrics derived from a [`CashflowLedger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub net_capital_cost: f64,
    pub npv: f64,
    /// Discounted cost over discounted energy; `None` when no energy is produced.
    pub lcoe: Option<f64>,
    pub payback: Payback,
    /// Tonnes CO2 avoided per year.
    pub co2_offset_tonnes_per_year: f64,
    /// Year-one revenue.
    pub annual_savings: f64,
    /// Cumulative cash flow at the horizon.
    pub lifetime_net_cashflow: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_accumulates() {
        let mut ledger = CashflowLedger::opening(1000.0);
        ledger.push_year(10.0, 1.0, 10.0, 600.0);
        ledger.push_year(10.0, 1.0, 10.0, 600.0);
        assert_eq!(ledger.cumulative_cashflows(), vec![-1000.0, -400.0, 200.0]);
        assert_eq!(ledger.horizon(), 2);
        assert_eq!(ledger.payback(), Payback::Recovered { years: 2 });
    }

    #[test]
    fn test_payback_saturates_at_horizon() {
        let mut ledger = CashflowLedger::opening(1000.0);
        ledger.push_year(0.0, 0.0, 0.0, 1.0);
        let payback = ledger.payback();
        assert_eq!(payback, Payback::NotRecovered { horizon_years: 1 });
        assert_eq!(payback.display_years(), 1);
        assert!(!payback.is_recovered());
    }

    #[test]
    fn test_negative_capital_cost_pays_back_immediately() {
        let ledger = CashflowLedger::opening(-50.0);
        assert_eq!(ledger.payback(), Payback::Recovered { years: 0 });
    }
}
