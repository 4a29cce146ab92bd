use approx::assert_relative_eq;
use proptest::prelude::*;
use pv_plant_calculator::domain::Payback;
use pv_plant_calculator::finance::{FinancialModel, FinancialParameters};

fn two_year_case() -> FinancialParameters {
    FinancialParameters {
        capital_cost: 10_000.0,
        federal_incentive_rate: 0.0,
        state_incentive_rate: 0.0,
        electricity_rate: 0.10,
        maintenance_cost: 100.0,
        project_life_years: 2,
        degradation_rate: 0.0,
        escalation_rate: 0.0,
        discount_rate: 0.0,
    }
}

#[test]
fn two_year_project_without_discounting() {
    let (ledger, summary) = FinancialModel.project(10_000.0, &two_year_case());

    assert_eq!(ledger.entries().len(), 3);
    assert_relative_eq!(ledger.annual_cashflows()[1], 900.0, epsilon = 1e-9);
    assert_relative_eq!(ledger.annual_cashflows()[2], 900.0, epsilon = 1e-9);
    assert_relative_eq!(ledger.cumulative_cashflows()[2], -8200.0, epsilon = 1e-9);
    assert_relative_eq!(summary.npv, -8200.0, epsilon = 1e-9);
    assert_relative_eq!(summary.lifetime_net_cashflow, -8200.0, epsilon = 1e-9);
    assert_relative_eq!(summary.annual_savings, 1000.0, epsilon = 1e-9);
    assert_eq!(summary.payback, Payback::NotRecovered { horizon_years: 2 });
    assert_relative_eq!(summary.co2_offset_tonnes_per_year, 7.0, epsilon = 1e-9);
}

#[test]
fn zero_energy_has_no_lcoe() {
    let (_, summary) = FinancialModel.project(0.0, &two_year_case());
    assert_eq!(summary.lcoe, None);
}

#[test]
fn zero_life_keeps_only_the_outlay() {
    let p = FinancialParameters {
        project_life_years: 0,
        ..two_year_case()
    };
    let (ledger, summary) = FinancialModel.project(10_000.0, &p);
    assert_eq!(ledger.entries().len(), 1);
    assert_eq!(summary.lcoe, None);
    assert_relative_eq!(summary.npv, -10_000.0, epsilon = 1e-9);
    assert_eq!(summary.annual_savings, 0.0);
}

#[test]
fn lcoe_matches_hand_computation() {
    let (_, summary) = FinancialModel.project(10_000.0, &two_year_case());
    // (10000 + 100 + 100) / (10000 + 10000)
    assert_relative_eq!(summary.lcoe.unwrap(), 0.51, epsilon = 1e-12);
}

proptest! {
    #[test]
    fn cumulative_is_running_sum(
        energy in 0.0f64..1.0e7,
        capital in 0.0f64..1.0e7,
        rate in 0.0f64..1.0,
        life in 0u32..40,
        degradation in 0.0f64..0.05,
        escalation in 0.0f64..0.1,
        discount in 0.0f64..0.2,
    ) {
        let p = FinancialParameters {
            capital_cost: capital,
            electricity_rate: rate,
            project_life_years: life,
            degradation_rate: degradation,
            escalation_rate: escalation,
            discount_rate: discount,
            ..two_year_case()
        };
        let (ledger, summary) = FinancialModel.project(energy, &p);
        let annual = ledger.annual_cashflows();
        let cumulative = ledger.cumulative_cashflows();

        prop_assert_eq!(annual.len(), life as usize + 1);
        prop_assert_eq!(cumulative[0], -summary.net_capital_cost);
        let mut running = 0.0;
        for (n, c) in cumulative.iter().enumerate() {
            running += annual[n];
            prop_assert!((running - c).abs() <= 1e-6 * (1.0 + running.abs()));
        }
    }

    #[test]
    fn undiscounted_npv_equals_final_cumulative(
        energy in 0.0f64..1.0e6,
        capital in 0.0f64..1.0e6,
        life in 1u32..30,
    ) {
        let p = FinancialParameters {
            capital_cost: capital,
            project_life_years: life,
            ..two_year_case()
        };
        let (_, summary) = FinancialModel.project(energy, &p);
        prop_assert!((summary.npv - summary.lifetime_net_cashflow).abs() <= 1e-6 * (1.0 + summary.npv.abs()));
    }

    #[test]
    fn payback_year_is_first_non_negative(
        energy in 1.0f64..1.0e5,
        capital in 0.0f64..1.0e5,
        life in 1u32..30,
    ) {
        let p = FinancialParameters {
            capital_cost: capital,
            project_life_years: life,
            ..two_year_case()
        };
        let (ledger, summary) = FinancialModel.project(energy, &p);
        match summary.payback {
            Payback::Recovered { years } => {
                let cumulative = ledger.cumulative_cashflows();
                prop_assert!(cumulative[years as usize] >= 0.0);
                prop_assert!(cumulative[..years as usize].iter().all(|c| *c < 0.0));
            }
            Payback::NotRecovered { horizon_years } => {
                prop_assert_eq!(horizon_years, life);
                prop_assert!(ledger.cumulative_cashflows().iter().all(|c| *c < 0.0));
            }
        }
    }
}
