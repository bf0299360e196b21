use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregates::AggregateResolver;
use super::checked_percent;
use crate::config::EngineConfig;
use crate::model::{ModelLookup, UnderwritingSnapshot};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Everything an EGI formula may read. The income and expense totals are
/// already summed by the time a formula sees them.
#[derive(Debug, Clone, Copy)]
pub struct EgiInputs<'a> {
    pub parameters: &'a ModelLookup,
    pub config: &'a EngineConfig,
    /// Sum of in-place monthly rents, annualized
    pub rental_income_annual: Money,
    pub amenity_income_annual: Money,
    pub retail_income_annual: Money,
    pub retail_expenses_annual: Money,
}

/// Intermediate figures of the standard formula, for display and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgiBreakdown {
    pub vacancy_pct: Percent,
    pub bad_debt_pct: Percent,
    pub less_vacancy_and_bad_debt_pct: Percent,
    pub annual_turnover_pct: Percent,
    pub free_months_rent: Decimal,
    pub broker_fee: Decimal,
    pub rental_income_annual: Money,
    pub amenity_income_annual: Money,
    pub retail_income_annual: Money,
    pub retail_operating_expenses: Money,
    pub recovery_income: Money,
    pub egi_retail: Money,
    pub assumed_lease_term: Decimal,
    pub ongoing_lease_up_cost: Decimal,
    pub egi: Money,
    /// The formula overflowed; the derived figures above are zero
    #[serde(default)]
    pub overflowed: bool,
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// Effective gross income from summed inputs. Hosts with their own
/// definition plug in here; the resolver never assumes a particular one.
pub trait EgiFormula {
    /// `None` when the result does not fit a decimal. The resolver then
    /// uses zero and warns.
    fn egi(&self, inputs: &EgiInputs<'_>) -> Option<Money>;
}

/// Residential rent plus amenities plus net retail, less vacancy, bad debt
/// and ongoing lease-up cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEgi;

impl StandardEgi {
    pub fn breakdown(&self, inputs: &EgiInputs<'_>) -> EgiBreakdown {
        let cfg = inputs.config;
        let params = inputs.parameters;

        let vacancy_pct = params.get_or(&cfg.vacancy_key, cfg.default_vacancy_pct);
        let bad_debt_pct = params.get_or(&cfg.bad_debt_key, Decimal::ZERO);
        let lvbd_pct = params.get_or(&cfg.less_vacancy_and_bad_debt_key, Decimal::ZERO);
        let turnover_pct =
            params.get_or(&cfg.annual_turnover_key, cfg.default_annual_turnover_pct);
        let free_months_rent = params.get_or(&cfg.free_months_rent_key, Decimal::ZERO);
        let broker_fee = params.get_or(&cfg.broker_fee_key, Decimal::ZERO);

        // Retail expenses are assumed fully recovered from tenants.
        let retail_opex = inputs.retail_expenses_annual;
        let recovery_income = retail_opex;

        let figures = || -> Option<(Money, Decimal, Decimal, Money)> {
            let retail_gross = inputs.retail_income_annual.checked_add(recovery_income)?;
            let retail_deductions =
                checked_percent(lvbd_pct, retail_gross)?.checked_add(retail_opex)?;
            let egi_retail = retail_gross.checked_sub(retail_deductions)?;

            let mut lease_term = dec!(12).checked_add(free_months_rent)?;
            if lease_term.is_zero() {
                lease_term = dec!(12);
            }
            let lease_up_cost = free_months_rent
                .checked_add(broker_fee)?
                .checked_mul(turnover_pct)?
                .checked_div(lease_term.checked_mul(dec!(100))?)?;

            let deductions = Decimal::ONE
                .checked_sub(checked_percent(vacancy_pct, Decimal::ONE)?)?
                .checked_sub(checked_percent(bad_debt_pct, Decimal::ONE)?)?
                .checked_sub(lease_up_cost)?;
            let egi = inputs
                .rental_income_annual
                .checked_add(inputs.amenity_income_annual)?
                .checked_add(egi_retail)?
                .checked_mul(deductions)?;
            Some((egi_retail, lease_term, lease_up_cost, egi))
        };
        let (egi_retail, lease_term, lease_up_cost, egi, overflowed) = match figures() {
            Some((retail, term, cost, egi)) => (retail, term, cost, egi, false),
            None => (Decimal::ZERO, dec!(12), Decimal::ZERO, Decimal::ZERO, true),
        };

        EgiBreakdown {
            vacancy_pct,
            bad_debt_pct,
            less_vacancy_and_bad_debt_pct: lvbd_pct,
            annual_turnover_pct: turnover_pct,
            free_months_rent,
            broker_fee,
            rental_income_annual: inputs.rental_income_annual,
            amenity_income_annual: inputs.amenity_income_annual,
            retail_income_annual: inputs.retail_income_annual,
            retail_operating_expenses: retail_opex,
            recovery_income,
            egi_retail,
            assumed_lease_term: lease_term,
            ongoing_lease_up_cost: lease_up_cost,
            egi,
            overflowed,
        }
    }
}

impl EgiFormula for StandardEgi {
    fn egi(&self, inputs: &EgiInputs<'_>) -> Option<Money> {
        let breakdown = self.breakdown(inputs);
        (!breakdown.overflowed).then_some(breakdown.egi)
    }
}

/// Standard EGI for a snapshot, with its intermediate figures.
pub fn calculate_egi(snapshot: &UnderwritingSnapshot) -> ComputationOutput<EgiBreakdown> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let aggregates = AggregateResolver::new().resolve(snapshot, &mut warnings);
    let breakdown = StandardEgi.breakdown(&EgiInputs {
        parameters: &snapshot.model_parameters,
        config: &snapshot.config,
        rental_income_annual: aggregates.rental_income_annual,
        amenity_income_annual: aggregates.amenity_income_annual,
        retail_income_annual: aggregates.retail_income_annual,
        retail_expenses_annual: aggregates.retail_expenses_annual,
    });

    if breakdown.overflowed {
        warnings.push("EGI is out of range; resolved as 0".to_string());
    }
    if breakdown.egi < Decimal::ZERO {
        warnings.push(format!(
            "EGI is negative ({}); deductions exceed gross income",
            breakdown.egi
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Effective gross income: (rental + amenity + net retail) x (1 - vacancy - bad debt - lease-up cost)",
        &snapshot.config,
        warnings,
        elapsed,
        breakdown,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(params: &'a ModelLookup, cfg: &'a EngineConfig) -> EgiInputs<'a> {
        EgiInputs {
            parameters: params,
            config: cfg,
            rental_income_annual: dec!(1200000),
            amenity_income_annual: dec!(6000),
            retail_income_annual: Decimal::ZERO,
            retail_expenses_annual: Decimal::ZERO,
        }
    }

    #[test]
    fn test_defaults_apply_five_percent_vacancy() {
        let params = ModelLookup::new();
        let cfg = EngineConfig::default();
        let b = StandardEgi.breakdown(&inputs(&params, &cfg));
        assert_eq!(b.vacancy_pct, dec!(5));
        assert_eq!(b.annual_turnover_pct, dec!(20));
        // No free rent and no broker fee, so no lease-up cost.
        assert_eq!(b.ongoing_lease_up_cost, Decimal::ZERO);
        assert_eq!(b.egi, dec!(1145700));
    }

    #[test]
    fn test_lease_up_cost() {
        let params: ModelLookup = [
            ("Vacancy", dec!(0)),
            ("Free Month's Rent", dec!(1)),
            ("Broker Fee", dec!(0.5)),
            ("Annual Turnover", dec!(26)),
        ]
        .into_iter()
        .collect();
        let cfg = EngineConfig::default();
        let b = StandardEgi.breakdown(&inputs(&params, &cfg));
        assert_eq!(b.assumed_lease_term, dec!(13));
        // (1 + 0.5) / 13 * 0.26 = 0.03
        assert_eq!(b.ongoing_lease_up_cost, dec!(0.03));
        assert_eq!(b.egi, dec!(1169820));
    }

    #[test]
    fn test_negative_free_rent_cannot_divide_by_zero() {
        let params: ModelLookup = [("Free Month's Rent", dec!(-12))].into_iter().collect();
        let cfg = EngineConfig::default();
        let b = StandardEgi.breakdown(&inputs(&params, &cfg));
        assert_eq!(b.assumed_lease_term, dec!(12));
    }

    #[test]
    fn test_retail_nets_out_expenses() {
        let params: ModelLookup = [("Vacancy", dec!(0)), ("Less: Vacancy and Bad Debt", dec!(10))]
            .into_iter()
            .collect();
        let cfg = EngineConfig::default();
        let mut i = inputs(&params, &cfg);
        i.rental_income_annual = Decimal::ZERO;
        i.amenity_income_annual = Decimal::ZERO;
        i.retail_income_annual = dec!(100000);
        i.retail_expenses_annual = dec!(20000);
        let b = StandardEgi.breakdown(&i);
        // 120000 - (12000 + 20000)
        assert_eq!(b.egi_retail, dec!(88000));
        assert_eq!(StandardEgi.egi(&i), Some(dec!(88000)));
    }

    #[test]
    fn test_overflowing_parameters_fail_closed() {
        let params: ModelLookup = [("Vacancy", dec!(-1000000000000000000000000000))]
            .into_iter()
            .collect();
        let cfg = EngineConfig::default();
        let b = StandardEgi.breakdown(&inputs(&params, &cfg));
        assert!(b.overflowed);
        assert_eq!(b.egi, Decimal::ZERO);
        assert_eq!(StandardEgi.egi(&inputs(&params, &cfg)), None);
    }
}
