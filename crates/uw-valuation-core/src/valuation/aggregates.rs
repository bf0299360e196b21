use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::egi::{EgiFormula, EgiInputs, StandardEgi};
use super::evaluator::LineItemEvaluator;
use super::checked_sum;
use super::income::{derive_amenity, derive_retail_income};
use crate::config::names_match;
use crate::model::{FactorKind, LineItem, RetailIncomeRow, UnderwritingSnapshot};
use crate::types::{with_metadata, ComputationOutput, Money, SquareFeet};

/// Cross-category totals that line-item formulas reference. Every field is
/// zero when its source is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregates {
    pub acquisition_price: Money,
    pub acquisition_loan: Money,
    /// Annual value of the operating expense row named "Property Taxes"
    pub property_taxes_annual: Money,
    /// Annual value of the operating expense row named "Insurance"
    pub insurance_annual: Money,
    pub egi: Money,
    pub total_retail_sf: SquareFeet,
    pub base_rent_annual: Money,
    pub unit_count: Decimal,
    pub unit_square_feet: SquareFeet,
    pub gross_square_feet: SquareFeet,
    /// Gross square feet less the units' square feet
    pub common_area_sf: SquareFeet,
    pub rental_income_annual: Money,
    pub amenity_income_annual: Money,
    /// Same figure as `base_rent_annual`, as the EGI formula consumes it
    pub retail_income_annual: Money,
    pub retail_expenses_annual: Money,
}

impl Aggregates {
    /// Only the retail-income sums. Enough to evaluate retail expense rows.
    pub fn from_retail(rows: &[RetailIncomeRow]) -> Aggregates {
        retail_aggregates(rows, &mut Vec::new())
    }
}

/// `value`, or zero with a warning when the figure overflowed.
fn in_range(value: Option<Decimal>, what: &str, warnings: &mut Vec<String>) -> Decimal {
    value.unwrap_or_else(|| {
        debug!("event=aggregate_fallback module=aggregates status=overflow field={what:?}");
        warnings.push(format!("{what} is out of range; resolved as 0"));
        Decimal::ZERO
    })
}

fn retail_aggregates(rows: &[RetailIncomeRow], warnings: &mut Vec<String>) -> Aggregates {
    let total_retail_sf: SquareFeet = in_range(
        checked_sum(rows.iter().map(|r| r.square_feet)),
        "Total retail square feet",
        warnings,
    );
    let base_rent_annual: Money = in_range(
        checked_sum(rows.iter().map(|r| derive_retail_income(r).annual_rent)),
        "Retail base rent",
        warnings,
    );
    Aggregates {
        total_retail_sf,
        base_rent_annual,
        retail_income_annual: base_rent_annual,
        ..Aggregates::default()
    }
}

/// Resolves [`Aggregates`] for a snapshot in dependency order:
/// retail SF and base rent, retail expense total, amenity total, rental
/// income, EGI, then the property-tax and insurance rows (which may
/// themselves be a percent of EGI).
#[derive(Debug, Clone, Default)]
pub struct AggregateResolver<F: EgiFormula = StandardEgi> {
    formula: F,
}

impl AggregateResolver<StandardEgi> {
    pub fn new() -> Self {
        AggregateResolver {
            formula: StandardEgi,
        }
    }
}

impl<F: EgiFormula> AggregateResolver<F> {
    pub fn with_formula(formula: F) -> Self {
        AggregateResolver { formula }
    }

    pub fn formula(&self) -> &F {
        &self.formula
    }

    /// Never fails. Each absent input that some row actually depends on is
    /// reported in `warnings` and resolved as zero.
    pub fn resolve(
        &self,
        snapshot: &UnderwritingSnapshot,
        warnings: &mut Vec<String>,
    ) -> Aggregates {
        let cfg = &snapshot.config;
        let params = &snapshot.model_parameters;
        let vars = &snapshot.model_variables;

        let mut agg = retail_aggregates(&snapshot.retail_income, warnings);

        let acquisition_price = params.get(&cfg.acquisition_price_key);
        let acquisition_loan = vars.get(&cfg.acquisition_loan_key);
        let gross_square_feet = params.get(&cfg.gross_square_feet_key);

        agg.acquisition_price = acquisition_price.unwrap_or(Decimal::ZERO);
        agg.acquisition_loan = acquisition_loan.unwrap_or(Decimal::ZERO);
        agg.unit_count = Decimal::from(snapshot.units.len());
        agg.unit_square_feet = in_range(
            checked_sum(snapshot.units.iter().map(|u| u.square_feet)),
            "Unit square feet",
            warnings,
        );
        agg.gross_square_feet = gross_square_feet.unwrap_or(Decimal::ZERO);
        agg.common_area_sf = in_range(
            agg.gross_square_feet.checked_sub(agg.unit_square_feet),
            "Common area square feet",
            warnings,
        );

        let retail_expenses_annual = {
            let evaluator = LineItemEvaluator::new(&agg);
            checked_sum(
                snapshot
                    .retail_expenses
                    .iter()
                    .map(|e| evaluator.annual(e, &snapshot.retail_expenses)),
            )
        };
        agg.retail_expenses_annual =
            in_range(retail_expenses_annual, "Retail expense total", warnings);
        agg.amenity_income_annual = in_range(
            checked_sum(snapshot.amenity_income.iter().map(|a| derive_amenity(a).annual)),
            "Amenity income total",
            warnings,
        );
        agg.rental_income_annual = in_range(
            checked_sum(snapshot.units.iter().filter_map(|u| u.current_rent))
                .and_then(|monthly| monthly.checked_mul(Decimal::from(12))),
            "Rental income",
            warnings,
        );

        let egi = self.formula.egi(&EgiInputs {
            parameters: params,
            config: cfg,
            rental_income_annual: agg.rental_income_annual,
            amenity_income_annual: agg.amenity_income_annual,
            retail_income_annual: agg.retail_income_annual,
            retail_expenses_annual: agg.retail_expenses_annual,
        });
        agg.egi = in_range(egi, "EGI", warnings);

        let taxes_row = find_row(&snapshot.operating_expenses, &cfg.property_taxes_row);
        let insurance_row = find_row(&snapshot.operating_expenses, &cfg.insurance_row);
        {
            let evaluator = LineItemEvaluator::new(&agg);
            let taxes = taxes_row.map(|r| evaluator.annual(r, &snapshot.operating_expenses));
            let insurance =
                insurance_row.map(|r| evaluator.annual(r, &snapshot.operating_expenses));
            agg.property_taxes_annual = taxes.unwrap_or(Decimal::ZERO);
            agg.insurance_annual = insurance.unwrap_or(Decimal::ZERO);
        }

        let referenced = |kind: FactorKind| references(snapshot, &kind);
        let mut missing = |absent: bool, used: bool, what: String| {
            if absent && used {
                debug!("event=aggregate_fallback module=aggregates status=missing field={what:?}");
                warnings.push(format!("{what} not found; resolved as 0"));
            }
        };
        missing(
            acquisition_price.is_none(),
            referenced(FactorKind::PercentOfPurchasePrice),
            format!("Model parameter '{}'", cfg.acquisition_price_key),
        );
        missing(
            acquisition_loan.is_none(),
            referenced(FactorKind::PercentOfAcquisitionLoan),
            format!("Model variable '{}'", cfg.acquisition_loan_key),
        );
        missing(
            gross_square_feet.is_none(),
            referenced(FactorKind::PerCommonAreaSquareFoot)
                || referenced(FactorKind::PerTotalSquareFoot),
            format!("Model parameter '{}'", cfg.gross_square_feet_key),
        );
        missing(
            taxes_row.is_none(),
            referenced(FactorKind::PercentOfPropertyTaxes),
            format!("Operating expense row '{}'", cfg.property_taxes_row),
        );
        missing(
            insurance_row.is_none(),
            referenced(FactorKind::PercentOfInsuranceCost),
            format!("Operating expense row '{}'", cfg.insurance_row),
        );

        agg
    }
}

/// First row whose name matches, trimmed and case-insensitively.
fn find_row<'a>(rows: &'a [LineItem], name: &str) -> Option<&'a LineItem> {
    rows.iter().find(|r| names_match(&r.name, name))
}

fn references(snapshot: &UnderwritingSnapshot, kind: &FactorKind) -> bool {
    snapshot
        .expenses
        .iter()
        .chain(&snapshot.operating_expenses)
        .chain(&snapshot.retail_expenses)
        .any(|e| &e.factor == kind && e.category.accepts(kind))
}

/// Aggregates for a snapshot using the standard EGI formula.
pub fn resolve_aggregates(snapshot: &UnderwritingSnapshot) -> ComputationOutput<Aggregates> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let aggregates = AggregateResolver::new().resolve(snapshot, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Cross-category aggregates resolved in dependency order",
        &snapshot.config,
        warnings,
        elapsed,
        aggregates,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ModelLookup, Unit};
    use rust_decimal_macros::dec;

    fn opex(id: &str, name: &str, factor: FactorKind, cost: Decimal) -> LineItem {
        LineItem {
            cost_per: cost,
            ..LineItem::new(id, name, Category::OperatingExpense).with_factor(factor)
        }
    }

    fn unit(rent: Option<Decimal>) -> Unit {
        Unit {
            id: String::new(),
            square_feet: dec!(800),
            rent_per_square_foot_per_year: Decimal::ZERO,
            current_rent: rent,
        }
    }

    #[test]
    fn test_acquisition_loan_from_formatted_string() {
        let snapshot: UnderwritingSnapshot = serde_json::from_str(
            r#"{"model_variables": {"AQ: Max Acquisition Loan at Closing": "1,000,000"}}"#,
        )
        .unwrap();
        let mut warnings = Vec::new();
        let agg = AggregateResolver::new().resolve(&snapshot, &mut warnings);
        assert_eq!(agg.acquisition_loan, dec!(1000000));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_retail_sums() {
        let mut a = RetailIncomeRow::new("a");
        a.square_feet = dec!(2000);
        a.rent_per_square_foot_per_year = dec!(30);
        let mut b = RetailIncomeRow::new("b");
        b.square_feet = dec!(3000);
        b.rent_per_square_foot_per_year = dec!(40);
        let agg = Aggregates::from_retail(&[a, b]);
        assert_eq!(agg.total_retail_sf, dec!(5000));
        assert_eq!(agg.base_rent_annual, dec!(180000));
        assert_eq!(agg.retail_income_annual, dec!(180000));
    }

    #[test]
    fn test_unit_figures_and_common_area() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.units = vec![unit(Some(dec!(2000))), unit(None), unit(Some(dec!(1500)))];
        snapshot.model_parameters = [("Gross Square Feet", dec!(3000))].into_iter().collect();
        let agg = AggregateResolver::new().resolve(&snapshot, &mut Vec::new());
        assert_eq!(agg.unit_count, dec!(3));
        assert_eq!(agg.unit_square_feet, dec!(2400));
        assert_eq!(agg.common_area_sf, dec!(600));
        assert_eq!(agg.rental_income_annual, dec!(42000));
    }

    #[test]
    fn test_taxes_row_matched_loosely_and_may_use_egi() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.units = vec![unit(Some(dec!(1000)))];
        snapshot.model_parameters = [("Vacancy", dec!(0))].into_iter().collect();
        snapshot.operating_expenses = vec![
            opex("t", "  property taxes ", FactorKind::PercentOfEGI, dec!(10)),
            opex("i", "Insurance", FactorKind::Total, dec!(4200)),
        ];
        let agg = AggregateResolver::new().resolve(&snapshot, &mut Vec::new());
        assert_eq!(agg.egi, dec!(12000));
        assert_eq!(agg.property_taxes_annual, dec!(1200));
        assert_eq!(agg.insurance_annual, dec!(4200));
    }

    #[test]
    fn test_missing_inputs_warn_only_when_referenced() {
        let mut snapshot = UnderwritingSnapshot::default();
        let mut warnings = Vec::new();
        AggregateResolver::new().resolve(&snapshot, &mut warnings);
        assert!(warnings.is_empty());

        let mut row = LineItem::new("c", "Lender Fee", Category::ClosingCosts)
            .with_factor(FactorKind::PercentOfAcquisitionLoan);
        row.cost_per = dec!(1);
        snapshot.expenses.push(row);
        snapshot.expenses.push(
            LineItem::new("d", "Tax Escrow", Category::Reserves)
                .with_factor(FactorKind::PercentOfPropertyTaxes),
        );
        let agg = AggregateResolver::new().resolve(&snapshot, &mut warnings);
        assert_eq!(agg.acquisition_loan, Decimal::ZERO);
        assert_eq!(agg.property_taxes_annual, Decimal::ZERO);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("AQ: Max Acquisition Loan at Closing"));
        assert!(warnings[1].contains("Property Taxes"));
    }

    struct FlatEgi(Decimal);

    impl EgiFormula for FlatEgi {
        fn egi(&self, _inputs: &EgiInputs<'_>) -> Option<Money> {
            Some(self.0)
        }
    }

    #[test]
    fn test_injected_formula() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.model_parameters = ModelLookup::new();
        snapshot.operating_expenses =
            vec![opex("m", "Management", FactorKind::PercentOfEGI, dec!(3))];
        let agg = AggregateResolver::with_formula(FlatEgi(dec!(500000)))
            .resolve(&snapshot, &mut Vec::new());
        assert_eq!(agg.egi, dec!(500000));
    }

    #[test]
    fn test_overflowing_sums_resolve_to_zero_with_warning() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.units = vec![unit(Some(Decimal::MAX)), unit(Some(dec!(1000)))];
        let mut warnings = Vec::new();
        let agg = AggregateResolver::new().resolve(&snapshot, &mut warnings);
        assert_eq!(agg.rental_income_annual, Decimal::ZERO);
        assert_eq!(agg.unit_square_feet, dec!(1600));
        assert_eq!(warnings, vec!["Rental income is out of range; resolved as 0".to_string()]);
    }

    #[test]
    fn test_resolve_aggregates_envelope() {
        let out = resolve_aggregates(&UnderwritingSnapshot::default());
        assert_eq!(out.result, Aggregates::default());
        assert!(out.warnings.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
