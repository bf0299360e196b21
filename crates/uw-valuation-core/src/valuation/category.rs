use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregates::AggregateResolver;
use super::checked_sum;
use super::evaluator::{LineItemEvaluator, LineItemValuation};
use super::income::{
    derive_amenity, derive_retail_income, AmenityValuation, RetailIncomeValuation,
};
use crate::model::{
    AmenityIncomeRow, Category, LineItem, RetailIncomeRow, UnderwritingSnapshot,
};
use crate::types::{with_metadata, ComputationOutput, Money, SquareFeet};

// ---------------------------------------------------------------------------
// Footers
// ---------------------------------------------------------------------------

/// Footer of one line-item table plus the rows it sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub category: Category,
    /// e.g. "Total Closing Costs"
    pub label: String,
    pub total_monthly: Money,
    pub total_annual: Money,
    pub rows: Vec<LineItemValuation>,
    /// A footer sum overflowed and is shown as zero
    #[serde(default)]
    pub overflowed: bool,
}

/// One footer per category present, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub categories: Vec<CategoryTotals>,
    pub grand_total_monthly: Money,
    pub grand_total_annual: Money,
    #[serde(default)]
    pub overflowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityTotals {
    pub rows: Vec<AmenityValuation>,
    pub total_usage: Decimal,
    pub total_monthly: Money,
    pub total_annual: Money,
    #[serde(default)]
    pub overflowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailIncomeTotals {
    pub rows: Vec<RetailIncomeValuation>,
    pub total_square_feet: SquareFeet,
    pub total_monthly_rent: Money,
    pub total_annual_rent: Money,
    /// Residential unit SF plus retail SF
    pub combined_square_feet: SquareFeet,
    /// Combined SF is larger than the model's gross SF. Never set when gross
    /// SF is unknown.
    pub exceeds_gross_square_feet: bool,
    #[serde(default)]
    pub overflowed: bool,
}

/// Checked footer sum. Zero, with `overflowed` raised, when out of range.
fn footer_sum<I>(values: I, overflowed: &mut bool) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    checked_sum(values).unwrap_or_else(|| {
        *overflowed = true;
        Decimal::ZERO
    })
}

/// Warning for a footer whose sum overflowed.
pub(crate) fn footer_warning(label: &str, overflowed: bool) -> Option<String> {
    overflowed.then(|| format!("{label}: footer total is out of range; shown as 0"))
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Sums evaluator output by category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryAggregator<'a> {
    evaluator: &'a LineItemEvaluator<'a>,
}

impl<'a> CategoryAggregator<'a> {
    pub fn new(evaluator: &'a LineItemEvaluator<'a>) -> Self {
        CategoryAggregator { evaluator }
    }

    /// Footer for the rows of `items` in `category`. Other rows are ignored
    /// for both the sum and every percent-of-other base.
    pub fn totals(&self, items: &[LineItem], category: Category) -> CategoryTotals {
        let rows: Vec<LineItemValuation> = items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| self.evaluator.evaluate(i, items))
            .collect();
        let mut overflowed = false;
        CategoryTotals {
            category,
            label: format!("Total {}", category.label()),
            total_monthly: footer_sum(rows.iter().map(|r| r.monthly), &mut overflowed),
            total_annual: footer_sum(rows.iter().map(|r| r.annual), &mut overflowed),
            rows,
            overflowed,
        }
    }

    /// Footers for every category in a mixed collection, plus a grand total.
    pub fn summarize(&self, items: &[LineItem]) -> CollectionSummary {
        let mut order: Vec<Category> = Vec::new();
        for item in items {
            if !order.contains(&item.category) {
                order.push(item.category);
            }
        }
        let categories: Vec<CategoryTotals> =
            order.into_iter().map(|c| self.totals(items, c)).collect();
        let mut overflowed = false;
        CollectionSummary {
            grand_total_monthly: footer_sum(
                categories.iter().map(|c| c.total_monthly),
                &mut overflowed,
            ),
            grand_total_annual: footer_sum(
                categories.iter().map(|c| c.total_annual),
                &mut overflowed,
            ),
            categories,
            overflowed,
        }
    }
}

pub fn amenity_totals(rows: &[AmenityIncomeRow]) -> AmenityTotals {
    let rows: Vec<AmenityValuation> = rows.iter().map(derive_amenity).collect();
    let mut overflowed = false;
    AmenityTotals {
        total_usage: footer_sum(rows.iter().map(|r| r.usage), &mut overflowed),
        total_monthly: footer_sum(rows.iter().map(|r| r.monthly), &mut overflowed),
        total_annual: footer_sum(rows.iter().map(|r| r.annual), &mut overflowed),
        rows,
        overflowed,
    }
}

/// Retail income footer. `gross_square_feet` is `None` when the model has no
/// gross SF parameter.
pub fn retail_income_totals(
    rows: &[RetailIncomeRow],
    unit_square_feet: SquareFeet,
    gross_square_feet: Option<SquareFeet>,
) -> RetailIncomeTotals {
    let mut overflowed = false;
    let total_square_feet = footer_sum(rows.iter().map(|r| r.square_feet), &mut overflowed);
    let rows: Vec<RetailIncomeValuation> = rows.iter().map(derive_retail_income).collect();
    let combined_square_feet = footer_sum([unit_square_feet, total_square_feet], &mut overflowed);
    RetailIncomeTotals {
        total_square_feet,
        total_monthly_rent: footer_sum(rows.iter().map(|r| r.monthly_rent), &mut overflowed),
        total_annual_rent: footer_sum(rows.iter().map(|r| r.annual_rent), &mut overflowed),
        combined_square_feet,
        exceeds_gross_square_feet: gross_square_feet.is_some_and(|g| combined_square_feet > g),
        rows,
        overflowed,
    }
}

/// Rows and footer of one category's table within a snapshot.
pub fn evaluate_category(
    snapshot: &UnderwritingSnapshot,
    category: Category,
) -> ComputationOutput<CategoryTotals> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let aggregates = AggregateResolver::new().resolve(snapshot, &mut warnings);
    let evaluator = LineItemEvaluator::new(&aggregates);
    let items = match category {
        Category::OperatingExpense => &snapshot.operating_expenses,
        Category::Retail => &snapshot.retail_expenses,
        _ => &snapshot.expenses,
    };
    if matches!(category, Category::AmenityIncome | Category::RetailIncome) {
        warnings.push(format!(
            "{} rows are not line items; use the full valuation for their totals",
            category.label()
        ));
    }
    let totals = CategoryAggregator::new(&evaluator).totals(items, category);
    for row in &totals.rows {
        if let Some(w) = super::model::status_warning(row) {
            warnings.push(w);
        }
    }
    warnings.extend(footer_warning(&totals.label, totals.overflowed));

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        &format!("{} evaluated row by row and summed", category.label()),
        &category,
        warnings,
        elapsed,
        totals,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactorKind;
    use crate::valuation::aggregates::Aggregates;
    use rust_decimal_macros::dec;

    fn total(id: &str, category: Category, cost: Decimal) -> LineItem {
        LineItem {
            cost_per: cost,
            ..LineItem::new(id, format!("Row {id}"), category)
        }
    }

    #[test]
    fn test_totals_filter_by_category() {
        let agg = Aggregates::default();
        let eval = LineItemEvaluator::new(&agg);
        let items = vec![
            total("a", Category::ClosingCosts, dec!(1000)),
            total("b", Category::HardCosts, dec!(50000)),
            total("c", Category::ClosingCosts, dec!(500)),
        ];
        let t = CategoryAggregator::new(&eval).totals(&items, Category::ClosingCosts);
        assert_eq!(t.label, "Total Closing Costs");
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.total_annual, dec!(1500));
        assert_eq!(t.total_monthly, dec!(125));
    }

    #[test]
    fn test_summarize_keeps_first_appearance_order() {
        let agg = Aggregates::default();
        let eval = LineItemEvaluator::new(&agg);
        let mut pct = total("d", Category::Reserves, dec!(10));
        pct.factor = FactorKind::PercentOfOtherExpenses;
        let items = vec![
            total("a", Category::HardCosts, dec!(12000)),
            total("b", Category::Reserves, dec!(2400)),
            total("c", Category::HardCosts, dec!(6000)),
            pct,
        ];
        let s = CategoryAggregator::new(&eval).summarize(&items);
        let order: Vec<Category> = s.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, vec![Category::HardCosts, Category::Reserves]);
        assert_eq!(s.categories[1].total_annual, dec!(2640));
        assert_eq!(s.grand_total_annual, dec!(20640));
        assert_eq!(s.grand_total_monthly, dec!(1720));
    }

    #[test]
    fn test_empty_collection() {
        let agg = Aggregates::default();
        let eval = LineItemEvaluator::new(&agg);
        let t = CategoryAggregator::new(&eval).totals(&[], Category::Reserves);
        assert_eq!(t.total_annual, Decimal::ZERO);
        assert!(t.rows.is_empty());
    }

    #[test]
    fn test_amenity_totals() {
        let parking = AmenityIncomeRow {
            utilization: dec!(50),
            unit_count: dec!(10),
            monthly_fee: dec!(100),
            ..AmenityIncomeRow::new("p", "Parking")
        };
        let storage = AmenityIncomeRow {
            utilization: dec!(100),
            unit_count: dec!(4),
            monthly_fee: dec!(50),
            ..AmenityIncomeRow::new("s", "Storage")
        };
        let t = amenity_totals(&[parking, storage]);
        assert_eq!(t.total_usage, dec!(9));
        assert_eq!(t.total_monthly, dec!(700));
        assert_eq!(t.total_annual, dec!(8400));
    }

    #[test]
    fn test_retail_income_exceeds_gross() {
        let mut row = RetailIncomeRow::new("r");
        row.square_feet = dec!(5000);
        row.rent_per_square_foot_per_year = dec!(24);
        let rows = vec![row];
        let t = retail_income_totals(&rows, dec!(40000), Some(dec!(44000)));
        assert_eq!(t.combined_square_feet, dec!(45000));
        assert!(t.exceeds_gross_square_feet);
        assert_eq!(t.total_annual_rent, dec!(120000));
        assert_eq!(t.total_monthly_rent, dec!(10000));

        assert!(!retail_income_totals(&rows, dec!(40000), None).exceeds_gross_square_feet);
        assert!(!retail_income_totals(&rows, dec!(40000), Some(dec!(45000))).exceeds_gross_square_feet);
    }

    #[test]
    fn test_footer_overflow_shows_zero() {
        let agg = Aggregates::default();
        let eval = LineItemEvaluator::new(&agg);
        let items = vec![
            total("a", Category::HardCosts, Decimal::MAX),
            total("b", Category::HardCosts, Decimal::MAX),
            total("c", Category::Reserves, dec!(1200)),
        ];
        let s = CategoryAggregator::new(&eval).summarize(&items);
        let hard = &s.categories[0];
        assert!(hard.overflowed);
        assert_eq!(hard.total_annual, Decimal::ZERO);
        assert_eq!(hard.rows[0].annual, Decimal::MAX);
        assert!(!s.categories[1].overflowed);
        // Grand totals only see the footers, and the overflowed one is zero.
        assert!(!s.overflowed);
        assert_eq!(s.grand_total_annual, dec!(1200));
        assert_eq!(
            footer_warning(&hard.label, hard.overflowed).as_deref(),
            Some("Total Hard Costs: footer total is out of range; shown as 0")
        );
    }

    #[test]
    fn test_evaluate_category_picks_collection() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.operating_expenses =
            vec![total("i", Category::OperatingExpense, dec!(0)).with_factor(FactorKind::Total)];
        snapshot.operating_expenses[0].cost_per = dec!(6000);
        let out = evaluate_category(&snapshot, Category::OperatingExpense);
        assert_eq!(out.result.total_annual, dec!(6000));
        assert_eq!(out.result.total_monthly, dec!(500));
        assert!(out.warnings.is_empty());
    }
}
