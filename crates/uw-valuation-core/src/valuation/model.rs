use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::aggregates::{AggregateResolver, Aggregates};
use super::category::{
    amenity_totals, footer_warning, retail_income_totals, AmenityTotals, CategoryAggregator,
    CategoryTotals, CollectionSummary, RetailIncomeTotals,
};
use super::egi::EgiFormula;
use super::evaluator::{EvaluationStatus, LineItemEvaluator, LineItemValuation};
use crate::model::{Category, UnderwritingSnapshot};
use crate::types::{with_metadata, ComputationOutput};

#[cfg(feature = "recovery")]
use crate::recovery::{allocate, RecoveryAllocation};
#[cfg(feature = "recovery")]
use crate::recovery::allocation::OVERFLOW_WARNING;

/// Every derived figure for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelValuation {
    pub aggregates: Aggregates,
    /// One-time costs, one footer per category present
    pub expenses: CollectionSummary,
    pub operating_expenses: CategoryTotals,
    pub retail_expenses: CategoryTotals,
    pub amenity_income: AmenityTotals,
    pub retail_income: RetailIncomeTotals,
    #[cfg(feature = "recovery")]
    pub recovery: RecoveryAllocation,
}

/// A warning for rows that evaluated to zero because of their factor.
pub(crate) fn status_warning(row: &LineItemValuation) -> Option<String> {
    match row.status {
        EvaluationStatus::Evaluated => None,
        EvaluationStatus::UnrecognizedFactor => Some(format!(
            "{} '{}': unrecognized factor '{}'; valued at 0",
            row.category, row.name, row.factor
        )),
        EvaluationStatus::FactorNotValidForCategory => Some(format!(
            "{} '{}': factor '{}' does not apply to this table; valued at 0",
            row.category, row.name, row.factor
        )),
        EvaluationStatus::Overflow => Some(overflow_warning(row.category.label(), &row.name)),
    }
}

fn overflow_warning(table: &str, row: &str) -> String {
    format!("{table} '{row}': result is out of range; valued at 0")
}

/// Run the whole engine over a snapshot with the standard EGI formula.
pub fn value_model(snapshot: &UnderwritingSnapshot) -> ComputationOutput<ModelValuation> {
    value_model_with(&AggregateResolver::new(), snapshot)
}

/// [`value_model`] with a caller-supplied resolver (and so EGI formula).
pub fn value_model_with<F: EgiFormula>(
    resolver: &AggregateResolver<F>,
    snapshot: &UnderwritingSnapshot,
) -> ComputationOutput<ModelValuation> {
    let start = Instant::now();
    let mut warnings = snapshot.duplicate_id_warnings();

    let aggregates = resolver.resolve(snapshot, &mut warnings);
    let evaluator = LineItemEvaluator::new(&aggregates);
    let aggregator = CategoryAggregator::new(&evaluator);

    let expenses = aggregator.summarize(&snapshot.expenses);
    let operating_expenses =
        aggregator.totals(&snapshot.operating_expenses, Category::OperatingExpense);
    let retail_expenses = aggregator.totals(&snapshot.retail_expenses, Category::Retail);

    // Rows filed under another category never reach a footer.
    for (name, items, category) in [
        (
            "operating_expenses",
            &snapshot.operating_expenses,
            Category::OperatingExpense,
        ),
        ("retail_expenses", &snapshot.retail_expenses, Category::Retail),
    ] {
        let stray = items.iter().filter(|i| i.category != category).count();
        if stray > 0 {
            warnings.push(format!(
                "{stray} row(s) in {name} are not {}; excluded from totals",
                category.label()
            ));
        }
    }

    let all_rows = expenses
        .categories
        .iter()
        .flat_map(|c| c.rows.iter())
        .chain(&operating_expenses.rows)
        .chain(&retail_expenses.rows);
    warnings.extend(all_rows.filter_map(status_warning));
    warnings.extend(
        expenses
            .categories
            .iter()
            .chain([&operating_expenses, &retail_expenses])
            .filter_map(|c| footer_warning(&c.label, c.overflowed)),
    );
    warnings.extend(footer_warning("Grand total", expenses.overflowed));

    let amenity_income = amenity_totals(&snapshot.amenity_income);
    warnings.extend(
        amenity_income
            .rows
            .iter()
            .filter(|r| r.status == EvaluationStatus::Overflow)
            .map(|r| overflow_warning(Category::AmenityIncome.label(), &r.name)),
    );
    warnings.extend(footer_warning("Total Amenity Income", amenity_income.overflowed));
    let gross_square_feet = snapshot
        .model_parameters
        .get(&snapshot.config.gross_square_feet_key);
    let retail_income = retail_income_totals(
        &snapshot.retail_income,
        aggregates.unit_square_feet,
        gross_square_feet,
    );
    warnings.extend(
        retail_income
            .rows
            .iter()
            .filter(|r| r.status == EvaluationStatus::Overflow)
            .map(|r| overflow_warning(Category::RetailIncome.label(), &r.suite)),
    );
    warnings.extend(footer_warning("Total Retail Income", retail_income.overflowed));
    if retail_income.exceeds_gross_square_feet {
        warnings.push(format!(
            "Unit and retail square feet ({}) exceed gross square feet ({})",
            retail_income.combined_square_feet, aggregates.gross_square_feet
        ));
    }

    #[cfg(feature = "recovery")]
    let recovery = allocate(
        &snapshot.retail_income,
        &snapshot.retail_expenses,
        snapshot.config.recovery_basis,
    );
    #[cfg(feature = "recovery")]
    warnings.extend(recovery.overflowed.then(|| OVERFLOW_WARNING.to_string()));

    let valuation = ModelValuation {
        aggregates,
        expenses,
        operating_expenses,
        retail_expenses,
        amenity_income,
        retail_income,
        #[cfg(feature = "recovery")]
        recovery,
    };

    info!(
        "event=value_model module=valuation status=ok egi={} warnings={}",
        valuation.aggregates.egi,
        warnings.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Aggregates resolved, line items evaluated per category, footers summed",
        &snapshot.config,
        warnings,
        elapsed,
        valuation,
    )
}
