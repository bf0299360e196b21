use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregates::Aggregates;
use super::{checked_percent, checked_sum, round_cents};
use crate::model::{Category, FactorKind, LineItem};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Why a row evaluated the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Evaluated,
    /// The factor label is not one of the known kinds; the row is zero.
    UnrecognizedFactor,
    /// A known kind that the row's table does not offer; the row is zero.
    FactorNotValidForCategory,
    /// The product or sum behind the row left the decimal range; the row is
    /// zero.
    Overflow,
}

/// Display decoration for the `cost_per` and `statistic` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adornment {
    pub cost_prefix: String,
    pub cost_suffix: String,
    pub statistic_prefix: String,
    pub statistic_suffix: String,
}

/// Which cells of a row the grid lets the user type into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableFields {
    pub name: bool,
    pub factor: bool,
    pub cost_per: bool,
    pub statistic: bool,
    pub start_month: bool,
    pub end_month: bool,
}

/// Grid columns, stored and computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Factor,
    CostPer,
    Statistic,
    StartMonth,
    EndMonth,
    Usage,
    Monthly,
    Annual,
}

/// Derived figures for one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemValuation {
    pub id: String,
    /// Display name ("Untitled" when blank)
    pub name: String,
    pub category: Category,
    pub factor: FactorKind,
    /// Annual amount spread over the active months, rounded to cents
    pub monthly: Money,
    /// Unrounded annual amount
    pub annual: Money,
    /// The multiplier or base the grid shows in the statistic column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<Decimal>,
    pub adornment: Adornment,
    pub editable: EditableFields,
    pub status: EvaluationStatus,
}

/// Annual figure plus the statistic it was computed from.
struct Derived {
    annual: Money,
    statistic: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Editability
// ---------------------------------------------------------------------------

/// Whether `field` of `item` accepts user input.
///
/// Computed columns never do. The statistic is only typed in when the row's
/// kind multiplies by a caller-supplied count; for every other kind it is
/// either unused or derived from an aggregate.
pub fn is_field_editable(field: Field, item: &LineItem) -> bool {
    match field {
        Field::Name | Field::Factor | Field::CostPer | Field::StartMonth | Field::EndMonth => true,
        Field::Statistic => {
            item.factor.uses_caller_statistic()
                && !(item.category == Category::OperatingExpense
                    && item.factor == FactorKind::PerUnit)
                && !(item.category == Category::Retail && item.factor == FactorKind::PerSF)
        }
        Field::Usage | Field::Monthly | Field::Annual => false,
    }
}

fn editable_fields(item: &LineItem) -> EditableFields {
    EditableFields {
        name: is_field_editable(Field::Name, item),
        factor: is_field_editable(Field::Factor, item),
        cost_per: is_field_editable(Field::CostPer, item),
        statistic: is_field_editable(Field::Statistic, item),
        start_month: is_field_editable(Field::StartMonth, item),
        end_month: is_field_editable(Field::EndMonth, item),
    }
}

fn adornment(item: &LineItem) -> Adornment {
    let (cost_prefix, cost_suffix) = if item.factor.is_percent() {
        ("", "%")
    } else {
        ("$", "")
    };
    let (statistic_prefix, statistic_suffix) = match item.factor {
        FactorKind::PerUnit => ("", " units"),
        FactorKind::PerSF
        | FactorKind::PerSFPerYear
        | FactorKind::PerCommonAreaSquareFoot
        | FactorKind::PerTotalSquareFoot => ("", " sf"),
        FactorKind::PerMonth => ("", " months"),
        ref k if k.is_percent() => ("$ ", ""),
        _ => ("", ""),
    };
    Adornment {
        cost_prefix: cost_prefix.into(),
        cost_suffix: cost_suffix.into(),
        statistic_prefix: statistic_prefix.into(),
        statistic_suffix: statistic_suffix.into(),
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Turns one line item into monthly and annual dollars against a resolved
/// set of aggregates. Holds no state of its own beyond the borrow.
#[derive(Debug, Clone, Copy)]
pub struct LineItemEvaluator<'a> {
    aggregates: &'a Aggregates,
}

impl<'a> LineItemEvaluator<'a> {
    pub fn new(aggregates: &'a Aggregates) -> Self {
        LineItemEvaluator { aggregates }
    }

    pub fn aggregates(&self) -> &'a Aggregates {
        self.aggregates
    }

    /// Evaluate `item`. `siblings` is the collection the item lives in; it
    /// is only consulted by percent-of-other-expenses rows.
    pub fn evaluate(&self, item: &LineItem, siblings: &[LineItem]) -> LineItemValuation {
        let (derived, status) = match self.derive(item, siblings) {
            Ok(d) => (d, EvaluationStatus::Evaluated),
            Err(status) => (
                Derived {
                    annual: Decimal::ZERO,
                    statistic: None,
                },
                status,
            ),
        };

        LineItemValuation {
            id: item.id.clone(),
            name: item.display_name().to_string(),
            category: item.category,
            factor: item.factor.clone(),
            monthly: round_cents(derived.annual / item.months_in_period()),
            annual: derived.annual,
            statistic: derived.statistic,
            adornment: adornment(item),
            editable: editable_fields(item),
            status,
        }
    }

    /// Annual amount only.
    pub fn annual(&self, item: &LineItem, siblings: &[LineItem]) -> Money {
        self.derive(item, siblings)
            .map(|d| d.annual)
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of the annual values of `item`'s same-category siblings, leaving
    /// out `item` itself and every percent-of-other-expenses row. `None`
    /// when the sum overflows.
    pub fn sibling_sum(&self, item: &LineItem, siblings: &[LineItem]) -> Option<Money> {
        checked_sum(
            siblings
                .iter()
                .filter(|s| {
                    s.category == item.category
                        && s.id != item.id
                        && s.factor != FactorKind::PercentOfOtherExpenses
                })
                // No remaining sibling can reach back into the collection,
                // so an empty slice is enough.
                .map(|s| self.annual(s, &[])),
        )
    }

    fn derive(&self, item: &LineItem, siblings: &[LineItem]) -> Result<Derived, EvaluationStatus> {
        if !item.factor.is_recognized() {
            return Err(EvaluationStatus::UnrecognizedFactor);
        }
        if !item.category.accepts(&item.factor) {
            return Err(EvaluationStatus::FactorNotValidForCategory);
        }

        let agg = self.aggregates;
        let cost = item.cost_per;
        let flat = || Derived {
            annual: cost,
            statistic: None,
        };
        let times = |statistic: Decimal| {
            cost.checked_mul(statistic).map(|annual| Derived {
                annual,
                statistic: Some(statistic),
            })
        };
        let percent_of = |base: Money| {
            checked_percent(cost, base).map(|annual| Derived {
                annual,
                statistic: Some(base),
            })
        };

        let derived = match &item.factor {
            FactorKind::Total | FactorKind::Annual => Some(flat()),
            FactorKind::PerUnit if item.category == Category::OperatingExpense => {
                times(agg.unit_count)
            }
            // The plain retail grid labels its per-SF-per-year rows "per SF".
            FactorKind::PerSF if item.category == Category::Retail => times(agg.total_retail_sf),
            FactorKind::PerUnit | FactorKind::PerSF | FactorKind::PerMonth => {
                times(item.statistic.unwrap_or(Decimal::ZERO))
            }
            FactorKind::PercentOfPurchasePrice => percent_of(agg.acquisition_price),
            FactorKind::PercentOfAcquisitionLoan => percent_of(agg.acquisition_loan),
            FactorKind::PercentOfPropertyTaxes => percent_of(agg.property_taxes_annual),
            FactorKind::PercentOfInsuranceCost => percent_of(agg.insurance_annual),
            FactorKind::PercentOfOtherExpenses => {
                self.sibling_sum(item, siblings).and_then(percent_of)
            }
            FactorKind::PercentOfEGI => percent_of(agg.egi),
            FactorKind::PerSFPerYear => times(agg.total_retail_sf),
            FactorKind::PercentOfBaseRent => percent_of(agg.base_rent_annual),
            FactorKind::PerCommonAreaSquareFoot => times(agg.common_area_sf),
            FactorKind::PerTotalSquareFoot => times(agg.gross_square_feet),
            FactorKind::Unrecognized(_) => return Err(EvaluationStatus::UnrecognizedFactor),
        };
        derived.ok_or(EvaluationStatus::Overflow)
    }
}
