use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::evaluator::EvaluationStatus;
use super::{checked_percent, round_cents, round_whole};
use crate::model::{AmenityIncomeRow, RetailIncomeRow};
use crate::types::Money;

/// Derived columns of an amenity income row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityValuation {
    pub id: String,
    pub name: String,
    /// Units in use, rounded to a whole number
    pub usage: Decimal,
    pub monthly: Money,
    pub annual: Money,
    pub status: EvaluationStatus,
}

/// Derived columns of a retail income row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailIncomeValuation {
    pub id: String,
    pub suite: String,
    pub tenant_name: String,
    pub annual_rent: Money,
    pub monthly_rent: Money,
    pub status: EvaluationStatus,
}

/// `usage = round(utilization% * unit_count)`, `monthly = usage * fee`,
/// `annual = monthly * 12`. Utilization is used as stored. Every figure is
/// zero when one of them overflows.
pub fn derive_amenity(row: &AmenityIncomeRow) -> AmenityValuation {
    let figures = || -> Option<(Decimal, Money, Money)> {
        let usage = round_whole(checked_percent(row.utilization, row.unit_count)?);
        let monthly = usage.checked_mul(row.monthly_fee)?;
        Some((usage, monthly, monthly.checked_mul(dec!(12))?))
    };
    let ((usage, monthly, annual), status) = match figures() {
        Some(f) => (f, EvaluationStatus::Evaluated),
        None => (
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            EvaluationStatus::Overflow,
        ),
    };
    AmenityValuation {
        id: row.id.clone(),
        name: row.name.clone(),
        usage,
        monthly,
        annual,
        status,
    }
}

pub fn derive_retail_income(row: &RetailIncomeRow) -> RetailIncomeValuation {
    let (annual_rent, status) = match row
        .rent_per_square_foot_per_year
        .checked_mul(row.square_feet)
    {
        Some(rent) => (rent, EvaluationStatus::Evaluated),
        None => (Decimal::ZERO, EvaluationStatus::Overflow),
    };
    RetailIncomeValuation {
        id: row.id.clone(),
        suite: row.suite.clone(),
        tenant_name: row.tenant_name.clone(),
        annual_rent,
        monthly_rent: round_cents(annual_rent / dec!(12)),
        status,
    }
}
