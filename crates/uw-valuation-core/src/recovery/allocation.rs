use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::model::{
    Category, LineItem, RecoveryBasis, RentType, RentTypeIncluded, RetailIncomeRow,
    UnderwritingSnapshot,
};
use crate::types::{with_metadata, ComputationOutput, Money, SquareFeet};
use crate::valuation::aggregates::Aggregates;
use crate::valuation::evaluator::LineItemEvaluator;
use crate::valuation::{checked_sum, ratio_or_zero};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecovery {
    pub id: String,
    pub suite: String,
    pub tenant_name: String,
    pub rent_type: RentType,
    pub square_feet: SquareFeet,
    pub recovery_start_month: i32,
    /// Tenant SF over total retail SF, as a fraction
    pub pro_rata_share: Decimal,
    pub recovery_per_sf_per_year: Money,
    pub annual_recovery: Money,
}

/// Recoverable annual retail expenses by lease type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPools {
    pub gross: Money,
    pub nnn: Money,
}

impl RecoveryPools {
    pub fn for_rent_type(&self, rent_type: RentType) -> Money {
        match rent_type {
            RentType::Gross => self.gross,
            RentType::Nnn => self.nnn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryAllocation {
    pub basis: RecoveryBasis,
    pub tenants: Vec<TenantRecovery>,
    pub pools: RecoveryPools,
    pub total_square_feet: SquareFeet,
    pub total_annual_recovery: Money,
    /// Footer figure: total recovery over total tenant SF
    pub average_recovery_per_sf_per_year: Money,
    /// A pool, share or total overflowed; each such figure is zero
    #[serde(default)]
    pub overflowed: bool,
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

fn recoverable(expense: &LineItem, rent_type: RentType, basis: RecoveryBasis) -> bool {
    match basis {
        RecoveryBasis::Pooled => true,
        RecoveryBasis::ByRentType => expense
            .rent_type_included
            .unwrap_or(RentTypeIncluded::Neither)
            .includes(rent_type),
    }
}

/// Split recoverable retail expenses across tenants pro rata by square
/// feet. Only `Retail` rows of `retail_expenses` are considered.
pub fn allocate(
    retail_income: &[RetailIncomeRow],
    retail_expenses: &[LineItem],
    basis: RecoveryBasis,
) -> RecoveryAllocation {
    let aggregates = Aggregates::from_retail(retail_income);
    let evaluator = LineItemEvaluator::new(&aggregates);
    let total_retail_sf = aggregates.total_retail_sf;

    let annuals: Vec<(&LineItem, Money)> = retail_expenses
        .iter()
        .filter(|e| e.category == Category::Retail)
        .map(|e| (e, evaluator.annual(e, retail_expenses)))
        .collect();
    let mut overflowed = false;
    let mut in_range = |value: Option<Money>| {
        value.unwrap_or_else(|| {
            overflowed = true;
            Decimal::ZERO
        })
    };
    let pool = |rent_type: RentType| {
        checked_sum(
            annuals
                .iter()
                .filter(|(e, _)| recoverable(e, rent_type, basis))
                .map(|(_, annual)| *annual),
        )
    };
    let pools = RecoveryPools {
        gross: in_range(pool(RentType::Gross)),
        nnn: in_range(pool(RentType::Nnn)),
    };

    let tenants: Vec<TenantRecovery> = retail_income
        .iter()
        .map(|row| {
            let pro_rata_share = ratio_or_zero(row.square_feet, total_retail_sf);
            let annual_recovery =
                in_range(pro_rata_share.checked_mul(pools.for_rent_type(row.rent_type)));
            TenantRecovery {
                id: row.id.clone(),
                suite: row.suite.clone(),
                tenant_name: row.tenant_name.clone(),
                rent_type: row.rent_type,
                square_feet: row.square_feet,
                recovery_start_month: row.recovery_start_month,
                pro_rata_share,
                recovery_per_sf_per_year: ratio_or_zero(annual_recovery, row.square_feet),
                annual_recovery,
            }
        })
        .collect();

    let total_square_feet: SquareFeet =
        in_range(checked_sum(tenants.iter().map(|t| t.square_feet)));
    let total_annual_recovery: Money =
        in_range(checked_sum(tenants.iter().map(|t| t.annual_recovery)));
    RecoveryAllocation {
        basis,
        average_recovery_per_sf_per_year: ratio_or_zero(total_annual_recovery, total_square_feet),
        tenants,
        pools,
        total_square_feet,
        total_annual_recovery,
        overflowed,
    }
}

pub(crate) const OVERFLOW_WARNING: &str =
    "Recovery figures are out of range; the affected pools and totals are shown as 0";

/// Recovery table for a snapshot, pooled per `config.recovery_basis`.
pub fn allocate_recoveries(snapshot: &UnderwritingSnapshot) -> ComputationOutput<RecoveryAllocation> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let basis = snapshot.config.recovery_basis;

    if basis == RecoveryBasis::ByRentType {
        let unset = snapshot
            .retail_expenses
            .iter()
            .filter(|e| e.category == Category::Retail && e.rent_type_included.is_none())
            .count();
        if unset > 0 {
            warnings.push(format!(
                "{unset} retail expense row(s) have no rent type included; not recoverable"
            ));
        }
    }

    let allocation = allocate(&snapshot.retail_income, &snapshot.retail_expenses, basis);
    if allocation.overflowed {
        warnings.push(OVERFLOW_WARNING.to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Pro rata recovery by square feet",
        &basis,
        warnings,
        elapsed,
        allocation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactorKind;
    use rust_decimal_macros::dec;

    fn tenant(id: &str, sf: Decimal, rent_type: RentType) -> RetailIncomeRow {
        RetailIncomeRow {
            square_feet: sf,
            rent_per_square_foot_per_year: dec!(20),
            rent_type,
            ..RetailIncomeRow::new(id)
        }
    }

    fn expense(
        id: &str,
        factor: FactorKind,
        cost: Decimal,
        included: Option<RentTypeIncluded>,
    ) -> LineItem {
        LineItem {
            factor,
            cost_per: cost,
            rent_type_included: included,
            ..LineItem::new(id, "", Category::Retail)
        }
    }

    #[test]
    fn test_split_by_rent_type() {
        let tenants = vec![
            tenant("a", dec!(1000), RentType::Gross),
            tenant("b", dec!(3000), RentType::Nnn),
        ];
        let expenses = vec![
            expense("cam", FactorKind::PerSFPerYear, dec!(2), Some(RentTypeIncluded::Both)),
            expense("tax", FactorKind::Annual, dec!(4000), Some(RentTypeIncluded::Nnn)),
            expense("mgmt", FactorKind::PercentOfBaseRent, dec!(5), Some(RentTypeIncluded::Gross)),
        ];
        let a = allocate(&tenants, &expenses, RecoveryBasis::ByRentType);
        // cam 8000, tax 4000, mgmt 5% of 80000 = 4000
        assert_eq!(a.pools.gross, dec!(12000));
        assert_eq!(a.pools.nnn, dec!(12000));
        assert_eq!(a.tenants[0].pro_rata_share, dec!(0.25));
        assert_eq!(a.tenants[0].annual_recovery, dec!(3000));
        assert_eq!(a.tenants[1].annual_recovery, dec!(9000));
        assert_eq!(a.tenants[1].recovery_per_sf_per_year, dec!(3));
        assert_eq!(a.total_annual_recovery, dec!(12000));
        assert_eq!(a.average_recovery_per_sf_per_year, dec!(3));
    }

    #[test]
    fn test_unset_included_is_not_recoverable_by_rent_type() {
        let tenants = vec![tenant("a", dec!(1000), RentType::Gross)];
        let expenses = vec![expense("x", FactorKind::Annual, dec!(500), None)];
        let by_type = allocate(&tenants, &expenses, RecoveryBasis::ByRentType);
        assert_eq!(by_type.total_annual_recovery, Decimal::ZERO);

        let pooled = allocate(&tenants, &expenses, RecoveryBasis::Pooled);
        assert_eq!(pooled.total_annual_recovery, dec!(500));
    }

    #[test]
    fn test_zero_square_feet_guards() {
        let tenants = vec![tenant("a", Decimal::ZERO, RentType::Gross)];
        let expenses = vec![expense("x", FactorKind::Annual, dec!(500), Some(RentTypeIncluded::Both))];
        let a = allocate(&tenants, &expenses, RecoveryBasis::ByRentType);
        assert_eq!(a.tenants[0].pro_rata_share, Decimal::ZERO);
        assert_eq!(a.tenants[0].recovery_per_sf_per_year, Decimal::ZERO);
        assert_eq!(a.average_recovery_per_sf_per_year, Decimal::ZERO);
    }

    #[test]
    fn test_neither_excluded_even_from_gross() {
        let tenants = vec![tenant("a", dec!(500), RentType::Gross)];
        let expenses = vec![expense("x", FactorKind::Annual, dec!(900), Some(RentTypeIncluded::Neither))];
        let a = allocate(&tenants, &expenses, RecoveryBasis::ByRentType);
        assert_eq!(a.pools, RecoveryPools::default());
    }

    #[test]
    fn test_allocate_recoveries_warns_on_unset_rows() {
        let mut snapshot = UnderwritingSnapshot::default();
        snapshot.retail_income.push(tenant("a", dec!(1000), RentType::Gross));
        snapshot
            .retail_expenses
            .push(expense("x", FactorKind::Annual, dec!(100), None));
        let out = allocate_recoveries(&snapshot);
        assert_eq!(out.result.basis, RecoveryBasis::ByRentType);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_pool_overflow_zeroes_pool() {
        let tenants = vec![
            tenant("a", dec!(1000), RentType::Gross),
            tenant("b", dec!(1000), RentType::Nnn),
        ];
        let expenses = vec![
            expense("x", FactorKind::Annual, Decimal::MAX, Some(RentTypeIncluded::Nnn)),
            expense("y", FactorKind::Annual, Decimal::MAX, Some(RentTypeIncluded::Nnn)),
            expense("z", FactorKind::Annual, dec!(800), Some(RentTypeIncluded::Gross)),
        ];
        let a = allocate(&tenants, &expenses, RecoveryBasis::ByRentType);
        assert!(a.overflowed);
        assert_eq!(a.pools.nnn, Decimal::ZERO);
        assert_eq!(a.pools.gross, dec!(800));
        assert_eq!(a.tenants[0].annual_recovery, dec!(400));
        assert_eq!(a.total_annual_recovery, dec!(400));
    }
}
