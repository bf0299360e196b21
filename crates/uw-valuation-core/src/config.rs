use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::RecoveryBasis;
use crate::types::Percent;

/// Names the resolver matches on and the defaults it falls back to.
///
/// Every field has a default, so a snapshot may carry a partial `config`
/// object (or none at all) and still resolve exactly as the grids do.
/// Keys and row names are compared trimmed and case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model parameter holding the purchase price
    pub acquisition_price_key: String,
    /// Model variable holding the loan balance at closing
    pub acquisition_loan_key: String,
    /// Model parameter holding the building's gross square feet
    pub gross_square_feet_key: String,
    pub vacancy_key: String,
    pub annual_turnover_key: String,
    pub bad_debt_key: String,
    pub less_vacancy_and_bad_debt_key: String,
    pub free_months_rent_key: String,
    pub broker_fee_key: String,
    /// Operating expense row whose annual value is the property-tax total
    pub property_taxes_row: String,
    /// Operating expense row whose annual value is the insurance total
    pub insurance_row: String,
    pub default_vacancy_pct: Percent,
    pub default_annual_turnover_pct: Percent,
    /// How the recovery table pools retail expenses
    pub recovery_basis: RecoveryBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            acquisition_price_key: "Acquisition Price".into(),
            acquisition_loan_key: "AQ: Max Acquisition Loan at Closing".into(),
            gross_square_feet_key: "Gross Square Feet".into(),
            vacancy_key: "Vacancy".into(),
            annual_turnover_key: "Annual Turnover".into(),
            bad_debt_key: "Bad Debt".into(),
            less_vacancy_and_bad_debt_key: "Less: Vacancy and Bad Debt".into(),
            free_months_rent_key: "Free Month's Rent".into(),
            broker_fee_key: "Broker Fee".into(),
            property_taxes_row: "Property Taxes".into(),
            insurance_row: "Insurance".into(),
            default_vacancy_pct: dec!(5),
            default_annual_turnover_pct: dec!(20),
            recovery_basis: RecoveryBasis::ByRentType,
        }
    }
}

/// Trimmed, case-insensitive comparison used for every key and row name.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"property_taxes_row": "Real Estate Taxes"}"#).unwrap();
        assert_eq!(cfg.property_taxes_row, "Real Estate Taxes");
        assert_eq!(cfg.insurance_row, "Insurance");
        assert_eq!(cfg.default_vacancy_pct, dec!(5));
        assert_eq!(cfg.default_annual_turnover_pct, dec!(20));
    }

    #[test]
    fn test_names_match_trims_and_ignores_case() {
        assert!(names_match("  property taxes ", "Property Taxes"));
        assert!(!names_match("Property Tax", "Property Taxes"));
    }
}
