use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::line_item::RentType;
use crate::lenient;
use crate::types::{Money, Percent, SquareFeet};

/// A residential unit, as far as the engine needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub square_feet: SquareFeet,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rent_per_square_foot_per_year: Money,
    /// Monthly in-place rent; `None` for vacant or not-yet-entered units
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub current_rent: Option<Money>,
}

/// Amenity income row (parking, storage, pet fees, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmenityIncomeRow {
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::month")]
    pub start_month: i32,
    /// Percent of available units in use, 0-100
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub utilization: Percent,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_count: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub monthly_fee: Money,
}

impl AmenityIncomeRow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> AmenityIncomeRow {
        AmenityIncomeRow {
            id: id.into(),
            name: name.into(),
            start_month: 0,
            utilization: Decimal::ZERO,
            unit_count: Decimal::ZERO,
            monthly_fee: Decimal::ZERO,
        }
    }

    /// Utilization is clamped here, when it is edited, and nowhere else.
    pub fn with_utilization(&self, utilization: Percent) -> AmenityIncomeRow {
        AmenityIncomeRow {
            utilization: utilization.clamp(Decimal::ZERO, dec!(100)),
            ..self.clone()
        }
    }
}

/// A retail tenant's lease line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetailIncomeRow {
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub suite: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub tenant_name: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub square_feet: SquareFeet,
    #[serde(default, deserialize_with = "lenient::month")]
    pub lease_start_month: i32,
    #[serde(default, deserialize_with = "lenient::month")]
    pub lease_end_month: i32,
    #[serde(default, deserialize_with = "lenient::month")]
    pub rent_start_month: i32,
    #[serde(default, alias = "annual_bumps", deserialize_with = "lenient::decimal")]
    pub annual_bumps_pct: Percent,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rent_per_square_foot_per_year: Money,
    #[serde(default)]
    pub rent_type: RentType,
    #[serde(default, deserialize_with = "lenient::month")]
    pub recovery_start_month: i32,
}

impl RetailIncomeRow {
    /// Blank Gross-lease row with every numeric field zero.
    pub fn new(id: impl Into<String>) -> RetailIncomeRow {
        RetailIncomeRow {
            id: id.into(),
            suite: String::new(),
            tenant_name: String::new(),
            square_feet: Decimal::ZERO,
            lease_start_month: 0,
            lease_end_month: 0,
            rent_start_month: 0,
            annual_bumps_pct: Decimal::ZERO,
            rent_per_square_foot_per_year: Decimal::ZERO,
            rent_type: RentType::Gross,
            recovery_start_month: 0,
        }
    }
}
