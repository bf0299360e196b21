use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::UnderwritingError;
use crate::lenient;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The table a line item belongs to. Aggregation always filters by category
/// first, and the category fixes which factor kinds are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(alias = "Closing Costs", alias = "closing_costs")]
    ClosingCosts,
    #[serde(
        alias = "Legal and Pre-Development Costs",
        alias = "legal_and_pre_development"
    )]
    LegalAndPreDevelopment,
    #[serde(alias = "reserves")]
    Reserves,
    #[serde(alias = "Hard Costs", alias = "hard_costs")]
    HardCosts,
    #[serde(alias = "Retail Expenses", alias = "retail")]
    Retail,
    #[serde(alias = "Operating Expenses", alias = "operating_expense")]
    OperatingExpense,
    #[serde(alias = "Amenity Income", alias = "amenity_income")]
    AmenityIncome,
    #[serde(alias = "Retail Income", alias = "retail_income")]
    RetailIncome,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ClosingCosts,
        Category::LegalAndPreDevelopment,
        Category::Reserves,
        Category::HardCosts,
        Category::Retail,
        Category::OperatingExpense,
        Category::AmenityIncome,
        Category::RetailIncome,
    ];

    /// Footer label, e.g. "Total Closing Costs".
    pub fn label(&self) -> &'static str {
        match self {
            Category::ClosingCosts => "Closing Costs",
            Category::LegalAndPreDevelopment => "Legal and Pre-Development Costs",
            Category::Reserves => "Reserves",
            Category::HardCosts => "Hard Costs",
            Category::Retail => "Retail Expenses",
            Category::OperatingExpense => "Operating Expenses",
            Category::AmenityIncome => "Amenity Income",
            Category::RetailIncome => "Retail Income",
        }
    }

    /// One-time cost tables (closing, legal, reserves, hard costs).
    pub fn is_one_time_expense(&self) -> bool {
        matches!(
            self,
            Category::ClosingCosts
                | Category::LegalAndPreDevelopment
                | Category::Reserves
                | Category::HardCosts
        )
    }

    /// Whether `kind` is a formula this category's table offers.
    pub fn accepts(&self, kind: &FactorKind) -> bool {
        use FactorKind::*;
        if self.is_one_time_expense() {
            return matches!(
                kind,
                Total
                    | PerUnit
                    | PerSF
                    | PerMonth
                    | PercentOfPurchasePrice
                    | PercentOfAcquisitionLoan
                    | PercentOfPropertyTaxes
                    | PercentOfInsuranceCost
                    | PercentOfOtherExpenses
            );
        }
        match self {
            Category::OperatingExpense => matches!(
                kind,
                Total | PerUnit | PerCommonAreaSquareFoot | PerTotalSquareFoot | PercentOfEGI
            ),
            Category::Retail => {
                matches!(kind, Annual | PerSF | PerSFPerYear | PercentOfBaseRent)
            }
            _ => false,
        }
    }

    /// Factor given to a freshly added row.
    pub fn default_factor(&self) -> FactorKind {
        match self {
            Category::OperatingExpense => FactorKind::PerUnit,
            Category::Retail => FactorKind::PerSFPerYear,
            _ => FactorKind::Total,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnderwritingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = squash(s);
        Category::ALL
            .into_iter()
            .find(|c| squash(c.label()) == wanted || squash(&format!("{c:?}")) == wanted)
            .or_else(|| match wanted.as_str() {
                "legalandpredevelopment" => Some(Category::LegalAndPreDevelopment),
                "operatingexpenses" => Some(Category::OperatingExpense),
                "retailexpense" | "retailexpenses" => Some(Category::Retail),
                _ => None,
            })
            .ok_or_else(|| UnderwritingError::InvalidInput {
                field: "category".into(),
                reason: format!("Unknown category '{s}'"),
            })
    }
}

// ---------------------------------------------------------------------------
// Factor kind
// ---------------------------------------------------------------------------

/// The formula selector on a line item. Closed set; anything the grids send
/// that is not recognised is kept verbatim in `Unrecognized` and evaluates
/// to zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactorKind {
    Total,
    PerUnit,
    PerSF,
    PerMonth,
    PercentOfPurchasePrice,
    PercentOfAcquisitionLoan,
    PercentOfPropertyTaxes,
    PercentOfInsuranceCost,
    PercentOfOtherExpenses,
    PercentOfEGI,
    Annual,
    PerSFPerYear,
    PercentOfBaseRent,
    PerCommonAreaSquareFoot,
    PerTotalSquareFoot,
    Unrecognized(String),
}

impl Default for FactorKind {
    fn default() -> Self {
        FactorKind::Unrecognized(String::new())
    }
}

impl FactorKind {
    pub const KNOWN: [FactorKind; 15] = [
        FactorKind::Total,
        FactorKind::PerUnit,
        FactorKind::PerSF,
        FactorKind::PerMonth,
        FactorKind::PercentOfPurchasePrice,
        FactorKind::PercentOfAcquisitionLoan,
        FactorKind::PercentOfPropertyTaxes,
        FactorKind::PercentOfInsuranceCost,
        FactorKind::PercentOfOtherExpenses,
        FactorKind::PercentOfEGI,
        FactorKind::Annual,
        FactorKind::PerSFPerYear,
        FactorKind::PercentOfBaseRent,
        FactorKind::PerCommonAreaSquareFoot,
        FactorKind::PerTotalSquareFoot,
    ];

    /// The label the grids store and display.
    pub fn label(&self) -> &str {
        match self {
            FactorKind::Total => "Total",
            FactorKind::PerUnit => "per Unit",
            FactorKind::PerSF => "per SF",
            FactorKind::PerMonth => "per Month",
            FactorKind::PercentOfPurchasePrice => "Percent of Purchase Price",
            FactorKind::PercentOfAcquisitionLoan => "Percent of Acquisition Loan",
            FactorKind::PercentOfPropertyTaxes => "Percent of Property Taxes",
            FactorKind::PercentOfInsuranceCost => "Percent of Insurance Cost",
            FactorKind::PercentOfOtherExpenses => "Total percent of other expenses",
            FactorKind::PercentOfEGI => "Percent of EGI",
            FactorKind::Annual => "Annual",
            FactorKind::PerSFPerYear => "per SF / Yr.",
            FactorKind::PercentOfBaseRent => "Percent of Base Rent",
            FactorKind::PerCommonAreaSquareFoot => "Per CA Square Foot",
            FactorKind::PerTotalSquareFoot => "Per Total Square Feet",
            FactorKind::Unrecognized(raw) => raw,
        }
    }

    /// Lenient parse: never fails, unknown labels become `Unrecognized`.
    pub fn from_label(label: &str) -> FactorKind {
        let key = squash(label);
        let known = FactorKind::KNOWN
            .into_iter()
            .find(|k| squash(k.label()) == key || squash(&format!("{k:?}")) == key);
        if let Some(kind) = known {
            return kind;
        }
        match key.as_str() {
            "persfperyr" | "persfyear" => FactorKind::PerSFPerYear,
            "percommonareasf" | "percasf" => FactorKind::PerCommonAreaSquareFoot,
            "pertotalsf" => FactorKind::PerTotalSquareFoot,
            _ => FactorKind::Unrecognized(label.to_string()),
        }
    }

    /// `costPer` is a percentage of some base rather than a dollar amount.
    pub fn is_percent(&self) -> bool {
        matches!(
            self,
            FactorKind::PercentOfPurchasePrice
                | FactorKind::PercentOfAcquisitionLoan
                | FactorKind::PercentOfPropertyTaxes
                | FactorKind::PercentOfInsuranceCost
                | FactorKind::PercentOfOtherExpenses
                | FactorKind::PercentOfEGI
                | FactorKind::PercentOfBaseRent
        )
    }

    /// The row's own `statistic` is the multiplier (unit count, SF, months).
    pub fn uses_caller_statistic(&self) -> bool {
        matches!(
            self,
            FactorKind::PerUnit | FactorKind::PerSF | FactorKind::PerMonth
        )
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FactorKind::Unrecognized(_))
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FactorKind {
    type Err = UnderwritingError;

    /// Strict parse for command-line flags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match FactorKind::from_label(s) {
            FactorKind::Unrecognized(_) => Err(UnderwritingError::InvalidInput {
                field: "factor".into(),
                reason: format!("Unknown factor kind '{s}'"),
            }),
            kind => Ok(kind),
        }
    }
}

impl Serialize for FactorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FactorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(FactorKind::from_label(raw.as_deref().unwrap_or("")))
    }
}

/// Lowercase and drop everything but letters and digits, so "per SF / Yr."
/// and "PerSFPerYr" compare equal.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Rent types
// ---------------------------------------------------------------------------

/// Lease rent type of a retail tenant. Anything other than NNN is Gross.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum RentType {
    #[default]
    Gross,
    #[serde(rename = "NNN")]
    Nnn,
}

impl RentType {
    pub fn from_label(label: &str) -> RentType {
        if label.trim().eq_ignore_ascii_case("nnn") {
            RentType::Nnn
        } else {
            RentType::Gross
        }
    }
}

impl<'de> Deserialize<'de> for RentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(RentType::from_label(raw.as_deref().unwrap_or("")))
    }
}

/// Which lease types may be billed for a retail expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentTypeIncluded {
    Both,
    Gross,
    #[serde(rename = "NNN")]
    Nnn,
    Neither,
}

impl RentTypeIncluded {
    pub fn from_label(label: &str) -> Option<RentTypeIncluded> {
        match label.trim().to_ascii_lowercase().as_str() {
            "both" => Some(RentTypeIncluded::Both),
            "gross" => Some(RentTypeIncluded::Gross),
            "nnn" => Some(RentTypeIncluded::Nnn),
            "neither" => Some(RentTypeIncluded::Neither),
            _ => None,
        }
    }

    pub fn includes(&self, rent_type: RentType) -> bool {
        match self {
            RentTypeIncluded::Both => true,
            RentTypeIncluded::Gross => rent_type == RentType::Gross,
            RentTypeIncluded::Nnn => rent_type == RentType::Nnn,
            RentTypeIncluded::Neither => false,
        }
    }
}

/// Which expense rows a tenant's recovery pool draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryBasis {
    /// Every retail expense is recoverable from every tenant
    Pooled,
    /// Gross and NNN tenants recover only rows whose `rent_type_included`
    /// admits their lease type
    #[default]
    ByRentType,
}

impl FromStr for RecoveryBasis {
    type Err = UnderwritingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "pooled" | "all" => Ok(RecoveryBasis::Pooled),
            "byrenttype" | "renttype" => Ok(RecoveryBasis::ByRentType),
            _ => Err(UnderwritingError::InvalidInput {
                field: "basis".into(),
                reason: format!("Unknown recovery basis '{s}'"),
            }),
        }
    }
}

fn rent_type_included<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RentTypeIncluded>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RentTypeIncluded::from_label))
}

// ---------------------------------------------------------------------------
// Line item
// ---------------------------------------------------------------------------

/// One row of an expense table: one-time costs, operating expenses, or
/// retail expenses share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique within its owning collection
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    /// Free text; blank while the user is still typing
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(alias = "type")]
    pub category: Category,
    #[serde(default)]
    pub factor: FactorKind,
    /// Dollars, percent, or dollars per unit depending on `factor`
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cost_per: Money,
    /// Multiplier for per-unit kinds; `None` when the kind ignores it
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub statistic: Option<Decimal>,
    /// 1-based; 0 means unset (month 1)
    #[serde(default, deserialize_with = "lenient::month")]
    pub start_month: i32,
    /// 1-based; 0 means unset (month 12)
    #[serde(default, deserialize_with = "lenient::month")]
    pub end_month: i32,
    /// Retail only
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "rent_type_included"
    )]
    pub rent_type_included: Option<RentTypeIncluded>,
}

impl LineItem {
    /// A fresh row with zeroed numerics and the category's default factor.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category) -> LineItem {
        let factor = category.default_factor();
        let statistic = if factor == FactorKind::Total {
            None
        } else {
            Some(Decimal::ZERO)
        };
        LineItem {
            id: id.into(),
            name: name.into(),
            category,
            factor,
            cost_per: Decimal::ZERO,
            statistic,
            start_month: 1,
            end_month: 12,
            rent_type_included: (category == Category::Retail).then_some(RentTypeIncluded::Both),
        }
    }

    /// The row after the user picks a new factor: the old magnitude and
    /// statistic no longer mean anything, so both reset.
    pub fn with_factor(&self, factor: FactorKind) -> LineItem {
        let statistic = if factor == FactorKind::Total {
            None
        } else {
            Some(Decimal::ZERO)
        };
        LineItem {
            factor,
            cost_per: Decimal::ZERO,
            statistic,
            ..self.clone()
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Untitled"
        } else {
            &self.name
        }
    }

    /// Months the annual figure is spread over. Never zero.
    pub fn months_in_period(&self) -> Decimal {
        let start = if self.start_month == 0 { 1 } else { self.start_month };
        let end = if self.end_month == 0 { 12 } else { self.end_month };
        Decimal::from((i64::from(end) - i64::from(start) + 1).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_factor_labels_round_trip() {
        for kind in FactorKind::KNOWN {
            assert_eq!(FactorKind::from_label(kind.label()), kind);
        }
    }

    #[test]
    fn test_factor_parse_is_case_and_punctuation_insensitive() {
        assert_eq!(FactorKind::from_label("PER UNIT"), FactorKind::PerUnit);
        assert_eq!(FactorKind::from_label("PerSFPerYear"), FactorKind::PerSFPerYear);
        assert_eq!(
            FactorKind::from_label("percent of egi"),
            FactorKind::PercentOfEGI
        );
        assert_eq!(
            FactorKind::from_label("Percent of other expenses"),
            FactorKind::PercentOfOtherExpenses
        );
    }

    #[test]
    fn test_unknown_factor_is_kept() {
        let kind = FactorKind::from_label("per Parking Space");
        assert_eq!(kind, FactorKind::Unrecognized("per Parking Space".into()));
        assert!(!kind.is_recognized());
        assert!("per Parking Space".parse::<FactorKind>().is_err());
    }

    #[test]
    fn test_null_factor_deserializes_unrecognized() {
        let item: LineItem =
            serde_json::from_str(r#"{"id": 7, "type": "Closing Costs", "factor": null}"#).unwrap();
        assert_eq!(item.id, "7");
        assert_eq!(item.category, Category::ClosingCosts);
        assert_eq!(item.factor, FactorKind::Unrecognized(String::new()));
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "Legal and Pre-Development Costs".parse::<Category>().unwrap(),
            Category::LegalAndPreDevelopment
        );
        assert_eq!(
            "operating-expense".parse::<Category>().unwrap(),
            Category::OperatingExpense
        );
        assert!("Parking".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_accepts() {
        assert!(Category::HardCosts.accepts(&FactorKind::PercentOfOtherExpenses));
        assert!(!Category::HardCosts.accepts(&FactorKind::PercentOfEGI));
        assert!(Category::OperatingExpense.accepts(&FactorKind::PercentOfEGI));
        assert!(!Category::OperatingExpense.accepts(&FactorKind::PercentOfPropertyTaxes));
        assert!(Category::Retail.accepts(&FactorKind::PercentOfBaseRent));
        assert!(!Category::AmenityIncome.accepts(&FactorKind::Total));
    }

    #[test]
    fn test_rent_type_parsing() {
        assert_eq!(RentType::from_label("nnn"), RentType::Nnn);
        assert_eq!(RentType::from_label(""), RentType::Gross);
        assert_eq!(RentTypeIncluded::from_label("Both"), Some(RentTypeIncluded::Both));
        assert_eq!(RentTypeIncluded::from_label("sometimes"), None);
        assert!(RentTypeIncluded::Nnn.includes(RentType::Nnn));
        assert!(!RentTypeIncluded::Nnn.includes(RentType::Gross));
        assert!(!RentTypeIncluded::Neither.includes(RentType::Gross));
    }

    #[test]
    fn test_new_line_item_defaults() {
        let item = LineItem::new("a", "Title Insurance", Category::ClosingCosts);
        assert_eq!(item.factor, FactorKind::Total);
        assert_eq!(item.statistic, None);
        assert_eq!(item.rent_type_included, None);

        let retail = LineItem::new("r", "CAM", Category::Retail);
        assert_eq!(retail.factor, FactorKind::PerSFPerYear);
        assert_eq!(retail.rent_type_included, Some(RentTypeIncluded::Both));
    }

    #[test]
    fn test_with_factor_resets_magnitudes() {
        let mut item = LineItem::new("a", "Survey", Category::ClosingCosts);
        item.cost_per = dec!(2500);
        let per_unit = item.with_factor(FactorKind::PerUnit);
        assert_eq!(per_unit.cost_per, Decimal::ZERO);
        assert_eq!(per_unit.statistic, Some(Decimal::ZERO));
        let total = per_unit.with_factor(FactorKind::Total);
        assert_eq!(total.statistic, None);
        assert_eq!(total.name, "Survey");
    }

    #[test]
    fn test_months_in_period_defaults_and_floor() {
        let mut item = LineItem::new("a", "", Category::Reserves);
        assert_eq!(item.display_name(), "Untitled");
        assert_eq!(item.months_in_period(), dec!(12));
        item.start_month = 0;
        item.end_month = 0;
        assert_eq!(item.months_in_period(), dec!(12));
        item.start_month = 6;
        item.end_month = 3;
        assert_eq!(item.months_in_period(), dec!(1));
        item.start_month = 4;
        item.end_month = 9;
        assert_eq!(item.months_in_period(), dec!(6));
        item.start_month = i32::MIN;
        item.end_month = i32::MAX;
        assert_eq!(item.months_in_period(), Decimal::from(1_i64 << 32));
    }
}
