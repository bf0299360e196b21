use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::income::{AmenityIncomeRow, RetailIncomeRow, Unit};
use super::line_item::LineItem;
use super::lookup::ModelLookup;
use crate::config::EngineConfig;

/// Everything one valuation pass reads: the record collections exactly as
/// the grids hold them, plus model parameters, model variables, and the
/// resolver's matching configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnderwritingSnapshot {
    /// One-time costs (closing, legal, reserves, hard costs), mixed
    #[serde(default)]
    pub expenses: Vec<LineItem>,
    #[serde(default)]
    pub operating_expenses: Vec<LineItem>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub amenity_income: Vec<AmenityIncomeRow>,
    #[serde(default)]
    pub retail_income: Vec<RetailIncomeRow>,
    #[serde(default)]
    pub retail_expenses: Vec<LineItem>,
    #[serde(default, alias = "parameters")]
    pub model_parameters: ModelLookup,
    #[serde(default, alias = "variables")]
    pub model_variables: ModelLookup,
    #[serde(default)]
    pub config: EngineConfig,
}

impl UnderwritingSnapshot {
    /// Warnings for ids repeated inside one collection. Repeated ids make
    /// self-exclusion in percent-of-other rows ambiguous.
    pub fn duplicate_id_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let collections: [(&str, Vec<&str>); 5] = [
            ("expenses", self.expenses.iter().map(|e| e.id.as_str()).collect()),
            (
                "operating_expenses",
                self.operating_expenses.iter().map(|e| e.id.as_str()).collect(),
            ),
            (
                "retail_expenses",
                self.retail_expenses.iter().map(|e| e.id.as_str()).collect(),
            ),
            (
                "amenity_income",
                self.amenity_income.iter().map(|a| a.id.as_str()).collect(),
            ),
            (
                "retail_income",
                self.retail_income.iter().map(|r| r.id.as_str()).collect(),
            ),
        ];
        for (name, ids) in collections {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    warnings.push(format!("Duplicate id '{id}' in {name}"));
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn test_empty_document_is_empty_snapshot() {
        let snap: UnderwritingSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snap, UnderwritingSnapshot::default());
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let mut snap = UnderwritingSnapshot::default();
        snap.expenses.push(LineItem::new("1", "Title", Category::ClosingCosts));
        snap.expenses.push(LineItem::new("1", "Survey", Category::ClosingCosts));
        snap.operating_expenses
            .push(LineItem::new("1", "Insurance", Category::OperatingExpense));
        let warnings = snap.duplicate_id_warnings();
        assert_eq!(warnings, vec!["Duplicate id '1' in expenses".to_string()]);
    }
}
