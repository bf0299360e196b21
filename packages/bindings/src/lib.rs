use napi::Result as NapiResult;
use napi_derive::napi;
use uw_valuation_core::{Category, LineItem, RecoveryBasis, UnderwritingSnapshot};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn read_snapshot(input_json: &str) -> NapiResult<UnderwritingSnapshot> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Whole model
// ---------------------------------------------------------------------------

#[napi]
pub fn value_model(input_json: String) -> NapiResult<String> {
    let snapshot = read_snapshot(&input_json)?;
    let output = uw_valuation_core::value_model(&snapshot);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn resolve_aggregates(input_json: String) -> NapiResult<String> {
    let snapshot = read_snapshot(&input_json)?;
    let output = uw_valuation_core::resolve_aggregates(&snapshot);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_egi(input_json: String) -> NapiResult<String> {
    let snapshot = read_snapshot(&input_json)?;
    let output = uw_valuation_core::calculate_egi(&snapshot);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct CategoryBindingInput {
    #[serde(flatten)]
    snapshot: UnderwritingSnapshot,
    category: Category,
}

#[napi]
pub fn evaluate_category(input_json: String) -> NapiResult<String> {
    let binding_input: CategoryBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        uw_valuation_core::evaluate_category(&binding_input.snapshot, binding_input.category);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct LineItemBindingInput {
    #[serde(flatten)]
    snapshot: UnderwritingSnapshot,
    item: LineItem,
}

/// One row as the grid is editing it, against the snapshot it belongs to.
/// The row's siblings are the snapshot collection matching its category.
#[napi]
pub fn evaluate_line_item(input_json: String) -> NapiResult<String> {
    let binding_input: LineItemBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let snapshot = &binding_input.snapshot;
    let aggregates =
        uw_valuation_core::AggregateResolver::new().resolve(snapshot, &mut Vec::new());
    let siblings = match binding_input.item.category {
        Category::OperatingExpense => &snapshot.operating_expenses,
        Category::Retail => &snapshot.retail_expenses,
        _ => &snapshot.expenses,
    };
    let valuation = uw_valuation_core::LineItemEvaluator::new(&aggregates)
        .evaluate(&binding_input.item, siblings);
    serde_json::to_string(&valuation).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct RecoveryBindingInput {
    #[serde(flatten)]
    snapshot: UnderwritingSnapshot,
    #[serde(default)]
    basis: Option<RecoveryBasis>,
}

#[napi]
pub fn allocate_recoveries(input_json: String) -> NapiResult<String> {
    let mut binding_input: RecoveryBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if let Some(basis) = binding_input.basis {
        binding_input.snapshot.config.recovery_basis = basis;
    }
    let output = uw_valuation_core::allocate_recoveries(&binding_input.snapshot);
    serde_json::to_string(&output).map_err(to_napi_error)
}
