pub mod recovery;
pub mod valuation;

use serde::Serialize;
use serde_json::Value;
use uw_valuation_core::ComputationOutput;

/// Every command hands its envelope to the output layer as JSON.
pub(crate) fn envelope<T: Serialize>(
    output: ComputationOutput<T>,
) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(output)?)
}
