pub mod config;
pub mod error;
pub mod lenient;
pub mod model;
pub mod types;
pub mod valuation;

#[cfg(feature = "recovery")]
pub mod recovery;

#[cfg(feature = "cache")]
pub mod cache;

pub use config::EngineConfig;
pub use error::UnderwritingError;
pub use model::*;
pub use types::*;
pub use valuation::aggregates::{resolve_aggregates, AggregateResolver, Aggregates};
pub use valuation::category::{evaluate_category, CategoryAggregator};
pub use valuation::egi::{calculate_egi, EgiFormula, EgiInputs, StandardEgi};
pub use valuation::evaluator::{is_field_editable, Field, LineItemEvaluator};
pub use valuation::income::{derive_amenity, derive_retail_income};
pub use valuation::model::{value_model, value_model_with, ModelValuation};

#[cfg(feature = "recovery")]
pub use recovery::allocate_recoveries;

#[cfg(feature = "cache")]
pub use cache::ValuationCache;

/// Standard result type for operations outside the valuation boundary
pub type UnderwritingResult<T> = Result<T, UnderwritingError>;
