pub mod income;
pub mod line_item;
pub mod lookup;
pub mod snapshot;

pub use income::{AmenityIncomeRow, RetailIncomeRow, Unit};
pub use line_item::{Category, FactorKind, LineItem, RecoveryBasis, RentType, RentTypeIncluded};
pub use lookup::ModelLookup;
pub use snapshot::UnderwritingSnapshot;
