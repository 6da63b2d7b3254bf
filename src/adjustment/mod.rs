//! Adjustment entity, type taxonomy and collection.

mod adjustment;
mod collection;
mod types;

pub use adjustment::{Adjustment, AdjustmentAttributes};
pub use collection::AdjustmentCollection;
pub use types::AdjustmentType;
