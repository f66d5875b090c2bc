//! Field aggregation
//!
//! Integer means and one-pass summaries over a filtered slice of the ledger.

mod engine;
mod field;

pub use engine::{AggregationEngine, FieldSummary};
pub use field::{Field, FieldValue, NumericDomain};
