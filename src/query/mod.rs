//! Read-only queries
//!
//! - **Filter**: `RecordFilter`, a conjunction of time range, state and action
//! - **Engine**: `QueryEngine`, range and categorical retrieval over a ledger
//!
//! # Examples
//!
//! ```rust,ignore
//! use chemledger::query::{QueryEngine, RecordFilter};
//!
//! let queries = QueryEngine::new(ledger);
//! let window = queries.range(t0, t1)?;
//! let fills = queries.by_action(RecordAction::Fill, Some((t0, t1)))?;
//! let normal_fills = queries.filter(&RecordFilter::new()
//!     .state(RecordState::Normal)
//!     .action(RecordAction::Fill));
//! ```

mod engine;
mod filter;

pub use engine::{IndexedRecord, QueryEngine};
pub use filter::RecordFilter;
