//! Volume growth inputs.
//!
//! - per-species dense yield tables (`yield_table`)
//! - stand-level aggregation of those tables (`stand`)

pub mod stand;
pub mod yield_table;

pub use stand::*;
pub use yield_table::*;
