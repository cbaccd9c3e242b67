//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - identifiers (`SpeciesType`, `CurveKey`)
//! - yield samples (`YieldRow`)
//! - per-species parameters (`PerdFactor`, `ForestTypeConfiguration`, `TurnoverRates`)
//! - run configuration (`RunConfig`)

pub mod types;

pub use types::*;
