//! Volume-to-biomass-carbon conversion strategies.

pub mod converter;

pub use converter::*;
