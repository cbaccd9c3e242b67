//! Mathematical utilities: allometric equations and bounded least squares.

pub mod allometry;
pub mod lm;

pub use allometry::*;
pub use lm::*;
