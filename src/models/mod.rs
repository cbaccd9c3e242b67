//! Growth-shape models.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic.

pub mod weibull;

pub use weibull::*;
