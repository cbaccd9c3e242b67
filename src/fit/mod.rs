//! Low-age smoothing of converted carbon curves.
//!
//! Responsibilities:
//!
//! - find the age below which raw conversion results are unreliable
//! - fit Weibull shapes to the region above it
//! - splice the fitted curves back in while keeping components additive

pub mod smoother;

pub use smoother::*;
