//! Shared, thread-safe store of generated stand carbon curves.

pub mod growth;

pub use growth::*;
