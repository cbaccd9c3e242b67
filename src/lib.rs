//! `growth-curves` library crate.
//!
//! Converts merchantable-volume yield curves into per-age above-ground biomass
//! carbon curves, smooths the unreliable low-age region, and serves the results
//! from a shared, thread-safe cache.
//!
//! The binary (`gc`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the cache can be embedded directly in a simulation host

pub mod app;
pub mod cache;
pub mod carbon;
pub mod cli;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fit;
pub mod growth;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
