//! Carbon curves produced from stand growth.
//!
//! - per-species component curves (`component`)
//! - stand-wide merged curve with root increments (`stand`)
//! - annual above-ground increment summary (`increment`)
//! - Li et al. root biomass equations (`root`)

pub mod component;
pub mod increment;
pub mod root;
pub mod stand;

pub use component::*;
pub use increment::*;
pub use root::*;
pub use stand::*;
