//! Li et al. (2003) root biomass equations.
//!
//! Root biomass is estimated from a component's above-ground carbon; the
//! fine/coarse split is driven by the root biomass of the whole stand.

use serde::{Deserialize, Serialize};

use crate::domain::SpeciesType;

const BIOMASS_TO_CARBON: f64 = 0.5;

const DEFAULT_FRP_A: f64 = 0.072;
const DEFAULT_FRP_B: f64 = 0.354;
const DEFAULT_FRP_C: f64 = -0.060_211_95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootProportions {
    pub fine: f64,
    pub coarse: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RootBiomassEquation {
    /// `root = a * ag_biomass`
    Softwood {
        root_bio_a: f64,
        frp_a: f64,
        frp_b: f64,
        frp_c: f64,
    },
    /// `root = a * ag_biomass^b`
    Hardwood {
        root_bio_a: f64,
        root_bio_b: f64,
        frp_a: f64,
        frp_b: f64,
        frp_c: f64,
    },
}

impl RootBiomassEquation {
    /// Published national defaults for the species group.
    pub fn default_for(species: SpeciesType) -> Self {
        match species {
            SpeciesType::Softwood => RootBiomassEquation::Softwood {
                root_bio_a: 0.222,
                frp_a: DEFAULT_FRP_A,
                frp_b: DEFAULT_FRP_B,
                frp_c: DEFAULT_FRP_C,
            },
            SpeciesType::Hardwood => RootBiomassEquation::Hardwood {
                root_bio_a: 1.576,
                root_bio_b: 0.615,
                frp_a: DEFAULT_FRP_A,
                frp_b: DEFAULT_FRP_B,
                frp_c: DEFAULT_FRP_C,
            },
        }
    }

    pub fn carbon_to_biomass(carbon: f64) -> f64 {
        carbon / BIOMASS_TO_CARBON
    }

    pub fn biomass_to_carbon(biomass: f64) -> f64 {
        biomass * BIOMASS_TO_CARBON
    }

    /// Total root biomass for a component from its above-ground carbon.
    pub fn root_biomass(&self, above_ground_carbon: f64) -> f64 {
        let biomass = Self::carbon_to_biomass(above_ground_carbon);
        match *self {
            RootBiomassEquation::Softwood { root_bio_a, .. } => root_bio_a * biomass,
            RootBiomassEquation::Hardwood {
                root_bio_a,
                root_bio_b,
                ..
            } => root_bio_a * biomass.powf(root_bio_b),
        }
    }

    /// Fine/coarse split from the stand's total root biomass.
    pub fn root_proportions(&self, stand_root_biomass: f64) -> RootProportions {
        let (frp_a, frp_b, frp_c) = match *self {
            RootBiomassEquation::Softwood {
                frp_a, frp_b, frp_c, ..
            }
            | RootBiomassEquation::Hardwood {
                frp_a, frp_b, frp_c, ..
            } => (frp_a, frp_b, frp_c),
        };
        let fine = frp_a + frp_b * (frp_c * stand_root_biomass).exp();
        RootProportions {
            fine,
            coarse: 1.0 - fine,
        }
    }
}
