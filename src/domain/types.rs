//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - loaded from CSV parameter tables
//! - shared across worker threads once a stand has been built
//! - exported to JSON alongside generated carbon curves

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::carbon::RootBiomassEquation;
use crate::error::{GrowthError, GrowthResult};

/// Species group of a yield table or stand component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesType {
    Softwood,
    Hardwood,
}

impl SpeciesType {
    /// Both groups, softwood first (the order components are built and merged in).
    pub const ALL: [SpeciesType; 2] = [SpeciesType::Softwood, SpeciesType::Hardwood];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeciesType::Softwood => "Softwood",
            SpeciesType::Hardwood => "Hardwood",
        }
    }
}

impl fmt::Display for SpeciesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one stand growth curve: a growth curve within a spatial unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveKey {
    pub growth_curve_id: i64,
    pub spu_id: i64,
}

impl CurveKey {
    pub fn new(growth_curve_id: i64, spu_id: i64) -> Self {
        Self {
            growth_curve_id,
            spu_id,
        }
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gc={} spu={}", self.growth_curve_id, self.spu_id)
    }
}

/// One sparse yield sample: merchantable volume (m3/ha) at an age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldRow {
    pub age: usize,
    pub volume: f64,
}

impl YieldRow {
    pub fn new(age: usize, volume: f64) -> Self {
        Self { age, volume }
    }
}

/// Number of coefficients in a PERD factor row (excluding any leading id column).
pub const PERD_FACTOR_LEN: usize = 33;

/// Boudewyn et al. (2007) volume-to-biomass parameters for one species group.
///
/// Field order matches the published parameter tables, which is also the
/// order `from_values` expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerdFactor {
    pub a: f64,
    pub b: f64,
    pub a_non_merch: f64,
    pub b_non_merch: f64,
    pub k_non_merch: f64,
    pub cap_non_merch: f64,
    pub a_sap: f64,
    pub b_sap: f64,
    pub k_sap: f64,
    pub cap_sap: f64,
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub min_volume: f64,
    pub max_volume: f64,
    pub low_stemwood_prop: f64,
    pub high_stemwood_prop: f64,
    pub low_stembark_prop: f64,
    pub high_stembark_prop: f64,
    pub low_branches_prop: f64,
    pub high_branches_prop: f64,
    pub low_foliage_prop: f64,
    pub high_foliage_prop: f64,
    pub softwood_top_prop: f64,
    pub softwood_stump_prop: f64,
    pub hardwood_top_prop: f64,
    pub hardwood_stump_prop: f64,
}

impl PerdFactor {
    /// Build from the 33 coefficients in table order.
    pub fn from_values(values: &[f64]) -> GrowthResult<Self> {
        let v: &[f64; PERD_FACTOR_LEN] = values.try_into().map_err(|_| {
            GrowthError::InvalidInput(format!(
                "PERD factor needs {PERD_FACTOR_LEN} values, got {}",
                values.len()
            ))
        })?;
        Ok(Self {
            a: v[0],
            b: v[1],
            a_non_merch: v[2],
            b_non_merch: v[3],
            k_non_merch: v[4],
            cap_non_merch: v[5],
            a_sap: v[6],
            b_sap: v[7],
            k_sap: v[8],
            cap_sap: v[9],
            a1: v[10],
            a2: v[11],
            a3: v[12],
            b1: v[13],
            b2: v[14],
            b3: v[15],
            c1: v[16],
            c2: v[17],
            c3: v[18],
            min_volume: v[19],
            max_volume: v[20],
            low_stemwood_prop: v[21],
            high_stemwood_prop: v[22],
            low_stembark_prop: v[23],
            high_stembark_prop: v[24],
            low_branches_prop: v[25],
            high_branches_prop: v[26],
            low_foliage_prop: v[27],
            high_foliage_prop: v[28],
            softwood_top_prop: v[29],
            softwood_stump_prop: v[30],
            hardwood_top_prop: v[31],
            hardwood_stump_prop: v[32],
        })
    }

    /// Top and stump proportions (percent of merchantable stemwood) for a species group.
    pub fn top_and_stump_props(&self, species: SpeciesType) -> (f64, f64) {
        match species {
            SpeciesType::Softwood => (self.softwood_top_prop, self.softwood_stump_prop),
            SpeciesType::Hardwood => (self.hardwood_top_prop, self.hardwood_stump_prop),
        }
    }
}

/// Per-species partition configuration attached to a stand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestTypeConfiguration {
    /// Pool-name prefix for this component (e.g. `Softwood`).
    pub forest_type: String,
    pub root_biomass_equation: Option<RootBiomassEquation>,
}

impl ForestTypeConfiguration {
    /// Configuration named after the species group with its default root equation.
    pub fn for_species(species: SpeciesType) -> Self {
        Self {
            forest_type: species.as_str().to_string(),
            root_biomass_equation: Some(RootBiomassEquation::default_for(species)),
        }
    }
}

/// Annual turnover rates for a stand. Carried through the cache untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnoverRates {
    pub sw_foliage_turnover: f64,
    pub hw_foliage_turnover: f64,
    pub sw_stem_turnover: f64,
    pub hw_stem_turnover: f64,
    pub sw_branch_turnover: f64,
    pub hw_branch_turnover: f64,
    pub sw_stem_snag_turnover: f64,
    pub hw_stem_snag_turnover: f64,
    pub sw_branch_snag_turnover: f64,
    pub hw_branch_snag_turnover: f64,
    pub sw_coarse_root_turnover: f64,
    pub hw_coarse_root_turnover: f64,
    pub sw_fine_root_turnover: f64,
    pub hw_fine_root_turnover: f64,
    pub sw_other_to_branch_snag_split: f64,
    pub hw_other_to_branch_snag_split: f64,
    pub sw_coarse_root_split: f64,
    pub hw_coarse_root_split: f64,
    pub sw_fine_root_ag_split: f64,
    pub hw_fine_root_ag_split: f64,
}

/// Current pool values of a land unit, keyed by pool name (`SoftwoodMerch`, ...).
///
/// Missing pools read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandPools {
    values: HashMap<String, f64>,
}

impl StandPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }
}

/// Config for a full `gc` run. Built from CLI args.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub yields_path: PathBuf,
    pub perd_path: PathBuf,
    pub turnover_path: Option<PathBuf>,
    pub smoothing: bool,
    pub export_curve: Option<PathBuf>,
    pub only: Option<CurveKey>,
}
