//! Boudewyn et al. (2007) volume-to-biomass equations.
//!
//! - eq. 1: merchantable stemwood biomass `a * vol^b`
//! - eq. 2: non-merchantable factor `k + a * merch^b`
//! - eq. 3: sapling factor `k + a * stem^b`
//! - eqs. 4-7: proportion model term `exp(a1 + a2 * vol + a3 * ln(vol + 5))`
//!
//! A NaN result maps to 0. Infinities pass through; callers clamp factors.

use crate::domain::PerdFactor;

#[inline]
fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

pub fn merch_factor(volume: f64, a: f64, b: f64) -> f64 {
    nan_to_zero(a * volume.powf(b))
}

pub fn non_merch_factor(merch_stemwood: f64, a: f64, b: f64, k: f64) -> f64 {
    nan_to_zero(k + a * merch_stemwood.powf(b))
}

pub fn sapling_factor(stemwood: f64, a: f64, b: f64, k: f64) -> f64 {
    nan_to_zero(k + a * stemwood.powf(b))
}

pub fn model_term(volume: f64, a1: f64, a2: f64, a3: f64) -> f64 {
    nan_to_zero((a1 + a2 * volume + a3 * (volume + 5.0).ln()).exp())
}

/// Stemwood, bark, branch and foliage shares of total tree biomass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomassProportions {
    pub stemwood: f64,
    pub bark: f64,
    pub branches: f64,
    pub foliage: f64,
}

/// Proportions for a stand volume. Volumes outside the calibrated range use the
/// tabulated low/high proportions.
pub fn biomass_proportions(volume: f64, pf: &PerdFactor) -> BiomassProportions {
    let (stemwood, bark, branches) = if volume < pf.min_volume {
        (pf.low_stemwood_prop, pf.low_stembark_prop, pf.low_branches_prop)
    } else if volume > pf.max_volume {
        (pf.high_stemwood_prop, pf.high_stembark_prop, pf.high_branches_prop)
    } else {
        let a = model_term(volume, pf.a1, pf.a2, pf.a3);
        let b = model_term(volume, pf.b1, pf.b2, pf.b3);
        let c = model_term(volume, pf.c1, pf.c2, pf.c3);
        let denom = 1.0 + a + b + c;
        (1.0 / denom, a / denom, b / denom)
    };
    BiomassProportions {
        stemwood,
        bark,
        branches,
        foliage: 1.0 - stemwood - bark - branches,
    }
}
