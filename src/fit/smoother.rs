//! Low-age smoothing of converted carbon curves.
//!
//! The volume-to-biomass equations are unreliable at small volumes, so the raw
//! carbon curve is replaced below a *substitution point* by Weibull curves fitted
//! to the well-behaved region above it.
//!
//! Workflow:
//!
//! 1. locate the substitution point from the species' PERD factor
//! 2. sample a 50-point window starting at that age and normalize each series
//! 3. fit `1 - exp(-a * t^b)` to merch, foliage and total above-ground carbon
//! 4. regenerate ages `0..=point + 15`, keeping `merch + foliage + other = total`,
//!    and splice the fit in up to the first age where it rejoins the raw total

use tracing::debug;

use crate::carbon::ComponentBiomassCarbonCurve;
use crate::domain::SpeciesType;
use crate::error::{GrowthError, GrowthResult};
use crate::growth::StandGrowthCurve;
use crate::math::{Bounds, LmOptions, levenberg_marquardt, merch_factor, non_merch_factor};
use crate::models::{MIN_SCALE, MIN_SHAPE, WeibullParams, weibull, weibull_jacobian};

/// Years past the substitution point that may be replaced.
pub const EXTENDED_REGION_SIZE: usize = 15;

/// Points in the fitting window (including the origin).
pub const SMOOTH_SAMPLE_SIZE: usize = 50;

pub const INITIAL_PARAMS: WeibullParams = WeibullParams { a: 1.0, b: 0.1 };

const SCALE_CAP: f64 = 150.0;
const SHAPE_CAP: f64 = 5.0;

/// Join tolerances, tightest first.
const JOIN_TOLERANCES: [f64; 3] = [0.01, 0.03, 0.05];

/// Normalized fitting window. Every series is divided by its own maximum; the
/// maxima are kept to scale fitted values back.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingWindow {
    pub merch: Vec<f64>,
    pub foliage: Vec<f64>,
    pub other: Vec<f64>,
    pub total: Vec<f64>,
    pub ages: Vec<f64>,
    pub max_merch: f64,
    pub max_foliage: f64,
    pub max_other: f64,
    pub max_total: f64,
    pub max_age: f64,
}

/// What a successful smoothing pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingOutcome {
    pub substitution_point: usize,
    /// Last replaced age.
    pub join_age: usize,
    pub merch: WeibullParams,
    pub foliage: WeibullParams,
    pub total: WeibullParams,
}

#[derive(Debug, Clone, Default)]
pub struct Smoother {
    pub lm_options: LmOptions,
}

impl Smoother {
    pub fn new(lm_options: LmOptions) -> Self {
        Self { lm_options }
    }

    /// Smooth `curve` in place.
    ///
    /// `Ok(None)` when there is nothing to repair: no substitution point, or one
    /// at or past the stand's last age.
    pub fn smooth(
        &self,
        stand: &StandGrowthCurve,
        curve: &mut ComponentBiomassCarbonCurve,
        species: SpeciesType,
    ) -> GrowthResult<Option<SmoothingOutcome>> {
        let Some(point) = component_smoothing_substitution_region_point(stand, species) else {
            return Ok(None);
        };
        if point < 1 || point >= stand.stand_max_age() {
            return Ok(None);
        }

        let window = prepare_smoothing_input_data(curve, point, stand.stand_max_age());

        let mut merch = INITIAL_PARAMS;
        let mut foliage = INITIAL_PARAMS;
        let mut total = INITIAL_PARAMS;
        self.minimize(&window.ages, &window.merch, &mut merch)?;
        self.minimize(&window.ages, &window.foliage, &mut foliage)?;
        self.minimize(&window.ages, &window.total, &mut total)?;

        let join_age = final_fitting_region_and_replace_data(curve, point, &window, merch, foliage, total);

        debug!(
            key = %stand.key(),
            %species,
            substitution_point = point,
            join_age,
            "smoothed carbon curve"
        );

        Ok(Some(SmoothingOutcome {
            substitution_point: point,
            join_age,
            merch,
            foliage,
            total,
        }))
    }

    /// Fit the Weibull shape to `(ages, values)`, updating `params` in place.
    ///
    /// The fitted scale is capped at 150; when it is, the shape is capped at 5.
    pub fn minimize(&self, ages: &[f64], values: &[f64], params: &mut WeibullParams) -> GrowthResult<()> {
        if ages.len() != values.len() {
            return Err(GrowthError::FitFailed(format!(
                "{} ages for {} values",
                ages.len(),
                values.len()
            )));
        }
        if values.iter().chain(ages).any(|v| !v.is_finite()) {
            return Err(GrowthError::FitFailed("non-finite smoothing input".to_string()));
        }

        let bounds = Bounds {
            lower: vec![MIN_SCALE, MIN_SHAPE],
            upper: vec![f64::INFINITY, f64::INFINITY],
        };
        let report = levenberg_marquardt(
            &params.as_slice(),
            &bounds,
            self.lm_options,
            |x| {
                let p = WeibullParams::new(x[0], x[1]);
                ages.iter().zip(values).map(|(t, y)| weibull(*t, p) - y).collect()
            },
            |x| weibull_jacobian(ages, WeibullParams::new(x[0], x[1])),
        )
        .map_err(GrowthError::FitFailed)?;

        let mut fitted = WeibullParams::new(report.x[0], report.x[1]);
        if !(fitted.a.is_finite() && fitted.b.is_finite()) {
            return Err(GrowthError::FitFailed("fit diverged".to_string()));
        }
        if fitted.a > SCALE_CAP {
            fitted.a = SCALE_CAP;
            if fitted.b > SHAPE_CAP {
                fitted.b = SHAPE_CAP;
            }
        }
        *params = fitted;
        Ok(())
    }
}

/// Age below which the raw carbon curve for `species` should be replaced.
///
/// Scans downward from two years before the stand's last age, tracking the
/// Boudewyn non-merchantable factor against its cap. The point is the age just
/// above where either the volume falls to zero, the factor crosses its cap, or
/// the volume drops below the calibrated minimum (the latter two only before
/// the stand reaches its maximum volume). Requires the factor to be uncapped
/// somewhere in the scanned range.
pub fn component_smoothing_substitution_region_point(
    stand: &StandGrowthCurve,
    species: SpeciesType,
) -> Option<usize> {
    let pf = stand.perd_factor(species)?;
    let max_age = stand.stand_max_age();
    if stand.annual_stand_maximum_volume() <= pf.min_volume || max_age < 2 {
        return None;
    }
    let max_volume_age = stand.stand_age_with_maximum_volume();
    let cap = pf.cap_non_merch;

    let mut seen_uncapped = false;
    let mut factor = 0.0;
    for age in (0..=max_age - 2).rev() {
        let volume = stand.stand_total_volume_at_age(age);
        let volume_older = stand.stand_total_volume_at_age(age + 1);
        let merch = merch_factor(volume, pf.a, pf.b);

        let prev_factor = factor;
        factor = non_merch_factor(merch, pf.a_non_merch, pf.b_non_merch, pf.k_non_merch);
        if factor < cap {
            seen_uncapped = true;
        }
        factor = factor.max(1.0);
        let capped = factor >= cap;
        if capped {
            factor = cap;
        }

        if seen_uncapped && volume == 0.0 && age > 1 {
            return Some(age + 1);
        } else if age <= 1 {
            return None;
        }

        if age < max_volume_age {
            let crossed_below_min = volume < pf.min_volume && volume_older > pf.min_volume;
            let crossed_cap = prev_factor < cap;
            let found = if capped {
                crossed_cap && (volume >= pf.min_volume || crossed_below_min)
            } else {
                crossed_below_min
            };
            if found {
                return seen_uncapped.then_some(age + 1);
            }
        }
    }

    None
}

/// Sample `SMOOTH_SAMPLE_SIZE` points from `curve` starting just after
/// `substitution_point`, with the origin as the first point.
pub fn prepare_smoothing_input_data(
    curve: &ComponentBiomassCarbonCurve,
    substitution_point: usize,
    stand_max_age: usize,
) -> SmoothingWindow {
    let mut merch = vec![0.0; SMOOTH_SAMPLE_SIZE];
    let mut foliage = vec![0.0; SMOOTH_SAMPLE_SIZE];
    let mut other = vec![0.0; SMOOTH_SAMPLE_SIZE];
    let mut total = vec![0.0; SMOOTH_SAMPLE_SIZE];
    let mut ages = vec![0.0; SMOOTH_SAMPLE_SIZE];

    for i in 1..SMOOTH_SAMPLE_SIZE {
        let age = (substitution_point + i).min(stand_max_age);
        merch[i] = curve.merch_carbon_at_age(age);
        foliage[i] = curve.foliage_carbon_at_age(age);
        other[i] = curve.other_carbon_at_age(age);
        total[i] = merch[i] + foliage[i] + other[i];
        ages[i] = (substitution_point + i) as f64;
    }

    let max_merch = normalize(&mut merch);
    let max_foliage = normalize(&mut foliage);
    let max_other = normalize(&mut other);
    let max_total = normalize(&mut total);
    let max_age = normalize(&mut ages);

    SmoothingWindow {
        merch,
        foliage,
        other,
        total,
        ages,
        max_merch,
        max_foliage,
        max_other,
        max_total,
        max_age,
    }
}

/// Divide by the series maximum and return it. All-zero series stay zero.
fn normalize(values: &mut [f64]) -> f64 {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    }
    max
}

/// Regenerate the low-age region from the fitted curves and splice it into
/// `curve`. Returns the last replaced age.
///
/// Fitted totals are never below fitted merch, and foliage never exceeds what
/// is left; "other" takes the remainder so the three components sum to the
/// fitted total.
pub fn final_fitting_region_and_replace_data(
    curve: &mut ComponentBiomassCarbonCurve,
    substitution_point: usize,
    window: &SmoothingWindow,
    merch_params: WeibullParams,
    foliage_params: WeibullParams,
    total_params: WeibullParams,
) -> usize {
    let region = substitution_point + EXTENDED_REGION_SIZE;
    let mut join_ages = [region; JOIN_TOLERANCES.len()];
    let mut replacement = Vec::with_capacity(region + 1);

    for age in 0..=region {
        let raw_total = match curve.above_ground_carbon_at_age(age) {
            t if t == 0.0 => 0.00001,
            t => t,
        };

        let t = age as f64 / window.max_age;
        let mut fit_merch = weibull(t, merch_params) * window.max_merch;
        let mut fit_foliage = weibull(t, foliage_params) * window.max_foliage;
        let mut fit_total = weibull(t, total_params) * window.max_total;

        if fit_merch.is_nan() {
            fit_merch = 0.0;
        }
        if fit_total < fit_merch {
            fit_total = fit_merch;
        }
        if fit_total - fit_merch < fit_foliage {
            fit_foliage = fit_total - fit_merch;
        }
        if fit_foliage.is_nan() {
            fit_foliage = 0.0;
        }
        replacement.push((fit_merch, fit_foliage, fit_total - fit_foliage - fit_merch));

        if age >= substitution_point {
            let mismatch = (raw_total - fit_total).abs() / raw_total;
            for (join, tolerance) in join_ages.iter_mut().zip(JOIN_TOLERANCES) {
                if mismatch < tolerance && age < *join {
                    *join = age;
                }
            }
        }
    }

    let join_age = join_ages.into_iter().find(|a| *a < region).unwrap_or(region);

    for (age, (m, f, o)) in replacement.into_iter().enumerate().take(join_age + 1) {
        curve.set_merch_carbon_at_age(age, m);
        curve.set_foliage_carbon_at_age(age, f);
        curve.set_other_carbon_at_age(age, o);
    }

    join_age
}
