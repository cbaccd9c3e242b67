//! Raw volume-to-carbon conversion.
//!
//! `RawConverter` is the seam the cache calls to turn a stand's volume curve into
//! one species group's unsmoothed carbon curve. `BoudewynConverter` is the
//! standard implementation: Boudewyn et al. (2007) stemwood factors and
//! component proportions, scaled by the group's share of stand volume, then
//! converted to carbon at 50%.

use crate::carbon::ComponentBiomassCarbonCurve;
use crate::domain::SpeciesType;
use crate::error::{GrowthError, GrowthResult};
use crate::growth::StandGrowthCurve;
use crate::math::{biomass_proportions, merch_factor, non_merch_factor, sapling_factor};

const BIOMASS_TO_CARBON: f64 = 0.5;

/// Converts a stand's volume curve into a per-age carbon curve for one species group.
pub trait RawConverter: Send + Sync {
    fn convert(&self, stand: &StandGrowthCurve, species: SpeciesType) -> GrowthResult<ComponentBiomassCarbonCurve>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoudewynConverter;

impl RawConverter for BoudewynConverter {
    fn convert(&self, stand: &StandGrowthCurve, species: SpeciesType) -> GrowthResult<ComponentBiomassCarbonCurve> {
        let pf = stand
            .perd_factor(species)
            .ok_or(GrowthError::MissingPerdFactor(species))?;
        let (top_prop, stump_prop) = pf.top_and_stump_props(species);

        let max_age = stand.stand_max_age();
        let mut curve = ComponentBiomassCarbonCurve::with_max_age(max_age);

        for age in (0..=max_age).rev() {
            let volume = stand.stand_total_volume_at_age(age);

            let merch = merch_factor(volume, pf.a, pf.b);
            let nm_factor = clamp_factor(
                non_merch_factor(merch, pf.a_non_merch, pf.b_non_merch, pf.k_non_merch),
                pf.cap_non_merch,
            );
            let non_merch = (nm_factor - 1.0) * merch;
            let sap_factor = clamp_factor(sapling_factor(merch + non_merch, pf.a_sap, pf.b_sap, pf.k_sap), pf.cap_sap);
            let sapling = (sap_factor - 1.0) * (merch + non_merch);
            let stemwood = merch + non_merch + sapling;

            let props = biomass_proportions(volume, pf);
            let total_tree = stemwood / props.stemwood;

            let share = match species {
                SpeciesType::Softwood => stand.stand_softwood_volume_ratio_at_age(age),
                SpeciesType::Hardwood => 1.0 - stand.stand_softwood_volume_ratio_at_age(age),
            };
            let total_tree = total_tree * share;
            let stemwood = stemwood * share;
            let bark = total_tree * props.bark;
            let foliage = total_tree * props.foliage;
            let mut merch = merch * share;

            let (merch_c, other_c) = if merch > 0.0 {
                let merch_bark = bark * (merch / stemwood) * (1.0 - (top_prop + stump_prop) / 100.0);
                merch -= merch * (top_prop + stump_prop) / 100.0;
                (
                    ((merch + merch_bark) * BIOMASS_TO_CARBON).max(0.0),
                    (total_tree - foliage - merch - merch_bark) * BIOMASS_TO_CARBON,
                )
            } else {
                (0.0, (total_tree - foliage) * BIOMASS_TO_CARBON)
            };

            curve.set_merch_carbon_at_age(age, merch_c);
            curve.set_other_carbon_at_age(age, other_c.max(0.0));
            curve.set_foliage_carbon_at_age(age, (foliage * BIOMASS_TO_CARBON).max(0.0));
        }

        Ok(curve)
    }
}

/// Factors below 1 (or non-finite) become 1; then cap.
fn clamp_factor(factor: f64, cap: f64) -> f64 {
    let factor = if factor < 1.0 || !factor.is_finite() { 1.0 } else { factor };
    factor.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveKey;
    use crate::growth::stand::fixtures::mixed_stand;

    #[test]
    fn zero_volume_ages_carry_no_carbon() {
        let stand = mixed_stand();
        let curve = BoudewynConverter.convert(&stand, SpeciesType::Softwood).unwrap();
        assert_eq!(curve.merch_carbon_at_age(0), 0.0);
        assert_eq!(curve.foliage_carbon_at_age(0), 0.0);
        assert_eq!(curve.other_carbon_at_age(0), 0.0);
        assert_eq!(curve.merch_carbon_curve().len(), stand.stand_max_age() + 1);
    }

    #[test]
    fn carbon_is_non_negative_for_both_groups() {
        let stand = mixed_stand();
        for species in SpeciesType::ALL {
            let curve = BoudewynConverter.convert(&stand, species).unwrap();
            for age in 0..=stand.stand_max_age() {
                assert!(curve.merch_carbon_at_age(age) >= 0.0);
                assert!(curve.foliage_carbon_at_age(age) >= 0.0);
                assert!(curve.other_carbon_at_age(age) >= 0.0);
            }
        }
    }

    #[test]
    fn groups_split_stand_carbon_by_volume_share() {
        let stand = mixed_stand();
        let sw = BoudewynConverter.convert(&stand, SpeciesType::Softwood).unwrap();
        let hw = BoudewynConverter.convert(&stand, SpeciesType::Hardwood).unwrap();
        // Only softwood has volume before the hardwood table starts growing.
        assert!(sw.merch_carbon_at_age(20) > 0.0);
        assert_eq!(hw.merch_carbon_at_age(20), 0.0);
        assert!(hw.merch_carbon_at_age(100) > 0.0);
    }

    #[test]
    fn missing_perd_factor_is_reported() {
        let mut stand = StandGrowthCurve::new(CurveKey::new(1, 1));
        stand.process_stand_yield_tables();
        assert_eq!(
            BoudewynConverter.convert(&stand, SpeciesType::Hardwood),
            Err(GrowthError::MissingPerdFactor(SpeciesType::Hardwood))
        );
    }

    #[test]
    fn factor_clamp_handles_infinity_and_cap() {
        assert_eq!(clamp_factor(f64::INFINITY, 4.0), 1.0);
        assert_eq!(clamp_factor(0.3, 4.0), 1.0);
        assert_eq!(clamp_factor(7.0, 4.0), 4.0);
        assert_eq!(clamp_factor(2.5, 4.0), 2.5);
    }
}
