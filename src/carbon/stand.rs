//! Stand-level carbon curve: one component per species group present in the stand.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::carbon::{AboveGroundBiomassCarbonIncrement, ComponentBiomassCarbonCurve, RootBiomassEquation};
use crate::domain::{SpeciesType, StandPools, TurnoverRates};

/// One species group's carbon curve plus the root equation used for its roots.
#[derive(Debug, Clone, PartialEq)]
pub struct StandComponent {
    pub species: SpeciesType,
    /// Pool-name prefix (`Softwood`, `Hardwood`, or a configured forest type).
    pub forest_type: String,
    pub root_biomass_equation: Option<RootBiomassEquation>,
    pub curve: ComponentBiomassCarbonCurve,
}

impl StandComponent {
    pub fn new(
        species: SpeciesType,
        forest_type: impl Into<String>,
        root_biomass_equation: Option<RootBiomassEquation>,
        curve: ComponentBiomassCarbonCurve,
    ) -> Self {
        Self {
            species,
            forest_type: forest_type.into(),
            root_biomass_equation,
            curve,
        }
    }

    pub fn pool_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.forest_type)
    }

    /// Merch, other and foliage increments at `age`.
    ///
    /// With pools, each increment is floored so the pool never goes negative.
    fn above_ground_increments(&self, age: usize, pools: Option<&StandPools>) -> [(String, f64); 3] {
        let floor = |name: &str, inc: f64| match pools {
            Some(p) => inc.max(-p.value(name)),
            None => inc,
        };
        let merch = self.pool_name("Merch");
        let other = self.pool_name("Other");
        let foliage = self.pool_name("Foliage");
        let merch_inc = floor(&merch, self.curve.merch_carbon_increment(age));
        let other_inc = floor(&other, self.curve.other_carbon_increment(age));
        let foliage_inc = floor(&foliage, self.curve.foliage_carbon_increment(age));
        [(merch, merch_inc), (other, other_inc), (foliage, foliage_inc)]
    }

    /// Root biomass after this year's above-ground growth, if the component has
    /// a root equation.
    pub fn root_biomass(&self, age: usize, pools: &StandPools) -> Option<f64> {
        let equation = self.root_biomass_equation?;
        let total_ag: f64 = self
            .above_ground_increments(age, Some(pools))
            .iter()
            .map(|(name, inc)| pools.value(name) + inc)
            .sum();
        Some(equation.root_biomass(total_ag))
    }

    fn increments(&self, age: usize, pools: Option<&StandPools>, stand_root_biomass: f64) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self.above_ground_increments(age, pools).into();

        if let (Some(pools), Some(equation)) = (pools, self.root_biomass_equation) {
            let root_biomass = self.root_biomass(age, pools).unwrap_or(0.0);
            let root_carbon = RootBiomassEquation::biomass_to_carbon(root_biomass);
            let props = equation.root_proportions(stand_root_biomass);

            let fine = self.pool_name("FineRoots");
            let coarse = self.pool_name("CoarseRoots");
            let fine_inc = root_carbon * props.fine - pools.value(&fine);
            let coarse_inc = root_carbon * props.coarse - pools.value(&coarse);
            out.push((fine, fine_inc));
            out.push((coarse, coarse_inc));
        }

        out
    }
}

/// Merged softwood + hardwood carbon curve for one stand. Immutable once cached.
#[derive(Debug, Default)]
pub struct StandBiomassCarbonCurve {
    components: Vec<StandComponent>,
    turnover_rates: Option<TurnoverRates>,
    maturity: OnceLock<Vec<f64>>,
}

impl StandBiomassCarbonCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, component: StandComponent) {
        self.components.push(component);
        self.maturity = OnceLock::new();
    }

    pub fn set_turnover_rates(&mut self, rates: Option<TurnoverRates>) {
        self.turnover_rates = rates;
    }

    pub fn turnover_rates(&self) -> Option<&TurnoverRates> {
        self.turnover_rates.as_ref()
    }

    pub fn components(&self) -> &[StandComponent] {
        &self.components
    }

    pub fn component(&self, species: SpeciesType) -> Option<&StandComponent> {
        self.components.iter().find(|c| c.species == species)
    }

    /// Carbon increments at `age`, keyed by pool name.
    ///
    /// Root pools are only reported when current pool values are supplied,
    /// since the root estimate depends on the standing above-ground carbon.
    pub fn increments(&self, age: usize, pools: Option<&StandPools>) -> HashMap<String, f64> {
        let stand_root_biomass: f64 = match pools {
            Some(p) => self
                .components
                .iter()
                .filter_map(|c| c.root_biomass(age, p))
                .sum(),
            None => 0.0,
        };

        self.components
            .iter()
            .flat_map(|c| c.increments(age, pools, stand_root_biomass))
            .collect()
    }

    pub fn above_ground_increment(&self, age: usize) -> AboveGroundBiomassCarbonIncrement {
        let mut inc = AboveGroundBiomassCarbonIncrement::default();
        for c in &self.components {
            let (merch, foliage, other) = (
                c.curve.merch_carbon_increment(age),
                c.curve.foliage_carbon_increment(age),
                c.curve.other_carbon_increment(age),
            );
            match c.species {
                SpeciesType::Softwood => {
                    inc.softwood_merch += merch;
                    inc.softwood_foliage += foliage;
                    inc.softwood_other += other;
                }
                SpeciesType::Hardwood => {
                    inc.hardwood_merch += merch;
                    inc.hardwood_foliage += foliage;
                    inc.hardwood_other += other;
                }
            }
        }
        inc
    }

    /// Total above-ground carbon by age, summed over components.
    pub fn above_ground_carbon_curve(&self) -> Vec<f64> {
        sum_curves(self.components.iter().map(|c| c.curve.above_ground_carbon_curve().collect::<Vec<f64>>()))
    }

    /// Total foliage carbon by age, summed over components.
    pub fn foliage_carbon_curve(&self) -> Vec<f64> {
        sum_curves(self.components.iter().map(|c| c.curve.foliage_carbon_curve().to_vec()))
    }

    /// Above-ground carbon at `age` relative to the stand's peak, in `[0, 1]`.
    pub fn maturity_at_age(&self, age: usize) -> f64 {
        let maturity = self.maturity.get_or_init(|| {
            let curve = self.above_ground_carbon_curve();
            let max = curve.iter().copied().fold(0.0_f64, f64::max);
            if max > 0.0 {
                curve.iter().map(|v| v / max).collect()
            } else {
                vec![0.0; curve.len()]
            }
        });
        match maturity.get(age) {
            Some(v) => *v,
            None => maturity.last().copied().unwrap_or(0.0),
        }
    }
}

fn sum_curves(curves: impl Iterator<Item = Vec<f64>>) -> Vec<f64> {
    let mut total: Vec<f64> = Vec::new();
    for curve in curves {
        if total.len() < curve.len() {
            total.resize(curve.len(), 0.0);
        }
        for (t, v) in total.iter_mut().zip(&curve) {
            *t += v;
        }
    }
    total
}
