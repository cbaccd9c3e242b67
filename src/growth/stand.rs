//! Stand-level growth curve: softwood and hardwood yield tables merged onto one
//! dense age axis.

use std::collections::BTreeMap;

use crate::domain::{CurveKey, ForestTypeConfiguration, PerdFactor, SpeciesType, TurnoverRates};
use crate::growth::YieldTable;

/// Yield tables, partition parameters and derived stand totals for one curve key.
///
/// Call `process_stand_yield_tables` after the last table is added; the
/// derived accessors read the arrays it builds.
#[derive(Debug, Clone, Default)]
pub struct StandGrowthCurve {
    key: CurveKey,
    softwood_tables: Vec<YieldTable>,
    hardwood_tables: Vec<YieldTable>,
    perd_factors: BTreeMap<SpeciesType, PerdFactor>,
    forest_types: BTreeMap<SpeciesType, ForestTypeConfiguration>,
    turnover_rates: Option<TurnoverRates>,

    stand_max_age: usize,
    total_volume: Vec<f64>,
    softwood_ratio: Vec<f64>,
    max_volume_age: usize,
    max_volume: f64,
}

impl StandGrowthCurve {
    pub fn new(key: CurveKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    pub fn key(&self) -> CurveKey {
        self.key
    }

    pub fn add_yield_table(&mut self, table: YieldTable) {
        match table.species() {
            SpeciesType::Softwood => self.softwood_tables.push(table),
            SpeciesType::Hardwood => self.hardwood_tables.push(table),
        }
    }

    pub fn yield_tables(&self, species: SpeciesType) -> &[YieldTable] {
        match species {
            SpeciesType::Softwood => &self.softwood_tables,
            SpeciesType::Hardwood => &self.hardwood_tables,
        }
    }

    pub fn has_yield_component(&self, species: SpeciesType) -> bool {
        !self.yield_tables(species).is_empty()
    }

    /// Build the dense stand arrays from the owned tables.
    ///
    /// Shorter tables hold their last value up to the stand's max age. The
    /// softwood share is 1.0 everywhere when the stand has no hardwood table,
    /// and 1.0 at ages where a mixed stand has no volume at all.
    pub fn process_stand_yield_tables(&mut self) {
        self.stand_max_age = self
            .softwood_tables
            .iter()
            .chain(&self.hardwood_tables)
            .map(YieldTable::max_age)
            .max()
            .unwrap_or(0);

        let ages = 0..=self.stand_max_age;
        let softwood: Vec<f64> = ages.clone().map(|age| summed_volume(&self.softwood_tables, age)).collect();
        let hardwood: Vec<f64> = ages.map(|age| summed_volume(&self.hardwood_tables, age)).collect();

        let has_hardwood = !self.hardwood_tables.is_empty();
        self.total_volume = softwood.iter().zip(&hardwood).map(|(sw, hw)| sw + hw).collect();
        self.softwood_ratio = softwood
            .iter()
            .zip(&hardwood)
            .map(|(sw, hw)| {
                if !has_hardwood {
                    return 1.0;
                }
                let ratio = sw / (sw + hw);
                if ratio.is_nan() { 1.0 } else { ratio }
            })
            .collect();

        // Strict `>` keeps the earliest age on ties.
        self.max_volume = 0.0;
        self.max_volume_age = 0;
        for (age, volume) in self.total_volume.iter().enumerate() {
            if *volume > self.max_volume {
                self.max_volume = *volume;
                self.max_volume_age = age;
            }
        }
    }

    pub fn stand_max_age(&self) -> usize {
        self.stand_max_age
    }

    /// Total volume at `age`; ages past the stand's max age read the last value.
    pub fn stand_total_volume_at_age(&self, age: usize) -> f64 {
        clamped(&self.total_volume, age, 0.0)
    }

    /// Softwood share of the total volume at `age`, clamped like the total.
    pub fn stand_softwood_volume_ratio_at_age(&self, age: usize) -> f64 {
        clamped(&self.softwood_ratio, age, 1.0)
    }

    /// First age at which the stand reaches its maximum total volume.
    pub fn stand_age_with_maximum_volume(&self) -> usize {
        self.max_volume_age
    }

    pub fn annual_stand_maximum_volume(&self) -> f64 {
        self.max_volume
    }

    pub fn set_perd_factor(&mut self, species: SpeciesType, factor: PerdFactor) {
        self.perd_factors.insert(species, factor);
    }

    pub fn perd_factor(&self, species: SpeciesType) -> Option<&PerdFactor> {
        self.perd_factors.get(&species)
    }

    pub fn set_forest_type_configuration(&mut self, species: SpeciesType, config: ForestTypeConfiguration) {
        self.forest_types.insert(species, config);
    }

    pub fn forest_type_configuration(&self, species: SpeciesType) -> Option<&ForestTypeConfiguration> {
        self.forest_types.get(&species)
    }

    pub fn set_turnover_rates(&mut self, rates: TurnoverRates) {
        self.turnover_rates = Some(rates);
    }

    pub fn turnover_rates(&self) -> Option<&TurnoverRates> {
        self.turnover_rates.as_ref()
    }
}

fn summed_volume(tables: &[YieldTable], age: usize) -> f64 {
    tables.iter().map(|t| t.volume_clamped(age)).sum()
}

fn clamped(values: &[f64], age: usize, empty: f64) -> f64 {
    match values.last() {
        Some(last) => values.get(age).copied().unwrap_or(*last),
        None => empty,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::growth::yield_table::fixtures::{A_VOLUMES, C_VOLUMES, rows_every_5_years};

    /// PERD factors for a softwood leading species (table id column dropped).
    pub const SW_PERD: [f64; 33] = [
        0.940757947, 0.893308863, 26.74911954, -0.842754964, 0.634304739, 4.359026813,
        7.876122189, -1.768994003, 0.999038508, 1.031175277, -1.719625, -0.0001865, -0.0678935,
        -1.338323, -0.0003408, -0.115071, -1.365578, -0.0008351, -0.1792023, 0.789301498,
        409.5496953, 0.641263962, 0.777724244, 0.1019464, 0.085726225, 0.137384444, 0.088669801,
        0.119405194, 0.04787973, 1.7940000295639, 5.3899998664856, 3.00200009346008,
        5.51999998092651,
    ];

    /// PERD factors for a hardwood leading species (table id column dropped).
    pub const HW_PERD: [f64; 33] = [
        0.605526666, 0.968769544, 43.36460139, -1.094296331, 0.694702256, 4.864578887,
        204.6063969, -2.758123355, 0.999990336, 1.012284879, -2.226267, -0.004037, 0.2254254,
        -2.987039, -0.0065417, 0.4155504, -3.009557, -0.0057198, 0.0936287, 14.10121815,
        203.6218461, 0.706766368, 0.765715018, 0.140113889, 0.12107513, 0.110740086, 0.093784032,
        0.042379657, 0.019425819, 1.7940000295639, 5.3899998664856, 3.00200009346008,
        5.51999998092651,
    ];

    /// Mixed stand: softwood table over 0..=65, hardwood table over 0..=120.
    pub fn mixed_stand() -> StandGrowthCurve {
        let mut stand = StandGrowthCurve::new(CurveKey::new(101, 7));
        stand.add_yield_table(
            YieldTable::new(&rows_every_5_years(&A_VOLUMES), SpeciesType::Softwood).unwrap(),
        );
        stand.add_yield_table(
            YieldTable::new(&rows_every_5_years(&C_VOLUMES), SpeciesType::Hardwood).unwrap(),
        );
        stand.set_perd_factor(SpeciesType::Softwood, PerdFactor::from_values(&SW_PERD).unwrap());
        stand.set_perd_factor(SpeciesType::Hardwood, PerdFactor::from_values(&HW_PERD).unwrap());
        stand.process_stand_yield_tables();
        stand
    }
}
