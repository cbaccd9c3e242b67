//! Per-species carbon curve: merchantable, foliage and other carbon by age.

use serde::{Deserialize, Serialize};

/// Three parallel per-age carbon series for one stand component.
///
/// Setters grow the series as needed; getters never fail and read the last
/// stored value for ages past the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentBiomassCarbonCurve {
    merch: Vec<f64>,
    foliage: Vec<f64>,
    other: Vec<f64>,
}

impl ComponentBiomassCarbonCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroed series covering ages `0..=max_age`.
    pub fn with_max_age(max_age: usize) -> Self {
        Self {
            merch: vec![0.0; max_age + 1],
            foliage: vec![0.0; max_age + 1],
            other: vec![0.0; max_age + 1],
        }
    }

    pub fn set_merch_carbon_at_age(&mut self, age: usize, value: f64) {
        set_at(&mut self.merch, age, value);
    }

    pub fn set_foliage_carbon_at_age(&mut self, age: usize, value: f64) {
        set_at(&mut self.foliage, age, value);
    }

    pub fn set_other_carbon_at_age(&mut self, age: usize, value: f64) {
        set_at(&mut self.other, age, value);
    }

    pub fn merch_carbon_at_age(&self, age: usize) -> f64 {
        get_at(&self.merch, age)
    }

    pub fn foliage_carbon_at_age(&self, age: usize) -> f64 {
        get_at(&self.foliage, age)
    }

    pub fn other_carbon_at_age(&self, age: usize) -> f64 {
        get_at(&self.other, age)
    }

    /// Total above-ground carbon at `age`.
    pub fn above_ground_carbon_at_age(&self, age: usize) -> f64 {
        self.merch_carbon_at_age(age) + self.foliage_carbon_at_age(age) + self.other_carbon_at_age(age)
    }

    pub fn merch_carbon_increment(&self, age: usize) -> f64 {
        increment(&self.merch, age)
    }

    pub fn foliage_carbon_increment(&self, age: usize) -> f64 {
        increment(&self.foliage, age)
    }

    pub fn other_carbon_increment(&self, age: usize) -> f64 {
        increment(&self.other, age)
    }

    pub fn merch_carbon_curve(&self) -> &[f64] {
        &self.merch
    }

    pub fn foliage_carbon_curve(&self) -> &[f64] {
        &self.foliage
    }

    pub fn other_carbon_curve(&self) -> &[f64] {
        &self.other
    }

    /// Last age covered by the longest series (0 when empty).
    pub fn max_age(&self) -> usize {
        self.merch
            .len()
            .max(self.foliage.len())
            .max(self.other.len())
            .saturating_sub(1)
    }

    /// Lazy merch + foliage + other over ages `[0, max_age)`.
    ///
    /// The final age is excluded: it has no increment after it.
    pub fn above_ground_carbon_curve(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.max_age()).map(|age| self.above_ground_carbon_at_age(age))
    }
}

fn set_at(series: &mut Vec<f64>, age: usize, value: f64) {
    if series.len() <= age {
        series.resize(age + 1, 0.0);
    }
    series[age] = value;
}

fn get_at(series: &[f64], age: usize) -> f64 {
    match series.get(age) {
        Some(v) => *v,
        None => series.last().copied().unwrap_or(0.0),
    }
}

fn increment(series: &[f64], age: usize) -> f64 {
    if age + 1 >= series.len() {
        return 0.0;
    }
    series[age + 1] - series[age]
}
