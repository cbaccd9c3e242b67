//! Dense, per-year yield tables built from sparse volume samples.
//!
//! Construction runs in three passes over a zeroed `0..=max_age` array:
//!
//! 1. merge: each row's volume is added into its age bucket (duplicates sum)
//! 2. tail-fill: a zero following a non-zero value inherits it, which carries the
//!    last sample forward over trailing zeros
//! 3. interpolate: linear interpolation between knots spaced `age_interval` apart,
//!    starting at the first sampled age
//!
//! Tables are immutable once built.

use std::ops::Index;

use crate::domain::{SpeciesType, YieldRow};
use crate::error::{GrowthError, GrowthResult};

#[derive(Debug, Clone, PartialEq)]
pub struct YieldTable {
    species: SpeciesType,
    max_age: usize,
    age_interval: usize,
    volumes: Vec<f64>,
    total_volume: f64,
}

impl YieldTable {
    pub fn new(rows: &[YieldRow], species: SpeciesType) -> GrowthResult<Self> {
        let max_age = rows
            .iter()
            .map(|r| r.age)
            .max()
            .ok_or(GrowthError::EmptyYieldTable)?;

        let mut ages: Vec<usize> = rows.iter().map(|r| r.age).collect();
        ages.sort_unstable();
        ages.dedup();
        let (first_age, age_interval) = match ages.as_slice() {
            [first, second, ..] => (*first, second - first),
            [only] => (*only, (*only).max(1)),
            [] => return Err(GrowthError::EmptyYieldTable),
        };

        let mut volumes = vec![0.0; max_age + 1];
        for row in rows {
            volumes[row.age] += row.volume;
        }

        fill_tail(&mut volumes);
        interpolate(&mut volumes, first_age, age_interval);

        let total_volume = volumes.iter().sum();

        Ok(Self {
            species,
            max_age,
            age_interval,
            volumes,
            total_volume,
        })
    }

    pub fn species(&self) -> SpeciesType {
        self.species
    }

    pub fn max_age(&self) -> usize {
        self.max_age
    }

    pub fn age_interval(&self) -> usize {
        self.age_interval
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    /// Volume at `age`. Ages past `max_age` are an error; use `volume_clamped`
    /// for plateau reads.
    pub fn volume_at(&self, age: usize) -> GrowthResult<f64> {
        self.volumes
            .get(age)
            .copied()
            .ok_or(GrowthError::AgeOutOfRange {
                age,
                max_age: self.max_age,
            })
    }

    /// Volume at `age`, holding the last tabulated value past `max_age`.
    pub fn volume_clamped(&self, age: usize) -> f64 {
        self.volumes[age.min(self.max_age)]
    }
}

impl Index<usize> for YieldTable {
    type Output = f64;

    fn index(&self, age: usize) -> &f64 {
        &self.volumes[age]
    }
}

fn fill_tail(volumes: &mut [f64]) {
    for age in 1..volumes.len() {
        if volumes[age - 1] != volumes[age] && volumes[age] == 0.0 {
            volumes[age] = volumes[age - 1];
        }
    }
}

/// Knots start at the first sampled age; younger ages ramp up from the origin.
fn interpolate(volumes: &mut [f64], first_age: usize, age_interval: usize) {
    let max_age = volumes.len() - 1;
    let y_first = volumes[first_age];
    for age in 0..first_age {
        volumes[age] = linear(age, 0, first_age, 0.0, y_first);
    }
    for x0 in (first_age..max_age).step_by(age_interval) {
        let x1 = (x0 + age_interval).min(max_age);
        let y0 = volumes[x0];
        let y1 = volumes[x1];
        for age in x0..x1 {
            volumes[age] = linear(age, x0, x1, y0, y1);
        }
    }
}

fn linear(x: usize, x0: usize, x1: usize, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return (y0 + y1) / 2.0;
    }
    y0 + (y1 - y0) * (x - x0) as f64 / (x1 - x0) as f64
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const A_INTERPOLATED: [f64; 66] = [
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 12.0, 14.0,
        16.0, 18.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0, 47.0, 54.0, 61.0, 68.0, 75.0, 86.0, 97.0,
        108.0, 119.0, 130.0, 144.0, 158.0, 172.0, 186.0, 200.0, 210.0, 220.0, 230.0, 240.0, 250.0,
        255.0, 260.0, 265.0, 270.0, 275.0, 276.0, 277.0, 278.0, 279.0, 280.0, 280.4, 280.8, 281.2,
        281.6, 282.0, 282.0, 282.0, 282.0, 282.0, 282.0,
    ];

    #[test]
    fn interpolates_sparse_samples() {
        let table = YieldTable::new(&rows_every_5_years(&A_VOLUMES), SpeciesType::Softwood).unwrap();
        assert_eq!(table.max_age(), 65);
        assert_eq!(table.age_interval(), 5);
        assert_eq!(table.volumes().len(), 66);
        for (age, expected) in A_INTERPOLATED.iter().enumerate() {
            assert!(
                (table[age] - expected).abs() < 1e-9,
                "age {age}: {} != {expected}",
                table[age]
            );
        }
        let expected_total: f64 = A_INTERPOLATED.iter().sum();
        assert!((table.total_volume() - expected_total).abs() < 1e-9);
    }

    #[test]
    fn sampled_ages_keep_their_values() {
        let table = YieldTable::new(&rows_every_5_years(&C_VOLUMES), SpeciesType::Hardwood).unwrap();
        for (i, v) in C_VOLUMES.iter().enumerate() {
            assert_eq!(table[i * 5], *v);
        }
        assert!((table[26] - 4.0).abs() < 1e-9);
        assert!((table[31] - 26.4).abs() < 1e-9);
        assert!((table[85] - 222.0).abs() < 1e-9);
        assert!((table[86] - 209.0).abs() < 1e-9);
        assert!((table[120] - 22.0).abs() < 1e-9);
    }

    #[test]
    fn offset_samples_keep_their_values() {
        let rows = [YieldRow::new(3, 10.0), YieldRow::new(8, 20.0), YieldRow::new(13, 30.0)];
        let table = YieldTable::new(&rows, SpeciesType::Softwood).unwrap();
        for row in &rows {
            assert_eq!(table[row.age], row.volume, "age {}", row.age);
        }
        assert_eq!(table[0], 0.0);
        assert!((table[1] - 10.0 / 3.0).abs() < 1e-12);
        assert!((table[5] - 14.0).abs() < 1e-12);
        assert!((table[11] - 26.0).abs() < 1e-12);
    }

    #[test]
    fn trailing_zeros_hold_last_sample() {
        let table = YieldTable::new(&rows_every_5_years(&B_VOLUMES), SpeciesType::Softwood).unwrap();
        assert_eq!(table.max_age(), 95);
        for age in 65..=95 {
            assert_eq!(table[age], 282.0, "age {age}");
        }
    }

    #[test]
    fn duplicate_ages_are_summed() {
        let rows = [
            YieldRow::new(0, 0.0),
            YieldRow::new(10, 30.0),
            YieldRow::new(10, 20.0),
        ];
        let table = YieldTable::new(&rows, SpeciesType::Softwood).unwrap();
        assert_eq!(table.age_interval(), 10);
        assert_eq!(table[10], 50.0);
        assert!((table[5] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn single_sample_table_ramps_from_origin() {
        let table = YieldTable::new(&[YieldRow::new(4, 8.0)], SpeciesType::Softwood).unwrap();
        assert_eq!(table.max_age(), 4);
        assert_eq!(table.volumes(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn out_of_range_lookup_is_an_error() {
        let table = YieldTable::new(&rows_every_5_years(&A_VOLUMES), SpeciesType::Softwood).unwrap();
        assert_eq!(
            table.volume_at(66),
            Err(GrowthError::AgeOutOfRange { age: 66, max_age: 65 })
        );
        assert_eq!(table.volume_clamped(500), 282.0);
    }

    #[test]
    fn empty_rows_are_rejected() {
        assert_eq!(
            YieldTable::new(&[], SpeciesType::Hardwood),
            Err(GrowthError::EmptyYieldTable)
        );
    }
}
