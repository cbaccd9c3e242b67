//! Shared regression fixture: a mixed softwood/hardwood stand.

#![allow(dead_code)]

use std::path::PathBuf;

use growth_curves::domain::{CurveKey, PerdFactor, SpeciesType, YieldRow};
use growth_curves::growth::{StandGrowthCurve, YieldTable};
use growth_curves::io::PERD_COLUMNS;

pub const KEY: CurveKey = CurveKey {
    growth_curve_id: 101,
    spu_id: 7,
};

/// Softwood samples, ages 0..=65 every 5 years.
pub const SOFTWOOD_VOLUMES: [f64; 14] = [
    0.0, 0.0, 5.0, 10.0, 20.0, 40.0, 75.0, 130.0, 200.0, 250.0, 275.0, 280.0, 282.0, 282.0,
];

/// Hardwood samples, ages 0..=120 every 5 years.
pub const HARDWOOD_VOLUMES: [f64; 25] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 20.0, 52.0, 82.0, 105.0, 109.0, 121.0, 147.0, 160.0, 162.0,
    183.0, 215.0, 222.0, 157.0, 134.0, 113.0, 90.0, 68.0, 44.0, 22.0,
];

pub const SOFTWOOD_PERD: [f64; 33] = [
    0.940757947, 0.893308863, 26.74911954, -0.842754964, 0.634304739, 4.359026813,
    7.876122189, -1.768994003, 0.999038508, 1.031175277, -1.719625, -0.0001865, -0.0678935,
    -1.338323, -0.0003408, -0.115071, -1.365578, -0.0008351, -0.1792023, 0.789301498,
    409.5496953, 0.641263962, 0.777724244, 0.1019464, 0.085726225, 0.137384444, 0.088669801,
    0.119405194, 0.04787973, 1.7940000295639, 5.3899998664856, 3.00200009346008,
    5.51999998092651,
];

pub const HARDWOOD_PERD: [f64; 33] = [
    0.605526666, 0.968769544, 43.36460139, -1.094296331, 0.694702256, 4.864578887,
    204.6063969, -2.758123355, 0.999990336, 1.012284879, -2.226267, -0.004037, 0.2254254,
    -2.987039, -0.0065417, 0.4155504, -3.009557, -0.0057198, 0.0936287, 14.10121815,
    203.6218461, 0.706766368, 0.765715018, 0.140113889, 0.12107513, 0.110740086, 0.093784032,
    0.042379657, 0.019425819, 1.7940000295639, 5.3899998664856, 3.00200009346008,
    5.51999998092651,
];

pub fn rows_every_5_years(volumes: &[f64]) -> Vec<YieldRow> {
    volumes
        .iter()
        .enumerate()
        .map(|(i, v)| YieldRow::new(i * 5, *v))
        .collect()
}

pub fn mixed_stand_with_key(key: CurveKey) -> StandGrowthCurve {
    let mut stand = StandGrowthCurve::new(key);
    stand.add_yield_table(YieldTable::new(&rows_every_5_years(&SOFTWOOD_VOLUMES), SpeciesType::Softwood).unwrap());
    stand.add_yield_table(YieldTable::new(&rows_every_5_years(&HARDWOOD_VOLUMES), SpeciesType::Hardwood).unwrap());
    stand.set_perd_factor(SpeciesType::Softwood, PerdFactor::from_values(&SOFTWOOD_PERD).unwrap());
    stand.set_perd_factor(SpeciesType::Hardwood, PerdFactor::from_values(&HARDWOOD_PERD).unwrap());
    stand.process_stand_yield_tables();
    stand
}

pub fn mixed_stand() -> StandGrowthCurve {
    mixed_stand_with_key(KEY)
}

pub fn yields_csv(keys: &[CurveKey]) -> String {
    let mut csv = String::from("growth_curve_id,spu_id,species,age,merchantable_volume\n");
    for key in keys {
        for (species, volumes) in [("softwood", &SOFTWOOD_VOLUMES[..]), ("hardwood", &HARDWOOD_VOLUMES[..])] {
            for row in rows_every_5_years(volumes) {
                csv.push_str(&format!(
                    "{},{},{species},{},{}\n",
                    key.growth_curve_id, key.spu_id, row.age, row.volume
                ));
            }
        }
    }
    csv
}

pub fn perd_csv() -> String {
    let mut csv = format!("species,{}\n", PERD_COLUMNS.join(","));
    for (name, values) in [("softwood", SOFTWOOD_PERD), ("hardwood", HARDWOOD_PERD)] {
        let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        csv.push_str(&format!("{name},{}\n", row.join(",")));
    }
    csv
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("growth-curves-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
