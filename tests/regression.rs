//! End-to-end regression on the mixed softwood/hardwood stand.

mod common;

use approx::assert_relative_eq;
use growth_curves::app::pipeline::{run_curves, run_increments};
use growth_curves::cache::VolumeToBiomassCarbonGrowth;
use growth_curves::convert::{BoudewynConverter, RawConverter};
use growth_curves::domain::{CurveKey, RunConfig, SpeciesType, StandPools};
use growth_curves::io::read_curve_json;

use common::{KEY, mixed_stand, perd_csv, scratch_dir, yields_csv};

fn config_in(dir: &std::path::Path, keys: &[CurveKey], smoothing: bool) -> RunConfig {
    let yields_path = dir.join("yields.csv");
    let perd_path = dir.join("perd.csv");
    std::fs::write(&yields_path, yields_csv(keys)).unwrap();
    std::fs::write(&perd_path, perd_csv()).unwrap();
    RunConfig {
        yields_path,
        perd_path,
        turnover_path: None,
        smoothing,
        export_curve: None,
        only: None,
    }
}

#[test]
fn stand_aggregates_match_reference() {
    let stand = mixed_stand();
    assert_eq!(stand.stand_max_age(), 120);
    assert_eq!(stand.stand_age_with_maximum_volume(), 85);
    assert_relative_eq!(stand.annual_stand_maximum_volume(), 504.0, epsilon = 1e-9);
    assert_eq!(stand.stand_softwood_volume_ratio_at_age(0), 1.0);
}

#[test]
fn smoothed_curves_match_reference() {
    let cache = VolumeToBiomassCarbonGrowth::default();
    let carbon = cache.generate_biomass_carbon_curve(&mixed_stand()).unwrap();

    let sw = &carbon.component(SpeciesType::Softwood).unwrap().curve;
    assert_relative_eq!(sw.merch_carbon_at_age(26), 14.3517, max_relative = 1e-3);
    assert_relative_eq!(sw.foliage_carbon_at_age(26), 3.61423, max_relative = 1e-3);
    assert_relative_eq!(sw.other_carbon_at_age(26), 25.0463, max_relative = 1e-3);
    assert_relative_eq!(sw.foliage_carbon_at_age(1), 0.0656408, max_relative = 1e-3);

    let hw = &carbon.component(SpeciesType::Hardwood).unwrap().curve;
    assert_relative_eq!(hw.merch_carbon_at_age(31), 8.90573, max_relative = 1e-3);
    assert_relative_eq!(hw.foliage_carbon_at_age(31), 0.262974, max_relative = 1e-3);
    assert_relative_eq!(hw.other_carbon_at_age(31), 2.5505, max_relative = 1e-3);

    for c in carbon.components() {
        for age in 0..=120 {
            assert!(c.curve.merch_carbon_at_age(age) >= 0.0);
            assert!(c.curve.foliage_carbon_at_age(age) >= 0.0);
        }
    }
}

#[test]
fn smoothing_only_touches_low_ages() {
    let stand = mixed_stand();
    let cache = VolumeToBiomassCarbonGrowth::default();
    let carbon = cache.generate_biomass_carbon_curve(&stand).unwrap();
    let raw = BoudewynConverter.convert(&stand, SpeciesType::Softwood).unwrap();
    let sw = &carbon.component(SpeciesType::Softwood).unwrap().curve;

    for age in 27..=120 {
        assert_eq!(sw.merch_carbon_at_age(age), raw.merch_carbon_at_age(age));
        assert_eq!(sw.other_carbon_at_age(age), raw.other_carbon_at_age(age));
    }
    assert_ne!(sw.merch_carbon_at_age(20), raw.merch_carbon_at_age(20));
}

#[test]
fn csv_pipeline_generates_every_stand() {
    let dir = scratch_dir("pipeline");
    let keys = [KEY, CurveKey::new(102, 7), CurveKey::new(101, 8)];
    let mut config = config_in(&dir, &keys, true);
    config.export_curve = Some(dir.join("curves.json"));

    let run = run_curves(&config).unwrap();
    assert_eq!(run.summaries.len(), 3);
    assert!(run.failures.is_empty());
    assert_eq!(run.ingest.rows_used, 3 * (14 + 25));
    assert_eq!(run.cache.len(), 3);

    // Identical yields give identical curves regardless of key.
    let a = run.cache.above_ground_carbon_curve(KEY);
    let b = run.cache.above_ground_carbon_curve(CurveKey::new(102, 7));
    assert_eq!(a, b);

    let path = config.export_curve.clone().unwrap();
    growth_curves::io::write_curve_json(&path, &run.curve_file()).unwrap();
    let file = read_curve_json(&path).unwrap();
    assert!(file.smoothing);
    assert_eq!(file.stands.len(), 3);
    assert_eq!(file.stands[0].key, KEY);
    assert_eq!(file.stands[0].above_ground, a);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn increments_for_one_stand() {
    let dir = scratch_dir("increments");
    let config = config_in(&dir, &[KEY, CurveKey::new(5, 5)], false);

    let out = run_increments(&config, KEY, 40, None).unwrap();
    assert_eq!(out.increments.len(), 6);
    let stand = mixed_stand();
    let raw = BoudewynConverter.convert(&stand, SpeciesType::Softwood).unwrap();
    assert_relative_eq!(out.increments["SoftwoodMerch"], raw.merch_carbon_increment(40), epsilon = 1e-12);

    let pools = StandPools::new().with("HardwoodMerch", 1.0);
    let out = run_increments(&config, KEY, 40, Some(&pools)).unwrap();
    assert_eq!(out.increments.len(), 10);
    assert!(out.increments.contains_key("HardwoodCoarseRoots"));

    let missing = run_increments(&config, CurveKey::new(9, 9), 40, None).unwrap_err();
    assert_eq!(missing.exit_code(), 3);

    std::fs::remove_dir_all(&dir).ok();
}
