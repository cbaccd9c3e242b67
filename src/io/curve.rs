//! Read/write carbon curve JSON files.
//!
//! Curve JSON is the portable representation of a run:
//! - run metadata (tool, timestamp, smoothing toggle)
//! - per stand: key, stand max age, per-age merch / foliage / other carbon for
//!   each species group and the above-ground total

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::carbon::StandBiomassCarbonCurve;
use crate::domain::{CurveKey, SpeciesType};
use crate::error::AppError;
use crate::growth::StandGrowthCurve;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub smoothing: bool,
    pub stands: Vec<StandCurveRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandCurveRecord {
    pub key: CurveKey,
    pub stand_max_age: usize,
    pub components: Vec<ComponentCurveRecord>,
    pub above_ground: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCurveRecord {
    pub species: SpeciesType,
    pub forest_type: String,
    pub merch: Vec<f64>,
    pub foliage: Vec<f64>,
    pub other: Vec<f64>,
}

impl StandCurveRecord {
    pub fn new(stand: &StandGrowthCurve, carbon: &StandBiomassCarbonCurve) -> Self {
        let components = carbon
            .components()
            .iter()
            .map(|c| ComponentCurveRecord {
                species: c.species,
                forest_type: c.forest_type.clone(),
                merch: c.curve.merch_carbon_curve().to_vec(),
                foliage: c.curve.foliage_carbon_curve().to_vec(),
                other: c.curve.other_carbon_curve().to_vec(),
            })
            .collect();

        Self {
            key: stand.key(),
            stand_max_age: stand.stand_max_age(),
            components,
            above_ground: carbon.above_ground_carbon_curve(),
        }
    }
}

impl CurveFile {
    pub fn new(smoothing: bool, stands: Vec<StandCurveRecord>) -> Self {
        Self {
            tool: "gc".to_string(),
            generated_at: Utc::now(),
            smoothing,
            stands,
        }
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    write_curve_json_to(file, curve)
}

pub fn write_curve_json_to<W: Write>(writer: W, curve: &CurveFile) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
