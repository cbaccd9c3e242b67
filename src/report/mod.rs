//! Reporting utilities: per-stand summaries and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the conversion code stays clean and testable
//! - output changes are localized

use std::collections::BTreeMap;

use crate::carbon::StandBiomassCarbonCurve;
use crate::domain::{CurveKey, RunConfig, SpeciesType};
use crate::growth::StandGrowthCurve;
use crate::io::IngestedStands;

/// Headline numbers for one generated stand.
#[derive(Debug, Clone, PartialEq)]
pub struct StandSummary {
    pub key: CurveKey,
    pub species: Vec<SpeciesType>,
    pub stand_max_age: usize,
    pub max_volume_age: usize,
    pub max_volume: f64,
    /// Peak above-ground carbon and the first age it is reached.
    pub peak_carbon: f64,
    pub peak_carbon_age: usize,
    pub final_carbon: f64,
}

pub fn summarize_stand(stand: &StandGrowthCurve, carbon: &StandBiomassCarbonCurve) -> StandSummary {
    let curve = carbon.above_ground_carbon_curve();
    let (peak_carbon_age, peak_carbon) = curve
        .iter()
        .copied()
        .enumerate()
        .fold((0, 0.0), |best, (age, c)| if c > best.1 { (age, c) } else { best });

    StandSummary {
        key: stand.key(),
        species: carbon.components().iter().map(|c| c.species).collect(),
        stand_max_age: stand.stand_max_age(),
        max_volume_age: stand.stand_age_with_maximum_volume(),
        max_volume: stand.annual_stand_maximum_volume(),
        peak_carbon,
        peak_carbon_age,
        final_carbon: curve.last().copied().unwrap_or(0.0),
    }
}

/// Format the full run summary (ingest stats + one line per stand + failures).
pub fn format_run_summary(
    ingest: &IngestedStands,
    summaries: &[StandSummary],
    failures: &[(CurveKey, String)],
    config: &RunConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== gc - Growth Curve Carbon ===\n");
    out.push_str(&format!("Yields: {}\n", config.yields_path.display()));
    out.push_str(&format!("PERD: {}\n", config.perd_path.display()));
    out.push_str(&format!("Smoothing: {}\n", if config.smoothing { "on" } else { "off" }));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    for e in ingest.row_errors.iter().take(10) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }

    out.push_str(&format!("\nStands: {}\n", summaries.len()));
    out.push_str(&format!(
        "{:<24} {:<10} {:>7} {:>16} {:>18} {:>10}\n",
        "Key", "Groups", "MaxAge", "MaxVol@Age", "PeakC@Age", "FinalC"
    ));
    for s in summaries {
        let groups = s
            .species
            .iter()
            .map(|sp| match sp {
                SpeciesType::Softwood => "sw",
                SpeciesType::Hardwood => "hw",
            })
            .collect::<Vec<_>>()
            .join("+");
        out.push_str(&format!(
            "{:<24} {:<10} {:>7} {:>16} {:>18} {:>10.3}\n",
            s.key.to_string(),
            groups,
            s.stand_max_age,
            format!("{:.1}@{}", s.max_volume, s.max_volume_age),
            format!("{:.3}@{}", s.peak_carbon, s.peak_carbon_age),
            s.final_carbon
        ));
    }

    if !failures.is_empty() {
        out.push_str(&format!("\nFailed: {}\n", failures.len()));
        for (key, err) in failures {
            out.push_str(&format!("  {key}: {err}\n"));
        }
    }

    out
}

/// Format an increment map, one pool per line.
pub fn format_increments(key: CurveKey, age: usize, increments: &BTreeMap<String, f64>) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== gc - Increments ({key}, age {age}) ===\n"));
    if increments.is_empty() {
        out.push_str("(no carbon curve)\n");
        return out;
    }
    for (pool, value) in increments {
        out.push_str(&format!("{pool:<20} {value:>12.6}\n"));
    }
    let total: f64 = increments.values().sum();
    out.push_str(&format!("{:<20} {total:>12.6}\n", "Total"));
    out
}
