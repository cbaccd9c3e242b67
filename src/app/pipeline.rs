//! Shared run logic for the `gc` subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> stand processing -> carbon curve generation (parallel) -> summaries
//!
//! The subcommand handlers in `app` then only deal with presentation.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::cache::VolumeToBiomassCarbonGrowth;
use crate::carbon::StandBiomassCarbonCurve;
use crate::domain::{CurveKey, RunConfig, StandPools};
use crate::error::AppError;
use crate::growth::StandGrowthCurve;
use crate::io::{CurveFile, IngestedStands, StandCurveRecord};
use crate::report::{StandSummary, summarize_stand};

/// All computed outputs of a single `gc curve` run.
#[derive(Debug)]
pub struct RunOutput {
    pub ingest: IngestedStands,
    pub cache: Arc<VolumeToBiomassCarbonGrowth>,
    pub summaries: Vec<StandSummary>,
    pub failures: Vec<(CurveKey, String)>,
}

impl RunOutput {
    /// Curve JSON for every stand that generated successfully.
    pub fn curve_file(&self) -> CurveFile {
        let stands = self
            .ingest
            .stands
            .iter()
            .filter_map(|stand| {
                let carbon = self.cache.biomass_carbon_curve(stand.key())?;
                Some(StandCurveRecord::new(stand, &carbon))
            })
            .collect();
        CurveFile::new(self.cache.smoothing_enabled(), stands)
    }
}

/// Load inputs and generate carbon curves for every stand.
pub fn run_curves(config: &RunConfig) -> Result<RunOutput, AppError> {
    let ingest = crate::io::load_stands(config)?;
    if !ingest.row_errors.is_empty() {
        warn!(skipped = ingest.row_errors.len(), "yield rows skipped during ingest");
    }

    let cache = Arc::new(VolumeToBiomassCarbonGrowth::default());
    cache.set_smoothing(config.smoothing);

    let (summaries, failures) = generate_all(&cache, &ingest.stands);
    info!(
        stands = ingest.stands.len(),
        generated = summaries.len(),
        failed = failures.len(),
        "carbon curves generated"
    );

    if summaries.is_empty() {
        let detail = failures
            .first()
            .map(|(key, err)| format!(" (first failure: {key}: {err})"))
            .unwrap_or_default();
        return Err(AppError::new(4, format!("No carbon curves could be generated{detail}.")));
    }

    Ok(RunOutput {
        ingest,
        cache,
        summaries,
        failures,
    })
}

/// Generate every stand against one shared cache, in parallel.
///
/// Results come back in stand order. Failed stands are reported, not fatal.
pub fn generate_all(
    cache: &VolumeToBiomassCarbonGrowth,
    stands: &[StandGrowthCurve],
) -> (Vec<StandSummary>, Vec<(CurveKey, String)>) {
    let results: Vec<(CurveKey, Result<Arc<StandBiomassCarbonCurve>, String>)> = stands
        .par_iter()
        .map(|stand| {
            let result = cache.generate_biomass_carbon_curve(stand).map_err(|e| e.to_string());
            (stand.key(), result)
        })
        .collect();

    let mut summaries = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (stand, (key, result)) in stands.iter().zip(results) {
        match result {
            Ok(carbon) => summaries.push(summarize_stand(stand, &carbon)),
            Err(err) => {
                warn!(%key, error = %err, "carbon curve generation failed");
                failures.push((key, err));
            }
        }
    }
    (summaries, failures)
}

/// Increments of one stand at one age, sorted by pool name.
#[derive(Debug, Clone)]
pub struct IncrementOutput {
    pub key: CurveKey,
    pub age: usize,
    pub increments: BTreeMap<String, f64>,
}

/// Load only the requested stand, generate its curve and read its increments.
pub fn run_increments(
    config: &RunConfig,
    key: CurveKey,
    age: usize,
    pools: Option<&StandPools>,
) -> Result<IncrementOutput, AppError> {
    let config = RunConfig {
        only: Some(key),
        ..config.clone()
    };
    let ingest = crate::io::load_stands(&config)?;
    let stand = ingest
        .stands
        .iter()
        .find(|s| s.key() == key)
        .ok_or_else(|| AppError::new(3, format!("No yield rows for {key}.")))?;

    let cache = VolumeToBiomassCarbonGrowth::default();
    cache.set_smoothing(config.smoothing);
    cache.generate_biomass_carbon_curve(stand)?;

    let increments = cache.biomass_carbon_increments(key, age, pools).into_iter().collect();
    cache.clear();

    Ok(IncrementOutput { key, age, increments })
}
