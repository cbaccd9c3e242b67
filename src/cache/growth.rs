//! `VolumeToBiomassCarbonGrowth`: the facade simulation workers call.
//!
//! Each stand (growth curve + spatial unit) is converted at most once. The map
//! lock is held across check-then-create, so racing first requests for the
//! same key compute one curve and every caller receives the same `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::carbon::{AboveGroundBiomassCarbonIncrement, StandBiomassCarbonCurve, StandComponent};
use crate::convert::{BoudewynConverter, RawConverter};
use crate::domain::{CurveKey, ForestTypeConfiguration, SpeciesType, StandPools, TurnoverRates};
use crate::error::GrowthResult;
use crate::fit::Smoother;
use crate::growth::StandGrowthCurve;

pub struct VolumeToBiomassCarbonGrowth {
    converter: Box<dyn RawConverter>,
    smoother: Smoother,
    smoothing: AtomicBool,
    curves: Mutex<HashMap<CurveKey, Arc<StandBiomassCarbonCurve>>>,
}

impl Default for VolumeToBiomassCarbonGrowth {
    fn default() -> Self {
        Self::new(Box::new(BoudewynConverter), true)
    }
}

impl std::fmt::Debug for VolumeToBiomassCarbonGrowth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeToBiomassCarbonGrowth")
            .field("smoothing", &self.smoothing_enabled())
            .field("curves", &self.len())
            .finish_non_exhaustive()
    }
}

impl VolumeToBiomassCarbonGrowth {
    pub fn new(converter: Box<dyn RawConverter>, smoothing: bool) -> Self {
        Self {
            converter,
            smoother: Smoother::default(),
            smoothing: AtomicBool::new(smoothing),
            curves: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_smoother(mut self, smoother: Smoother) -> Self {
        self.smoother = smoother;
        self
    }

    /// Entries are immutable once inserted, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<CurveKey, Arc<StandBiomassCarbonCurve>>> {
        self.curves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_smoothing(&self, enabled: bool) {
        self.smoothing.store(enabled, Ordering::Relaxed);
    }

    pub fn smoothing_enabled(&self) -> bool {
        self.smoothing.load(Ordering::Relaxed)
    }

    /// Build and cache the carbon curve for `stand`, or return the cached one.
    ///
    /// `stand` must already have its yield tables processed.
    pub fn generate_biomass_carbon_curve(&self, stand: &StandGrowthCurve) -> GrowthResult<Arc<StandBiomassCarbonCurve>> {
        let key = stand.key();
        let mut curves = self.lock();
        if let Some(existing) = curves.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let smoothing = self.smoothing_enabled();
        let mut carbon = StandBiomassCarbonCurve::new();
        for species in SpeciesType::ALL {
            if !stand.has_yield_component(species) {
                continue;
            }

            let mut curve = self.converter.convert(stand, species)?;
            if smoothing {
                let mut smoothed = curve.clone();
                match self.smoother.smooth(stand, &mut smoothed, species) {
                    Ok(_) => curve = smoothed,
                    Err(err) => warn!(%key, %species, error = %err, "smoothing failed; keeping raw curve"),
                }
            }

            let config = stand
                .forest_type_configuration(species)
                .cloned()
                .unwrap_or_else(|| ForestTypeConfiguration::for_species(species));
            carbon.add_component(StandComponent::new(
                species,
                config.forest_type,
                config.root_biomass_equation,
                curve,
            ));
        }
        carbon.set_turnover_rates(stand.turnover_rates().copied());

        debug!(%key, components = carbon.components().len(), smoothing, "generated carbon curve");

        let carbon = Arc::new(carbon);
        curves.insert(key, Arc::clone(&carbon));
        Ok(carbon)
    }

    pub fn is_biomass_carbon_curve_available(&self, key: CurveKey) -> bool {
        self.lock().contains_key(&key)
    }

    pub fn biomass_carbon_curve(&self, key: CurveKey) -> Option<Arc<StandBiomassCarbonCurve>> {
        self.lock().get(&key).cloned()
    }

    /// Carbon increments at `age`, keyed by pool name. Empty when `key` is not cached.
    pub fn biomass_carbon_increments(&self, key: CurveKey, age: usize, pools: Option<&StandPools>) -> HashMap<String, f64> {
        self.biomass_carbon_curve(key)
            .map(|c| c.increments(age, pools))
            .unwrap_or_default()
    }

    pub fn above_ground_increment(&self, key: CurveKey, age: usize) -> Option<AboveGroundBiomassCarbonIncrement> {
        self.biomass_carbon_curve(key).map(|c| c.above_ground_increment(age))
    }

    pub fn above_ground_carbon_curve(&self, key: CurveKey) -> Vec<f64> {
        self.biomass_carbon_curve(key)
            .map(|c| c.above_ground_carbon_curve())
            .unwrap_or_default()
    }

    pub fn foliage_carbon_curve(&self, key: CurveKey) -> Vec<f64> {
        self.biomass_carbon_curve(key)
            .map(|c| c.foliage_carbon_curve())
            .unwrap_or_default()
    }

    /// Zero when `key` is not cached.
    pub fn maturity_at_age(&self, key: CurveKey, age: usize) -> f64 {
        self.biomass_carbon_curve(key)
            .map(|c| c.maturity_at_age(age))
            .unwrap_or(0.0)
    }

    pub fn turnover_rates(&self, key: CurveKey) -> Option<TurnoverRates> {
        self.biomass_carbon_curve(key).and_then(|c| c.turnover_rates().copied())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every cached curve. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
