use serde::{Deserialize, Serialize};

/// One year of above-ground carbon increments for a whole stand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AboveGroundBiomassCarbonIncrement {
    pub softwood_merch: f64,
    pub softwood_foliage: f64,
    pub softwood_other: f64,
    pub hardwood_merch: f64,
    pub hardwood_foliage: f64,
    pub hardwood_other: f64,
}

impl AboveGroundBiomassCarbonIncrement {
    pub fn total(&self) -> f64 {
        self.softwood_merch
            + self.softwood_foliage
            + self.softwood_other
            + self.hardwood_merch
            + self.hardwood_foliage
            + self.hardwood_other
    }
}
