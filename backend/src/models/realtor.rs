//! Realtor model
//!
//! A realtor is a locality price-discovery service. It keeps a rolling log
//! of transactions on houses in its territory and summarises its locality
//! as a mean sale price and mean rent, recomputed every tick.

use crate::models::ids::{HouseId, PlotId, RealtorId};
use serde::{Deserialize, Serialize};

/// What a price record documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Sale,
    Rent,
    /// Both prices recorded without a transaction behind them
    Unknown,
}

/// One entry in a realtor's transaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub house: HouseId,

    /// Plot of the house when the record was made
    pub plot: PlotId,

    pub tick: usize,

    /// Zero unless the record documents a sale
    pub sale_price: f64,

    /// Zero unless the record documents a tenancy
    pub rent_price: f64,

    pub kind: RecordKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Realtor {
    pub id: RealtorId,
    pub plot: PlotId,

    /// Mean positive sale price across locality houses
    pub mean_price: f64,

    /// Mean positive rent across locality houses
    pub mean_rent: f64,

    pub records: Vec<PriceRecord>,

    /// Houses whose local realtors include this one
    pub locality_houses: Vec<HouseId>,
}

impl Realtor {
    pub fn new(id: RealtorId, plot: PlotId) -> Self {
        Self {
            id,
            plot,
            mean_price: 0.0,
            mean_rent: 0.0,
            records: Vec::new(),
            locality_houses: Vec::new(),
        }
    }

    /// Drop every record about `house`; returns how many were removed
    pub fn forget_house(&mut self, house: HouseId) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.house != house);
        before - self.records.len()
    }

    /// Drop records made before `oldest_tick`
    pub fn prune_before(&mut self, oldest_tick: usize) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.tick >= oldest_tick);
        before - self.records.len()
    }

    /// Records of one kind, most recent last
    pub fn records_of(&self, kind: RecordKind) -> impl Iterator<Item = &PriceRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}
