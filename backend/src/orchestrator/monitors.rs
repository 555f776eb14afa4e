//! Per-tick monitors
//!
//! Counters and aggregates reset at the start of every tick and filled by
//! the phases as they run. Purely for reporting; no phase reads them back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Monitors {
    pub median_price_for_sale: f64,
    pub median_price_for_rent: f64,

    pub n_natural_exit: usize,
    pub n_entry: usize,
    pub n_discouraged: usize,
    pub n_discouraged_mortgage: usize,
    pub n_discouraged_rent: usize,
    pub n_discouraged_btl: usize,

    pub n_poor_mortgage: usize,
    pub n_evicted_mortgage: usize,
    pub n_evicted_rent: usize,
    /// Households made homeless by the participation classifier
    pub n_homeless: usize,
    pub n_force_sell: usize,
    pub mean_income_evicted_mortgage: f64,
    pub mean_income_evicted_rent: f64,

    pub n_enter_market_mortgage: usize,
    pub n_enter_market_rent: usize,
    pub n_enter_market_btl: usize,

    pub n_offers: usize,
    pub n_chains_rejected: usize,
    pub n_sales: usize,
    pub n_rentals: usize,
    /// Households that physically moved house
    pub moves: usize,

    pub n_constructed: usize,
    pub n_demolished: usize,
    pub n_rate_resets: usize,
}

impl Monitors {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
