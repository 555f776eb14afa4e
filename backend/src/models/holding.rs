//! Per-house financial record
//!
//! Every house a household owns has exactly one [`Holding`] in that
//! household's portfolio, keyed by house id. The holding carries the debt
//! secured on the house and the rent it earns.

use crate::finance::repayment_for;
use crate::models::ids::HouseId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub house: HouseId,

    /// Outstanding mortgage balance
    pub balance: f64,

    /// Principal at origination (basis for rate resets)
    pub initial: f64,

    /// Repayment due each tick
    pub repayment: f64,

    /// Locked per-tick interest rate
    pub rate: f64,

    /// Ticks left on the fixed-rate deal (`None` for debt-free holdings)
    pub rate_term: Option<usize>,

    /// Ticks left on the mortgage (`None` for debt-free holdings)
    pub mortgage_term: Option<usize>,

    /// Rent received per tick from a tenant of this house
    pub rent_income: f64,
}

impl Holding {
    /// A holding financed by a new repayment mortgage
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::models::{Holding, HouseId};
    ///
    /// let h = Holding::financed(HouseId(1), 100_000.0, 0.0075, 100, 8);
    /// assert_eq!(h.balance, 100_000.0);
    /// assert!(h.repayment > 1_000.0);
    /// ```
    pub fn financed(
        house: HouseId,
        principal: f64,
        rate: f64,
        mortgage_term: usize,
        rate_term: usize,
    ) -> Self {
        Self {
            house,
            balance: principal,
            initial: principal,
            repayment: repayment_for(principal, rate, mortgage_term),
            rate,
            rate_term: Some(rate_term),
            mortgage_term: Some(mortgage_term),
            rent_income: 0.0,
        }
    }

    /// A holding bought outright
    pub fn outright(house: HouseId) -> Self {
        Self {
            house,
            balance: 0.0,
            initial: 0.0,
            repayment: 0.0,
            rate: 0.0,
            rate_term: None,
            mortgage_term: None,
            rent_income: 0.0,
        }
    }

    /// Clear all debt on the holding, keeping its rent income
    pub fn pay_off(&mut self) {
        self.balance = 0.0;
        self.initial = 0.0;
        self.repayment = 0.0;
        self.rate = 0.0;
        self.rate_term = None;
        self.mortgage_term = None;
    }

    /// Net proceeds of selling the house at `price`
    pub fn equity_at(&self, price: f64) -> f64 {
        price - self.balance
    }

    /// Deduct one repayment; a cleared balance stops further repayments
    pub fn apply_repayment(&mut self) {
        self.balance -= self.repayment;
        if self.balance <= 0.0 {
            self.balance = 0.0;
            self.repayment = 0.0;
        }
    }

    /// Whether the fixed-rate deal has expired on a live mortgage
    pub fn needs_rate_reset(&self) -> bool {
        self.rate_term == Some(0) && self.repayment > 0.0
    }

    /// Move the holding onto the prevailing rate with a fresh fixed term
    ///
    /// When the rate changes the repayment is recomputed from the initial
    /// principal over the full mortgage duration, not from the amortised
    /// balance. Returns whether the repayment changed.
    pub fn reset_rate(&mut self, prevailing: f64, mortgage_periods: usize, new_rate_term: usize) -> bool {
        let changed = self.rate != prevailing;
        if changed {
            self.repayment = repayment_for(self.initial, prevailing, mortgage_periods);
        }
        self.rate = prevailing;
        self.rate_term = Some(new_rate_term);
        changed
    }

    /// Count one tick off the fixed-rate and mortgage terms
    pub fn count_down_terms(&mut self) {
        if let Some(term) = self.rate_term.as_mut() {
            *term = term.saturating_sub(1);
        }
        if let Some(term) = self.mortgage_term.as_mut() {
            *term = term.saturating_sub(1);
        }
    }
}
