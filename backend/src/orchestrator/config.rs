//! Model configuration
//!
//! A flat set of named parameters, read-only once the orchestrator is built.
//! Percentages are expressed in percent (`3.0` means 3 %), durations in
//! years unless the field name says ticks. Every field has a default, so a
//! JSON file only needs the keys it changes.

use crate::finance::max_mortgage;
use crate::orchestrator::SimulationError;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Annual interest rate (%)
    pub interest_rate: f64,
    /// Maximum loan-to-value (%)
    pub max_ltv: f64,
    pub ticks_per_year: usize,
    /// Share of plots carrying a house at setup (%)
    pub density: f64,
    /// Share of initial stock that is mortgage-type (%)
    pub owned_rent_percentage: f64,
    /// Share of initial stock occupied (%)
    pub initial_occupancy: f64,
    /// Share of owner-occupiers starting debt-free (%)
    pub fully_paid_mortgage_owners: f64,
    /// Share of rich owners who invest in buy-to-let (%)
    pub investors: f64,
    /// Share of rich tenants who upgrade their tenancy rather than buy (%)
    pub upgrade_tenancy: f64,
    /// Mean house lifetime (years)
    pub house_mean_lifetime: f64,
    /// Standard deviation of house lifetime (ticks)
    pub house_lifetime_std_dev: f64,
    /// Radius scoping which records inform a valuation (plots)
    pub locality: f64,
    /// Share of income spendable on housing (%)
    pub affordability: f64,
    /// Mortgage duration (years)
    pub mortgage_duration: usize,
    pub mean_income: f64,
    /// Starting capital of owner-occupiers (% of income)
    pub capital_mortgage: f64,
    /// Starting capital of tenants (% of income)
    pub capital_rent: f64,
    /// Income growth per tick (%)
    pub wage_rise: f64,
    /// Share of surplus income owners save (%)
    pub savings: f64,
    /// Share of surplus income non-owners save (%)
    pub savings_rent: f64,
    /// Ticks a household tolerates homelessness before leaving
    pub max_homeless_period: u32,
    /// Candidate listings a bidder considers
    pub buyer_search_length: usize,
    /// New houses per tick (% of stock)
    pub house_construction_rate: f64,
    /// New households per tick (% of population)
    pub entry_rate: f64,
    /// Households leaving per tick (% of population)
    pub exit_rate: f64,
    pub n_realtors: usize,
    /// Radius of a realtor's territory (plots)
    pub realtor_territory: f64,
    /// Age after which records are forgotten (ticks)
    pub realtor_memory: usize,
    /// Listed prices below this share of the market median are demolished (%)
    pub min_price_percent: f64,
    /// Decay of unsold listing prices per tick (%)
    pub price_drop_rate: f64,
    /// Decay of unlet listing rents per tick (%)
    pub rent_drop_rate: f64,
    /// Capital a tenant needs, in deposits on its current home, to buy
    pub savings_to_price_threshold: f64,
    pub eviction_threshold_mortgage: f64,
    pub eviction_threshold_rent: f64,
    /// Fixed-rate term bounds on a primary residence (years)
    pub min_rate_duration_m: usize,
    pub max_rate_duration_m: usize,
    /// Fixed-rate term bounds on buy-to-let debt (years)
    pub min_rate_duration_btl: usize,
    pub max_rate_duration_btl: usize,
    pub rng_seed: u64,
    /// Reference grid size (plots)
    pub grid_width: usize,
    pub grid_height: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            interest_rate: 3.0,
            max_ltv: 90.0,
            ticks_per_year: 4,
            density: 70.0,
            owned_rent_percentage: 50.0,
            initial_occupancy: 95.0,
            fully_paid_mortgage_owners: 0.0,
            investors: 50.0,
            upgrade_tenancy: 50.0,
            house_mean_lifetime: 100.0,
            house_lifetime_std_dev: 200.0,
            locality: 3.0,
            affordability: 33.0,
            mortgage_duration: 25,
            mean_income: 30_000.0,
            capital_mortgage: 100.0,
            capital_rent: 50.0,
            wage_rise: 0.0,
            savings: 20.0,
            savings_rent: 5.0,
            max_homeless_period: 5,
            buyer_search_length: 5,
            house_construction_rate: 0.36,
            entry_rate: 4.0,
            exit_rate: 2.0,
            n_realtors: 6,
            realtor_territory: 16.0,
            realtor_memory: 10,
            min_price_percent: 20.0,
            price_drop_rate: 3.0,
            rent_drop_rate: 3.0,
            savings_to_price_threshold: 2.0,
            eviction_threshold_mortgage: 3.0,
            eviction_threshold_rent: 1.0,
            min_rate_duration_m: 2,
            max_rate_duration_m: 5,
            min_rate_duration_btl: 1,
            max_rate_duration_btl: 1,
            rng_seed: 42,
            grid_width: 40,
            grid_height: 40,
        }
    }
}

impl ModelConfig {
    /// Reject settings no run can honour
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.ticks_per_year == 0 {
            return Err(SimulationError::InvalidConfig(
                "ticks_per_year must be > 0".to_string(),
            ));
        }
        if self.mortgage_duration == 0 {
            return Err(SimulationError::InvalidConfig(
                "mortgage_duration must be > 0".to_string(),
            ));
        }
        if self.n_realtors == 0 {
            return Err(SimulationError::InvalidConfig(
                "Must have at least one realtor".to_string(),
            ));
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SimulationError::InvalidConfig(
                "grid must have at least one plot".to_string(),
            ));
        }
        if self.min_rate_duration_m > self.max_rate_duration_m {
            return Err(SimulationError::InvalidConfig(format!(
                "min_rate_duration_m ({}) exceeds max_rate_duration_m ({})",
                self.min_rate_duration_m, self.max_rate_duration_m
            )));
        }
        if self.min_rate_duration_btl > self.max_rate_duration_btl {
            return Err(SimulationError::InvalidConfig(format!(
                "min_rate_duration_btl ({}) exceeds max_rate_duration_btl ({})",
                self.min_rate_duration_btl, self.max_rate_duration_btl
            )));
        }

        let percentages = [
            ("max_ltv", self.max_ltv),
            ("density", self.density),
            ("owned_rent_percentage", self.owned_rent_percentage),
            ("initial_occupancy", self.initial_occupancy),
            ("fully_paid_mortgage_owners", self.fully_paid_mortgage_owners),
            ("investors", self.investors),
            ("upgrade_tenancy", self.upgrade_tenancy),
            ("affordability", self.affordability),
            ("savings", self.savings),
            ("savings_rent", self.savings_rent),
            ("house_construction_rate", self.house_construction_rate),
            ("entry_rate", self.entry_rate),
            ("exit_rate", self.exit_rate),
            ("min_price_percent", self.min_price_percent),
            ("price_drop_rate", self.price_drop_rate),
            ("rent_drop_rate", self.rent_drop_rate),
        ];
        for (name, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(SimulationError::InvalidConfig(format!(
                    "{} must be within 0-100, got {}",
                    name, value
                )));
            }
        }
        if self.interest_rate < 0.0 || self.mean_income < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "interest_rate and mean_income must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum loan-to-value as a fraction
    pub fn ltv(&self) -> f64 {
        self.max_ltv / 100.0
    }

    /// Affordability as a fraction of income
    pub fn affordability_share(&self) -> f64 {
        self.affordability / 100.0
    }

    /// Repayments over the life of a new mortgage
    pub fn mortgage_periods(&self) -> usize {
        self.mortgage_duration * self.ticks_per_year
    }

    /// Per-tick housing budget of a household with annual `income`
    pub fn affordable_payment(&self, income: f64) -> f64 {
        income * self.affordability / (self.ticks_per_year as f64 * 100.0)
    }

    /// Largest new mortgage that `repayment` a tick services at
    /// `annual_rate` percent over the configured duration
    pub fn serviceable_mortgage(&self, repayment: f64, annual_rate: f64) -> f64 {
        max_mortgage(repayment, annual_rate, self.ticks_per_year, self.mortgage_duration)
    }

    /// Draw a fixed-rate term in ticks for new or reset debt
    pub fn draw_rate_term(&self, rng: &mut RngManager, buy_to_let: bool) -> usize {
        let (min, max) = if buy_to_let {
            (self.min_rate_duration_btl, self.max_rate_duration_btl)
        } else {
            (self.min_rate_duration_m, self.max_rate_duration_m)
        };
        let years = rng.range_inclusive(min as i64, max as i64) as usize;
        years * self.ticks_per_year
    }
}
