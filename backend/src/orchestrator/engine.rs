//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Population dynamics (exit, entry, discouragement)
//! - Market participation (evictions, forced sales, market entry)
//! - Construction
//! - Trade (pricing, matching, chain resolution, settlement)
//! - Demolition, price decay and the owners' financial update
//! - Event logging (complete simulation history)
//!
//! # Architecture
//!
//! ```text
//! For each tick t:
//! 1.  Advance time, refresh the per-tick rate, reset monitors,
//!     refresh realtor means
//! 2.  Natural exit, natural entry, discouragement of the long homeless
//! 3.  Classify households and act on the cohorts
//! 4.  Construct new sale stock
//! 5.  Price new listings, snapshot median prices, make offers,
//!     resolve chains and settle
//! 6.  Prune stale realtor records
//! 7.  Withdraw unsettled offers
//! 8.  Demolish worn-out and unsellable stock
//! 9.  Decay listed prices
//! 10. Repay, reset rates, save and grow incomes
//! 11. Sweep registry invariants
//! ```
//!
//! A tick is all-or-nothing: if any phase fails, the registry, RNG,
//! monitors and event log are restored to their state before the tick and
//! [`SimulationError::TickFailed`] names the tick.
//!
//! # Example
//!
//! ```rust
//! use housing_simulator_core_rs::orchestrator::{ModelConfig, Orchestrator};
//!
//! let config = ModelConfig {
//!     grid_width: 12,
//!     grid_height: 12,
//!     n_realtors: 2,
//!     ..Default::default()
//! };
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//!
//! for _ in 0..4 {
//!     let result = orchestrator.tick().unwrap();
//!     println!("Tick {}: {} sales, {} rentals", result.tick, result.sales, result.rentals);
//! }
//! ```

use crate::core::time::TimeManager;
use crate::finance::per_tick_rate;
use crate::market;
use crate::models::event::EventLog;
use crate::models::ids::{HouseId, HouseholdId, RealtorId};
use crate::models::state::SimulationState;
use crate::orchestrator::config::ModelConfig;
use crate::orchestrator::context::TickContext;
use crate::orchestrator::lifecycle;
use crate::orchestrator::monitors::Monitors;
use crate::orchestrator::setup::{self, SetupSummary};
use crate::rng::RngManager;
use crate::settlement;
use crate::spatial::{self, GridSpace, SpatialError, SpatialIndex};
use crate::valuation::{self, MarketSnapshot};
use log::{error, info};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Simulation error types
///
/// Variants name the agents involved so a failed run can be diagnosed from
/// the error alone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("House not found: {0}")]
    HouseNotFound(HouseId),

    #[error("Household not found: {0}")]
    HouseholdNotFound(HouseholdId),

    #[error("Realtor not found: {0}")]
    RealtorNotFound(RealtorId),

    #[error("{house} is not in the portfolio of {household}")]
    NotInPortfolio { household: HouseholdId, house: HouseId },

    #[error("{0} has no residence")]
    NoResidence(HouseholdId),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("Tick {tick} failed: {source}")]
    TickFailed {
        tick: usize,
        source: Box<SimulationError>,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

// ============================================================================
// Tick results
// ============================================================================

/// Result of executing a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub tick: usize,

    /// Households in the city at the end of the tick
    pub households: usize,

    /// Houses standing at the end of the tick
    pub houses: usize,

    pub entered: usize,
    pub exited: usize,
    pub discouraged: usize,
    pub evicted: usize,
    pub forced_sales: usize,
    pub offers: usize,
    pub chains_rejected: usize,
    pub sales: usize,
    pub rentals: usize,
    pub constructed: usize,
    pub demolished: usize,
    pub rate_resets: usize,
}

/// Everything a failed tick must put back
struct Rollback {
    state: SimulationState,
    rng: RngManager,
    time: TimeManager,
    monitors: Monitors,
    events: usize,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owner of the registry, the spatial collaborator and the tick loop
#[derive(Debug)]
pub struct Orchestrator {
    config: ModelConfig,
    state: SimulationState,
    space: Box<dyn SpatialIndex>,
    rng: RngManager,
    time: TimeManager,

    /// Prevailing annual interest rate in percent
    interest_rate: f64,

    monitors: Monitors,
    event_log: EventLog,
    setup: SetupSummary,
}

impl Orchestrator {
    /// Create and populate a city on a [`GridSpace`] of the configured size
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation, `Setup` if the
    /// initial population cannot be housed.
    pub fn new(config: ModelConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let space = Box::new(GridSpace::new(config.grid_width, config.grid_height));
        Self::with_space(config, space)
    }

    /// Create and populate a city on a caller-provided spatial collaborator
    pub fn with_space(config: ModelConfig, space: Box<dyn SpatialIndex>) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut orchestrator = Self::assemble(config, SimulationState::new(), space, 0);
        orchestrator.space.clear();

        let rate = orchestrator.per_tick_rate();
        let mut ctx = TickContext {
            state: &mut orchestrator.state,
            space: orchestrator.space.as_mut(),
            rng: &mut orchestrator.rng,
            events: &mut orchestrator.event_log,
            monitors: &mut orchestrator.monitors,
            config: &orchestrator.config,
            tick: 0,
            rate,
        };
        orchestrator.setup = setup::initialise(&mut ctx)?;
        orchestrator.state.check_invariants()?;
        Ok(orchestrator)
    }

    /// Wrap an existing registry without running setup
    ///
    /// The space is cleared and repopulated from the registry. Used to
    /// build hand-made scenarios and to restore checkpoints.
    pub fn from_state(
        config: ModelConfig,
        state: SimulationState,
        space: Box<dyn SpatialIndex>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        state.check_invariants()?;
        let mut orchestrator = Self::assemble(config, state, space, 0);
        spatial::populate(orchestrator.space.as_mut(), &orchestrator.state)?;
        Ok(orchestrator)
    }

    fn assemble(config: ModelConfig, state: SimulationState, space: Box<dyn SpatialIndex>, tick: usize) -> Self {
        Self {
            rng: RngManager::new(config.rng_seed),
            time: TimeManager::at_tick(config.ticks_per_year, tick),
            interest_rate: config.interest_rate,
            monitors: Monitors::default(),
            event_log: EventLog::new(),
            setup: SetupSummary::default(),
            state,
            space,
            config,
        }
    }

    /// Restore an orchestrator from checkpointed parts
    pub(crate) fn restore(
        config: ModelConfig,
        state: SimulationState,
        space: Box<dyn SpatialIndex>,
        tick: usize,
        rng_state: u64,
        interest_rate: f64,
    ) -> Result<Self, SimulationError> {
        let mut orchestrator = Self::assemble(config, state, space, tick);
        orchestrator.rng = RngManager::new(rng_state);
        orchestrator.interest_rate = interest_rate;
        spatial::populate(orchestrator.space.as_mut(), &orchestrator.state)?;
        Ok(orchestrator)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_tick(&self) -> usize {
        self.time.current_tick()
    }

    pub fn current_year(&self) -> usize {
        self.time.current_year()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable state (for scenario building and testing)
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn space(&self) -> &dyn SpatialIndex {
        self.space.as_ref()
    }

    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn event_count(&self) -> usize {
        self.event_log.len()
    }

    pub fn setup_summary(&self) -> SetupSummary {
        self.setup
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    /// Prevailing annual interest rate in percent
    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    /// Change the prevailing rate; holdings move onto it as their fixed
    /// terms expire
    pub fn set_interest_rate(&mut self, annual_percent: f64) -> Result<(), SimulationError> {
        if !annual_percent.is_finite() || annual_percent < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "interest rate must be a non-negative number, got {}",
                annual_percent
            )));
        }
        info!(
            "interest rate {}% -> {}% at tick {}",
            self.interest_rate,
            annual_percent,
            self.current_tick()
        );
        self.interest_rate = annual_percent;
        Ok(())
    }

    pub fn per_tick_rate(&self) -> f64 {
        per_tick_rate(self.interest_rate, self.config.ticks_per_year)
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Execute one tick
    ///
    /// # Errors
    ///
    /// `TickFailed` wrapping the first fatal error of any phase. The
    /// orchestrator is left exactly as it was before the call.
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        let rollback = Rollback {
            state: self.state.clone(),
            rng: self.rng.clone(),
            time: self.time.clone(),
            monitors: self.monitors.clone(),
            events: self.event_log.len(),
        };

        self.time.advance_tick();
        let tick = self.time.current_tick();

        match self.run_phases(tick) {
            Ok(result) => {
                info!(
                    "tick {}: {} households, {} houses, {} sales, {} rentals, {} evicted",
                    tick, result.households, result.houses, result.sales, result.rentals, result.evicted
                );
                Ok(result)
            }
            Err(source) => {
                error!("tick {} failed: {}", tick, source);
                self.state = rollback.state;
                self.rng = rollback.rng;
                self.time = rollback.time;
                self.monitors = rollback.monitors;
                self.event_log.truncate(rollback.events);
                if let Err(e) = spatial::populate(self.space.as_mut(), &self.state) {
                    error!("could not rebuild space after failed tick {}: {}", tick, e);
                }
                Err(SimulationError::TickFailed {
                    tick,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Execute `ticks` ticks, stopping at the first failure
    pub fn run(&mut self, ticks: usize) -> Result<Vec<TickResult>, SimulationError> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    fn run_phases(&mut self, tick: usize) -> Result<TickResult, SimulationError> {
        let rate = self.per_tick_rate();
        let mut ctx = TickContext {
            state: &mut self.state,
            space: self.space.as_mut(),
            rng: &mut self.rng,
            events: &mut self.event_log,
            monitors: &mut self.monitors,
            config: &self.config,
            tick,
            rate,
        };

        // STEP 1: GLOBALS
        ctx.monitors.reset();
        valuation::refresh_realtor_means(ctx.state);

        // STEP 2: POPULATION
        let exited = lifecycle::natural_exit(&mut ctx)?;
        let entered = lifecycle::natural_entry(&mut ctx)?;
        let discouraged = lifecycle::discourage_homeless(&mut ctx)?;

        // STEP 3: MARKET PARTICIPATION
        let cohorts = market::classify(ctx.state, ctx.config, rate);
        let participation = market::apply(&mut ctx, &cohorts)?;

        // STEP 4: CONSTRUCTION
        let constructed = lifecycle::construct_houses(&mut ctx)?;

        // STEP 5: TRADE
        valuation::price_new_listings(ctx.state, ctx.space, ctx.config.locality, tick)?;
        let prices = MarketSnapshot::capture(ctx.state);
        ctx.monitors.median_price_for_sale = prices.median_sale.unwrap_or(0.0);
        ctx.monitors.median_price_for_rent = prices.median_rent.unwrap_or(0.0);
        let offers = market::make_offers(&mut ctx)?;
        let settled = settlement::settle_offers(&mut ctx)?;

        // STEP 6-7: RECORDS AND OFFERS
        valuation::prune_records(ctx.state, tick, ctx.config.realtor_memory);
        ctx.state.withdraw_all_offers();

        // STEP 8-9: STOCK
        let demolished = lifecycle::demolish_houses(&mut ctx, &prices)?;
        valuation::decay_prices(ctx.state, ctx.config.price_drop_rate, ctx.config.rent_drop_rate);

        // STEP 10: FINANCES
        let rate_resets = lifecycle::update_owners(&mut ctx)?;

        // STEP 11: INVARIANTS
        ctx.state.check_invariants()?;

        Ok(TickResult {
            tick,
            households: ctx.state.num_households(),
            houses: ctx.state.num_houses(),
            entered,
            exited,
            discouraged,
            evicted: participation.evicted,
            forced_sales: participation.forced_sales,
            offers,
            chains_rejected: ctx.monitors.n_chains_rejected,
            sales: settled.sales,
            rentals: settled.rentals,
            constructed,
            demolished,
            rate_resets,
        })
    }
}
