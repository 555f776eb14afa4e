//! Mutable view of the world handed to every phase of a tick

use crate::models::event::{Event, EventLog};
use crate::models::household::MarketKind;
use crate::models::ids::{Entity, HouseId, HouseholdId};
use crate::models::state::SimulationState;
use crate::orchestrator::config::ModelConfig;
use crate::orchestrator::monitors::Monitors;
use crate::orchestrator::SimulationError;
use crate::rng::RngManager;
use crate::spatial::SpatialIndex;

/// Everything a phase may read or mutate
///
/// Built by the orchestrator for the duration of one tick (or of setup).
/// `rate` is the prevailing per-tick interest rate.
pub struct TickContext<'a> {
    pub state: &'a mut SimulationState,
    pub space: &'a mut dyn SpatialIndex,
    pub rng: &'a mut RngManager,
    pub events: &'a mut EventLog,
    pub monitors: &'a mut Monitors,
    pub config: &'a ModelConfig,
    pub tick: usize,
    pub rate: f64,
}

impl<'a> TickContext<'a> {
    /// Prevailing annual rate in percent
    pub fn annual_rate(&self) -> f64 {
        self.rate * self.config.ticks_per_year as f64 * 100.0
    }

    pub fn log(&mut self, event: Event) {
        self.events.log(event);
    }

    /// Flag a household as an active participant on `market`
    pub fn enter_market(&mut self, household: HouseholdId, market: MarketKind) -> Result<(), SimulationError> {
        self.state.household_mut(household)?.enter_market(market);
        self.events.log(Event::MarketEntered {
            tick: self.tick,
            household,
            market,
        });
        Ok(())
    }

    pub fn leave_market(&mut self, household: HouseholdId) -> Result<(), SimulationError> {
        let hh = self.state.household_mut(household)?;
        if let Some(market) = hh.market.take() {
            self.events.log(Event::MarketLeft {
                tick: self.tick,
                household,
                market,
            });
        }
        Ok(())
    }

    /// Put a house on the market of its tenure, withdrawing any offer on it
    pub fn list_house(&mut self, house: HouseId) -> Result<(), SimulationError> {
        let tick = self.tick;
        if let Some(offerer) = self.state.house_mut(house)?.list(tick) {
            self.state.clear_offer_of(offerer, house);
        }
        Ok(())
    }

    /// List a house unless it is already listed, keeping any pending offer
    pub fn ensure_listed(&mut self, house: HouseId) -> Result<(), SimulationError> {
        if !self.state.house(house)?.is_listed() {
            self.list_house(house)?;
        }
        Ok(())
    }

    /// Take a house off the market, withdrawing any offer on it
    pub fn unlist_house(&mut self, house: HouseId) -> Result<(), SimulationError> {
        if let Some(offerer) = self.state.house_mut(house)?.unlist() {
            self.state.clear_offer_of(offerer, house);
        }
        Ok(())
    }

    /// Stand a household on the plot of `house`
    pub fn move_household(&mut self, household: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
        let plot = self.state.house(house)?.plot;
        self.space.move_entity(Entity::Household(household), plot)?;
        Ok(())
    }

    /// Take a household off the space if it stands anywhere
    pub fn unplace_household(&mut self, household: HouseholdId) -> Result<(), SimulationError> {
        self.space.remove_if_placed(Entity::Household(household))?;
        Ok(())
    }
}
