//! Event logging for simulation replay and auditing.
//!
//! Every significant state change in the housing market is captured as an
//! [`Event`]: households entering and leaving the city or a market,
//! evictions and forced sales, offers, settled sales and tenancies, rate
//! resets, construction and demolition.
//!
//! # Example
//!
//! ```rust
//! use housing_simulator_core_rs::models::{Event, EventLog, HouseId, HouseholdId};
//!
//! let mut log = EventLog::new();
//! log.log(Event::ForcedSale {
//!     tick: 3,
//!     household: HouseholdId(7),
//!     house: HouseId(12),
//! });
//!
//! assert_eq!(log.events_at_tick(3).len(), 1);
//! assert_eq!(log.events_for_household(HouseholdId(7)).len(), 1);
//! ```

use crate::models::house::Tenure;
use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId, PlotId};
use serde::{Deserialize, Serialize};

/// Why a house was demolished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemolitionReason {
    EndOfLife,
    /// Listed below the locality price floor
    BelowPriceFloor,
}

/// Simulation event capturing a state change.
///
/// All events include a tick number for temporal ordering.
/// Events are logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// New homeless household entered the city
    HouseholdEntered {
        tick: usize,
        household: HouseholdId,
        market: MarketKind,
        income: f64,
    },

    /// Household left the city at random
    HouseholdExited { tick: usize, household: HouseholdId },

    /// Household gave up after too long without a home
    HouseholdDiscouraged {
        tick: usize,
        household: HouseholdId,
        market: Option<MarketKind>,
    },

    MarketEntered {
        tick: usize,
        household: HouseholdId,
        market: MarketKind,
    },

    MarketLeft {
        tick: usize,
        household: HouseholdId,
        market: MarketKind,
    },

    /// Household lost its residence; `relisted` names every house put back
    /// on the market as a consequence
    Evicted {
        tick: usize,
        household: HouseholdId,
        house: HouseId,
        tenure: Tenure,
        relisted: Vec<HouseId>,
    },

    ForcedSale {
        tick: usize,
        household: HouseholdId,
        house: HouseId,
    },

    OfferMade {
        tick: usize,
        household: HouseholdId,
        house: HouseId,
        market: MarketKind,
        price: f64,
    },

    /// Offer whose chain of dependent transactions could not complete
    ChainRejected {
        tick: usize,
        household: HouseholdId,
        house: HouseId,
    },

    SaleSettled {
        tick: usize,
        buyer: HouseholdId,
        seller: Option<HouseholdId>,
        house: HouseId,
        price: f64,
        /// New mortgage taken on by the buyer (zero for cash purchases)
        mortgage: f64,
        market: MarketKind,
    },

    TenancySettled {
        tick: usize,
        tenant: HouseholdId,
        landlord: Option<HouseholdId>,
        house: HouseId,
        rent: f64,
    },

    RateReset {
        tick: usize,
        household: HouseholdId,
        house: HouseId,
        old_rate: f64,
        new_rate: f64,
        repayment: f64,
    },

    HouseConstructed {
        tick: usize,
        house: HouseId,
        plot: PlotId,
    },

    HouseDemolished {
        tick: usize,
        house: HouseId,
        owner: Option<HouseholdId>,
        reason: DemolitionReason,
    },
}

impl Event {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            Event::HouseholdEntered { tick, .. }
            | Event::HouseholdExited { tick, .. }
            | Event::HouseholdDiscouraged { tick, .. }
            | Event::MarketEntered { tick, .. }
            | Event::MarketLeft { tick, .. }
            | Event::Evicted { tick, .. }
            | Event::ForcedSale { tick, .. }
            | Event::OfferMade { tick, .. }
            | Event::ChainRejected { tick, .. }
            | Event::SaleSettled { tick, .. }
            | Event::TenancySettled { tick, .. }
            | Event::RateReset { tick, .. }
            | Event::HouseConstructed { tick, .. }
            | Event::HouseDemolished { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::HouseholdEntered { .. } => "HouseholdEntered",
            Event::HouseholdExited { .. } => "HouseholdExited",
            Event::HouseholdDiscouraged { .. } => "HouseholdDiscouraged",
            Event::MarketEntered { .. } => "MarketEntered",
            Event::MarketLeft { .. } => "MarketLeft",
            Event::Evicted { .. } => "Evicted",
            Event::ForcedSale { .. } => "ForcedSale",
            Event::OfferMade { .. } => "OfferMade",
            Event::ChainRejected { .. } => "ChainRejected",
            Event::SaleSettled { .. } => "SaleSettled",
            Event::TenancySettled { .. } => "TenancySettled",
            Event::RateReset { .. } => "RateReset",
            Event::HouseConstructed { .. } => "HouseConstructed",
            Event::HouseDemolished { .. } => "HouseDemolished",
        }
    }

    /// Whether `id` takes part in this event
    pub fn involves_household(&self, id: HouseholdId) -> bool {
        match self {
            Event::HouseholdEntered { household, .. }
            | Event::HouseholdExited { household, .. }
            | Event::HouseholdDiscouraged { household, .. }
            | Event::MarketEntered { household, .. }
            | Event::MarketLeft { household, .. }
            | Event::Evicted { household, .. }
            | Event::ForcedSale { household, .. }
            | Event::OfferMade { household, .. }
            | Event::ChainRejected { household, .. }
            | Event::RateReset { household, .. } => *household == id,
            Event::SaleSettled { buyer, seller, .. } => *buyer == id || *seller == Some(id),
            Event::TenancySettled {
                tenant, landlord, ..
            } => *tenant == id || *landlord == Some(id),
            Event::HouseDemolished { owner, .. } => *owner == Some(id),
            Event::HouseConstructed { .. } => false,
        }
    }

    /// House this event is about, if any
    pub fn house(&self) -> Option<HouseId> {
        match self {
            Event::Evicted { house, .. }
            | Event::ForcedSale { house, .. }
            | Event::OfferMade { house, .. }
            | Event::ChainRejected { house, .. }
            | Event::SaleSettled { house, .. }
            | Event::TenancySettled { house, .. }
            | Event::RateReset { house, .. }
            | Event::HouseConstructed { house, .. }
            | Event::HouseDemolished { house, .. } => Some(*house),
            _ => None,
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events a household takes part in
    pub fn events_for_household(&self, id: HouseholdId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.involves_household(id))
            .collect()
    }

    /// Get events about a specific house
    pub fn events_for_house(&self, id: HouseId) -> Vec<&Event> {
        self.events.iter().filter(|e| e.house() == Some(id)).collect()
    }

    /// Drop events after `len`, used to roll back a failed tick
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
