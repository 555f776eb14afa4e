//! Domain models for the housing market simulator

pub mod event;
pub mod holding;
pub mod house;
pub mod household;
pub mod ids;
pub mod realtor;
pub mod state;

// Re-exports
pub use event::{DemolitionReason, Event, EventLog};
pub use holding::Holding;
pub use house::{House, Listing, Tenure};
pub use household::{Household, MarketKind};
pub use ids::{Entity, HouseId, HouseholdId, PlotId, RealtorId};
pub use realtor::{PriceRecord, Realtor, RecordKind};
pub use state::{IdCounters, SimulationState};
