//! Housing Simulator Core - Rust Engine
//!
//! Agent-based model of an urban housing market with deterministic
//! execution.
//!
//! # Architecture
//!
//! - **core**: Time management and summary statistics
//! - **finance**: Annuity arithmetic for mortgages
//! - **models**: Domain types (House, Household, Realtor, State)
//! - **spatial**: Plot grid and neighbourhood queries
//! - **valuation**: Realtor records and price estimation
//! - **market**: Participation decisions and offer matching
//! - **settlement**: Chain resolution, transfers and evictions
//! - **orchestrator**: Main simulation loop
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every house has at most one owner, one occupier and one offer
//! 2. All randomness is deterministic (seeded RNG)
//! 3. A tick either commits completely or leaves no trace

// Module declarations
pub mod core;
pub mod finance;
pub mod market;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod settlement;
pub mod spatial;
pub mod valuation;

// Re-exports for convenience
pub use core::time::TimeManager;
pub use models::{
    event::{Event, EventLog},
    holding::Holding,
    house::{House, Tenure},
    household::{Household, MarketKind},
    ids::{HouseId, HouseholdId, PlotId, RealtorId},
    realtor::Realtor,
    state::SimulationState,
};
pub use orchestrator::{ModelConfig, Monitors, Orchestrator, SimulationError, TickResult};
pub use rng::RngManager;
pub use spatial::{GridSpace, SpatialIndex};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn housing_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::model::PyHousingModel>()?;
    Ok(())
}
