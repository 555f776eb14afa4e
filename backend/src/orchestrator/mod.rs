//! Orchestrator - main simulation loop
//!
//! Owns the registry and runs the tick lifecycle. See `engine.rs` for the
//! phase order and `setup.rs` for the initial population.

pub mod checkpoint;
pub mod config;
pub mod context;
pub mod engine;
pub mod lifecycle;
pub mod monitors;
pub mod setup;

// Re-export main types for convenience
pub use config::ModelConfig;
pub use context::TickContext;
pub use engine::{Orchestrator, SimulationError, TickResult};
pub use monitors::Monitors;
pub use setup::SetupSummary;

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
