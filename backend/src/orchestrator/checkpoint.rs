//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete orchestrator state
//! for pause/resume functionality.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored run continues exactly as the original would
//!   have (same RNG state, prevailing rate and id counters)
//! - **Registry Integrity**: a snapshot is only accepted if the rebuilt
//!   registry passes the same invariant sweep as a tick
//! - **Config Matching**: state can only be loaded with matching config
//!
//! The event log and monitors are not checkpointed; a restored run starts
//! with an empty log.

use crate::models::house::House;
use crate::models::household::Household;
use crate::models::realtor::Realtor;
use crate::models::state::{IdCounters, SimulationState};
use crate::orchestrator::config::ModelConfig;
use crate::orchestrator::engine::Orchestrator;
use crate::orchestrator::SimulationError;
use crate::spatial::{GridSpace, SpatialIndex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete orchestrator state snapshot
///
/// Agents are stored as id-ordered sequences rather than maps so the JSON
/// form does not depend on how ids serialise as keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current tick position
    pub tick: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Prevailing annual interest rate in percent
    pub interest_rate: f64,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,

    pub houses: Vec<House>,
    pub households: Vec<Household>,
    pub realtors: Vec<Realtor>,
    pub counters: IdCounters,
}

impl StateSnapshot {
    pub fn capture(orchestrator: &Orchestrator) -> Result<Self, SimulationError> {
        let state = orchestrator.state();
        Ok(Self {
            tick: orchestrator.current_tick(),
            rng_state: orchestrator.rng_state(),
            interest_rate: orchestrator.interest_rate(),
            config_hash: compute_config_hash(orchestrator.config())?,
            houses: state.houses().cloned().collect(),
            households: state.households().cloned().collect(),
            realtors: state.realtors().cloned().collect(),
            counters: state.counters(),
        })
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| SimulationError::Checkpoint(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::Checkpoint(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity before rebuilding a registry from it
///
/// Checks:
/// - No duplicate ids per agent kind
/// - Id counters ahead of every stored id
/// - Every house's realtors exist
pub fn validate_snapshot(snapshot: &StateSnapshot) -> Result<(), SimulationError> {
    fn unique<T: Ord + std::fmt::Display>(kind: &str, ids: impl Iterator<Item = T>) -> Result<(), SimulationError> {
        let mut seen = BTreeSet::new();
        for id in ids {
            if seen.contains(&id) {
                return Err(SimulationError::Checkpoint(format!("Duplicate {} id {}", kind, id)));
            }
            seen.insert(id);
        }
        Ok(())
    }
    unique("house", snapshot.houses.iter().map(|h| h.id))?;
    unique("household", snapshot.households.iter().map(|h| h.id))?;
    unique("realtor", snapshot.realtors.iter().map(|r| r.id))?;

    let counters = snapshot.counters;
    let behind = snapshot.houses.iter().any(|h| h.id.0 >= counters.house)
        || snapshot.households.iter().any(|h| h.id.0 >= counters.household)
        || snapshot.realtors.iter().any(|r| r.id.0 >= counters.realtor);
    if behind {
        return Err(SimulationError::Checkpoint(
            "Id counters behind stored agents".to_string(),
        ));
    }

    let realtors: BTreeSet<_> = snapshot.realtors.iter().map(|r| r.id).collect();
    for house in &snapshot.houses {
        if let Some(missing) = house.local_realtors.iter().find(|r| !realtors.contains(*r)) {
            return Err(SimulationError::Checkpoint(format!(
                "{} refers to missing realtor {}",
                house.id, missing
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Save / Load
// ============================================================================

impl Orchestrator {
    /// Serialise the orchestrator to a JSON checkpoint
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let snapshot = StateSnapshot::capture(self)?;
        serde_json::to_string(&snapshot)
            .map_err(|e| SimulationError::Checkpoint(format!("Snapshot serialization failed: {}", e)))
    }

    /// Restore an orchestrator from a JSON checkpoint on a [`GridSpace`]
    ///
    /// # Errors
    ///
    /// `Checkpoint` if the JSON is malformed, the config hash differs or the
    /// snapshot is inconsistent; any registry invariant violation.
    pub fn load_state(config: ModelConfig, json: &str) -> Result<Self, SimulationError> {
        config.validate()?;
        let space = Box::new(GridSpace::new(config.grid_width, config.grid_height));
        Self::load_state_with_space(config, json, space)
    }

    /// Restore an orchestrator from a JSON checkpoint on a caller-provided space
    pub fn load_state_with_space(
        config: ModelConfig,
        json: &str,
        space: Box<dyn SpatialIndex>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let snapshot: StateSnapshot = serde_json::from_str(json)
            .map_err(|e| SimulationError::Checkpoint(format!("Snapshot deserialization failed: {}", e)))?;

        let expected = compute_config_hash(&config)?;
        if snapshot.config_hash != expected {
            return Err(SimulationError::Checkpoint(format!(
                "Config hash mismatch: snapshot {}, config {}",
                snapshot.config_hash, expected
            )));
        }
        validate_snapshot(&snapshot)?;

        let state = SimulationState::from_parts(
            snapshot.houses,
            snapshot.households,
            snapshot.realtors,
            snapshot.counters,
        );
        state.check_invariants()?;
        Orchestrator::restore(
            config,
            state,
            space,
            snapshot.tick,
            snapshot.rng_state,
            snapshot.interest_rate,
        )
    }
}
