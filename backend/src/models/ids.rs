//! Stable agent identifiers
//!
//! Agents live in arenas owned by [`crate::models::state::SimulationState`]
//! and refer to each other only through these ids. An id is never reused,
//! so a removed agent's id simply stops resolving.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! agent_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

agent_id!(HouseId, "house");
agent_id!(HouseholdId, "household");
agent_id!(RealtorId, "realtor");

/// Opaque handle to a plot in the spatial collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlotId(pub usize);

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plot-{}", self.0)
    }
}

/// Any agent that can be placed in space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Entity {
    House(HouseId),
    Household(HouseholdId),
    Realtor(RealtorId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(HouseId(3).to_string(), "house-3");
        assert_eq!(HouseholdId(7).to_string(), "household-7");
        assert_eq!(RealtorId(0).to_string(), "realtor-0");
        assert_eq!(PlotId(12).to_string(), "plot-12");
    }
}
