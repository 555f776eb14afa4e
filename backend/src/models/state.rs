//! Simulation State
//!
//! The agent registry: an arena of houses, households and realtors owned by
//! the orchestrator. Agents refer to one another by stable ids, so cascades
//! can add and remove agents mid-phase without invalidating anything but
//! the removed ids themselves.
//!
//! # Critical Invariants
//!
//! 1. **Ownership agreement**: a household holds a [`Holding`](crate::models::Holding)
//!    on a house iff that house names it as owner, and at most one per house
//! 2. **Occupancy agreement**: a household's residence names it as occupier,
//!    and every occupier lives in the house that names it
//! 3. **Offer agreement**: a house's pending offerer has an offer on that
//!    house, and a house with an offerer is listed
//! 4. **Tenure**: owner and occupier differ only for rent-type stock
//!
//! [`SimulationState::check_invariants`] verifies all four.

use crate::models::house::{House, Tenure};
use crate::models::household::Household;
use crate::models::ids::{HouseId, HouseholdId, RealtorId};
use crate::models::realtor::Realtor;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Next unused id per agent kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub house: u64,
    pub household: u64,
    pub realtor: u64,
}

/// Complete agent registry
///
/// Agents are stored in ordered maps so that every phase visits them in id
/// order and a seeded run is reproducible.
///
/// # Example
///
/// ```rust
/// use housing_simulator_core_rs::models::{Household, SimulationState, Tenure};
///
/// let mut state = SimulationState::new();
/// let id = state.next_household_id();
/// state.insert_household(Household::new(id, Tenure::Rent, 25_000.0, 5_000.0, 0.3));
///
/// assert_eq!(state.num_households(), 1);
/// assert!(state.get_household(id).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    houses: BTreeMap<HouseId, House>,
    households: BTreeMap<HouseholdId, Household>,
    realtors: BTreeMap<RealtorId, Realtor>,
    counters: IdCounters,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from its parts (used when restoring checkpoints)
    ///
    /// Counters are raised past every id present so restored agents are
    /// never shadowed by new ones.
    pub fn from_parts(
        houses: Vec<House>,
        households: Vec<Household>,
        realtors: Vec<Realtor>,
        counters: IdCounters,
    ) -> Self {
        let mut counters = counters;
        for h in &houses {
            counters.house = counters.house.max(h.id.0 + 1);
        }
        for h in &households {
            counters.household = counters.household.max(h.id.0 + 1);
        }
        for r in &realtors {
            counters.realtor = counters.realtor.max(r.id.0 + 1);
        }
        Self {
            houses: houses.into_iter().map(|h| (h.id, h)).collect(),
            households: households.into_iter().map(|h| (h.id, h)).collect(),
            realtors: realtors.into_iter().map(|r| (r.id, r)).collect(),
            counters,
        }
    }

    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    // ========================================================================
    // Id allocation and membership
    // ========================================================================

    pub fn next_house_id(&mut self) -> HouseId {
        let id = HouseId(self.counters.house);
        self.counters.house += 1;
        id
    }

    pub fn next_household_id(&mut self) -> HouseholdId {
        let id = HouseholdId(self.counters.household);
        self.counters.household += 1;
        id
    }

    pub fn next_realtor_id(&mut self) -> RealtorId {
        let id = RealtorId(self.counters.realtor);
        self.counters.realtor += 1;
        id
    }

    /// Add a house to the registry
    ///
    /// # Panics
    ///
    /// Panics if the id is already registered
    pub fn insert_house(&mut self, house: House) {
        assert!(
            !self.houses.contains_key(&house.id),
            "House ID {} already exists",
            house.id
        );
        self.counters.house = self.counters.house.max(house.id.0 + 1);
        self.houses.insert(house.id, house);
    }

    /// Add a household to the registry
    ///
    /// # Panics
    ///
    /// Panics if the id is already registered
    pub fn insert_household(&mut self, household: Household) {
        assert!(
            !self.households.contains_key(&household.id),
            "Household ID {} already exists",
            household.id
        );
        self.counters.household = self.counters.household.max(household.id.0 + 1);
        self.households.insert(household.id, household);
    }

    /// Add a realtor to the registry
    ///
    /// # Panics
    ///
    /// Panics if the id is already registered
    pub fn insert_realtor(&mut self, realtor: Realtor) {
        assert!(
            !self.realtors.contains_key(&realtor.id),
            "Realtor ID {} already exists",
            realtor.id
        );
        self.counters.realtor = self.counters.realtor.max(realtor.id.0 + 1);
        self.realtors.insert(realtor.id, realtor);
    }

    pub fn remove_house(&mut self, id: HouseId) -> Option<House> {
        self.houses.remove(&id)
    }

    pub fn remove_household(&mut self, id: HouseholdId) -> Option<Household> {
        self.households.remove(&id)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(&id)
    }

    pub fn get_house_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(&id)
    }

    pub fn get_household(&self, id: HouseholdId) -> Option<&Household> {
        self.households.get(&id)
    }

    pub fn get_household_mut(&mut self, id: HouseholdId) -> Option<&mut Household> {
        self.households.get_mut(&id)
    }

    pub fn get_realtor(&self, id: RealtorId) -> Option<&Realtor> {
        self.realtors.get(&id)
    }

    pub fn get_realtor_mut(&mut self, id: RealtorId) -> Option<&mut Realtor> {
        self.realtors.get_mut(&id)
    }

    /// Like [`get_house`](Self::get_house), failing with `HouseNotFound`
    pub fn house(&self, id: HouseId) -> Result<&House, SimulationError> {
        self.houses.get(&id).ok_or(SimulationError::HouseNotFound(id))
    }

    pub fn house_mut(&mut self, id: HouseId) -> Result<&mut House, SimulationError> {
        self.houses
            .get_mut(&id)
            .ok_or(SimulationError::HouseNotFound(id))
    }

    /// Like [`get_household`](Self::get_household), failing with `HouseholdNotFound`
    pub fn household(&self, id: HouseholdId) -> Result<&Household, SimulationError> {
        self.households
            .get(&id)
            .ok_or(SimulationError::HouseholdNotFound(id))
    }

    pub fn household_mut(&mut self, id: HouseholdId) -> Result<&mut Household, SimulationError> {
        self.households
            .get_mut(&id)
            .ok_or(SimulationError::HouseholdNotFound(id))
    }

    pub fn realtor_mut(&mut self, id: RealtorId) -> Result<&mut Realtor, SimulationError> {
        self.realtors
            .get_mut(&id)
            .ok_or(SimulationError::RealtorNotFound(id))
    }

    pub fn houses(&self) -> impl Iterator<Item = &House> {
        self.houses.values()
    }

    pub fn houses_mut(&mut self) -> impl Iterator<Item = &mut House> {
        self.houses.values_mut()
    }

    pub fn households(&self) -> impl Iterator<Item = &Household> {
        self.households.values()
    }

    pub fn households_mut(&mut self) -> impl Iterator<Item = &mut Household> {
        self.households.values_mut()
    }

    pub fn realtors(&self) -> impl Iterator<Item = &Realtor> {
        self.realtors.values()
    }

    pub fn realtors_mut(&mut self) -> impl Iterator<Item = &mut Realtor> {
        self.realtors.values_mut()
    }

    pub fn house_ids(&self) -> Vec<HouseId> {
        self.houses.keys().copied().collect()
    }

    pub fn household_ids(&self) -> Vec<HouseholdId> {
        self.households.keys().copied().collect()
    }

    pub fn realtor_ids(&self) -> Vec<RealtorId> {
        self.realtors.keys().copied().collect()
    }

    pub fn num_houses(&self) -> usize {
        self.houses.len()
    }

    pub fn num_households(&self) -> usize {
        self.households.len()
    }

    pub fn num_realtors(&self) -> usize {
        self.realtors.len()
    }

    // ========================================================================
    // Offers
    // ========================================================================

    /// Record a pending offer by `household` on `house`
    pub fn place_offer(&mut self, household: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
        let target = self.house_mut(house)?;
        if !target.is_listed() {
            return Err(SimulationError::Invariant(format!(
                "offer by {} on unlisted {}",
                household, house
            )));
        }
        if let Some(existing) = target.offered_to {
            return Err(SimulationError::Invariant(format!(
                "{} already holds the offer on {}",
                existing, house
            )));
        }
        target.offered_to = Some(household);
        self.household_mut(household)?.offer = Some(house);
        Ok(())
    }

    /// Clear the pending offer on `house` and its reciprocal reference
    pub fn withdraw_offer(&mut self, house: HouseId) -> Option<HouseholdId> {
        let offerer = self.houses.get_mut(&house)?.offered_to.take()?;
        self.clear_offer_of(offerer, house);
        Some(offerer)
    }

    /// Clear `household`'s offer reference if it still points at `house`
    pub fn clear_offer_of(&mut self, household: HouseholdId, house: HouseId) {
        if let Some(hh) = self.households.get_mut(&household) {
            if hh.offer == Some(house) {
                hh.offer = None;
            }
        }
    }

    /// Withdraw every pending offer; returns how many were withdrawn
    pub fn withdraw_all_offers(&mut self) -> usize {
        let mut withdrawn = 0;
        for house in self.houses.values_mut() {
            if house.offered_to.take().is_some() {
                withdrawn += 1;
            }
        }
        for household in self.households.values_mut() {
            household.offer = None;
        }
        withdrawn
    }

    /// Households currently on a market, in id order
    pub fn market_participants(&self) -> Vec<HouseholdId> {
        self.households
            .values()
            .filter(|h| h.is_on_market())
            .map(|h| h.id)
            .collect()
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Verify registry-wide agreement between agents
    ///
    /// Returns the first violation found, naming the agents involved.
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        for hh in self.households.values() {
            let mut seen = BTreeSet::new();
            for holding in &hh.portfolio {
                if !seen.insert(holding.house) {
                    return Err(SimulationError::Invariant(format!(
                        "{} holds {} twice",
                        hh.id, holding.house
                    )));
                }
                let house = self.house(holding.house)?;
                if house.owner != Some(hh.id) {
                    return Err(SimulationError::Invariant(format!(
                        "{} holds {} but the house names owner {:?}",
                        hh.id, holding.house, house.owner
                    )));
                }
            }

            if let Some(residence) = hh.residence {
                let house = self.house(residence)?;
                if house.occupier != Some(hh.id) {
                    return Err(SimulationError::Invariant(format!(
                        "{} lives in {} but the house names occupier {:?}",
                        hh.id, residence, house.occupier
                    )));
                }
            }

            if let Some(target) = hh.offer {
                let house = self.house(target)?;
                if house.offered_to != Some(hh.id) {
                    return Err(SimulationError::Invariant(format!(
                        "{} has an offer on {} which the house does not record",
                        hh.id, target
                    )));
                }
            }
        }

        for house in self.houses.values() {
            if let Some(owner) = house.owner {
                if !self.household(owner)?.owns(house.id) {
                    return Err(SimulationError::NotInPortfolio {
                        household: owner,
                        house: house.id,
                    });
                }
            }

            if let Some(occupier) = house.occupier {
                if self.household(occupier)?.residence != Some(house.id) {
                    return Err(SimulationError::Invariant(format!(
                        "{} names occupier {} who lives elsewhere",
                        house.id, occupier
                    )));
                }
            }

            if let Some(offerer) = house.offered_to {
                if !house.is_listed() {
                    return Err(SimulationError::Invariant(format!(
                        "{} has a pending offer from {} but is not listed",
                        house.id, offerer
                    )));
                }
                if self.household(offerer)?.offer != Some(house.id) {
                    return Err(SimulationError::Invariant(format!(
                        "{} records an offer from {} who bid elsewhere",
                        house.id, offerer
                    )));
                }
            }

            if let (Some(owner), Some(occupier)) = (house.owner, house.occupier) {
                if owner != occupier && house.tenure != Tenure::Rent {
                    return Err(SimulationError::Invariant(format!(
                        "mortgage-type {} is owned by {} but occupied by {}",
                        house.id, owner, occupier
                    )));
                }
            }
        }

        Ok(())
    }
}
