//! Chain Resolution
//!
//! A purchase can complete only if the seller can get out of the way, and
//! a tenancy only if the sitting occupant can. Each bidder's chain is
//! followed through the offer snapshot taken before any settlement, so the
//! verdict for one bidder never depends on another bidder's settlement.
//!
//! # Algorithm
//!
//! Starting at the bidder, step to whoever must move for the current
//! household's offer to complete:
//!
//! - purchase: the owner of the target, unless there is none, it owns more
//!   than one house, it is the household itself, or it is the chain head
//! - tenancy: the occupier of the target, unless there is none or it is the
//!   chain head
//!
//! The chain resolves when a stop condition holds and fails when it reaches
//! a household with no offer in the snapshot.

use crate::models::event::Event;
use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId};
use crate::models::state::SimulationState;
use crate::orchestrator::context::TickContext;
use log::{trace, warn};
use std::collections::BTreeMap;

/// Every pending offer at the start of resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferSnapshot {
    offers: BTreeMap<HouseholdId, (HouseId, MarketKind)>,
}

impl OfferSnapshot {
    /// Capture the offers of every household on a market
    pub fn capture(state: &SimulationState) -> Self {
        let offers = state
            .households()
            .filter_map(|hh| Some((hh.id, (hh.offer?, hh.market?))))
            .collect();
        Self { offers }
    }

    pub fn get(&self, household: HouseholdId) -> Option<(HouseId, MarketKind)> {
        self.offers.get(&household).copied()
    }

    pub fn bidders(&self) -> impl Iterator<Item = HouseholdId> + '_ {
        self.offers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Whether `bidder`'s chain of dependent moves can complete
///
/// Ownership and occupancy are read from `state`, which must not have been
/// touched by settlement since `snapshot` was captured.
pub fn can_settle(snapshot: &OfferSnapshot, state: &SimulationState, bidder: HouseholdId) -> bool {
    let mut current = bidder;
    // a chain can visit each bidder at most once before closing
    for _ in 0..=snapshot.len() {
        let Some((target, market)) = snapshot.get(current) else {
            return false;
        };
        let Some(house) = state.get_house(target) else {
            return false;
        };

        let next = if market.is_purchase() {
            let Some(seller) = house.owner else {
                return true;
            };
            if seller == current || seller == bidder {
                return true;
            }
            let seller_holdings = state
                .get_household(seller)
                .map_or(0, |hh| hh.portfolio.len());
            if seller_holdings > 1 {
                return true;
            }
            seller
        } else {
            let Some(occupant) = house.occupier else {
                return true;
            };
            if occupant == bidder {
                return true;
            }
            occupant
        };

        trace!("chain of {}: {} waits on {}", bidder, current, next);
        current = next;
    }

    warn!("chain of {} did not close within {} steps", bidder, snapshot.len() + 1);
    false
}

/// Resolve every pending offer; returns the bidders cleared to settle
///
/// Rejected offers stay pending until the end-of-tick withdrawal.
pub fn resolve(ctx: &mut TickContext<'_>) -> Vec<HouseholdId> {
    let snapshot = OfferSnapshot::capture(ctx.state);
    let mut cleared = Vec::with_capacity(snapshot.len());
    let mut rejected = Vec::new();

    for bidder in snapshot.bidders() {
        if can_settle(&snapshot, ctx.state, bidder) {
            cleared.push(bidder);
        } else if let Some((house, _)) = snapshot.get(bidder) {
            rejected.push((bidder, house));
        }
    }

    for (household, house) in rejected {
        ctx.monitors.n_chains_rejected += 1;
        ctx.log(Event::ChainRejected {
            tick: ctx.tick,
            household,
            house,
        });
    }
    cleared
}
