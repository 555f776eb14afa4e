//! Settlement Module
//!
//! Commits this tick's offers:
//!
//! - **chain**: decides, against a snapshot of every pending offer, which
//!   bidders' chains of dependent moves can complete
//! - **transfer**: moves ownership, occupancy and money for one sale or
//!   tenancy
//! - **eviction**: clears residences and repossesses portfolios, used by
//!   the classifier, demolition and household removal
//!
//! # Critical Invariants
//!
//! 1. **Snapshot resolution**: every chain is judged before any settlement
//!    mutates ownership
//! 2. **Sequential commit**: cleared bidders settle one at a time in id order,
//!    each against the live registry
//! 3. **Liveness**: a cleared offer whose target was taken or delisted by an
//!    earlier settlement is skipped, never half-applied

pub mod chain;
pub mod eviction;
pub mod transfer;

pub use chain::{can_settle, resolve, OfferSnapshot};
pub use eviction::{evict, force_sell, release_portfolio, remove_household};
pub use transfer::{settle_sale, settle_tenancy};

use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId};
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use log::{debug, trace};

/// What one settlement pass committed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub cleared: usize,
    pub sales: usize,
    pub rentals: usize,
    pub skipped: usize,
}

/// Resolve chains, then settle every cleared offer that is still live
pub fn settle_offers(ctx: &mut TickContext<'_>) -> Result<SettlementOutcome, SimulationError> {
    let cleared = resolve(ctx);
    let mut outcome = SettlementOutcome {
        cleared: cleared.len(),
        ..Default::default()
    };

    for bidder in cleared {
        let Some((house, market)) = live_offer(ctx, bidder) else {
            trace!("offer of {} no longer live", bidder);
            outcome.skipped += 1;
            continue;
        };
        match market {
            MarketKind::Mortgage | MarketKind::BuyToLet => {
                settle_sale(ctx, bidder, house)?;
                outcome.sales += 1;
                if market == MarketKind::Mortgage {
                    ctx.monitors.moves += 1;
                }
            }
            MarketKind::Rent => {
                settle_tenancy(ctx, bidder, house)?;
                outcome.rentals += 1;
                ctx.monitors.moves += 1;
            }
        }
    }

    ctx.monitors.n_sales = outcome.sales;
    ctx.monitors.n_rentals = outcome.rentals;
    debug!(
        "tick {}: {} cleared, {} sales, {} rentals, {} skipped",
        ctx.tick, outcome.cleared, outcome.sales, outcome.rentals, outcome.skipped
    );
    Ok(outcome)
}

/// The bidder's offer if both sides still agree on it and the house is
/// still on the matching market
fn live_offer(ctx: &TickContext<'_>, bidder: HouseholdId) -> Option<(HouseId, MarketKind)> {
    let hh = ctx.state.get_household(bidder)?;
    let house = ctx.state.get_house(hh.offer?)?;
    let market = hh.market?;
    let on_market = if market.is_purchase() {
        house.is_for_sale()
    } else {
        house.is_for_rent()
    };
    let live = house.offered_to == Some(bidder) && on_market && house.owner != Some(bidder);
    live.then_some((house.id, market))
}
