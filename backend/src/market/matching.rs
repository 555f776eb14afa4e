//! Offer Matching Engine
//!
//! Every active participant computes an affordability window from its
//! market and bids on the highest-priced listing inside it. A house takes
//! at most one offer per tick and a household makes at most one.
//!
//! # Affordability windows
//!
//! - Mortgage and buy-to-let bidders: the annuity value of the affordable
//!   repayment plus the deposit, capped by loan-to-value headroom on the
//!   deposit. A mortgage bidder whose own residence is listed for sale
//!   counts its equity in the deposit.
//! - Rent bidders: the affordable share of income, with no leverage.
//!
//! The lower bound is a fixed 70 % of the upper bound.

use crate::finance::ltv_price_cap;
use crate::models::event::Event;
use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId};
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use log::debug;

/// Lower bound of the affordability window as a share of the upper bound
pub const LOWER_BOUND_SHARE: f64 = 0.7;

/// Price band a bidder will consider: `(lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWindow {
    pub lower: f64,
    pub upper: f64,
}

impl PriceWindow {
    pub fn new(upper: f64) -> Self {
        Self {
            lower: upper * LOWER_BOUND_SHARE,
            upper,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price > self.lower && price <= self.upper
    }
}

/// Upper bound on what a household can pay on `market`
///
/// Returns `None` for purchase markets when the bound is not positive.
pub fn affordability_upper_bound(
    ctx: &TickContext<'_>,
    household: HouseholdId,
    market: MarketKind,
) -> Result<Option<f64>, SimulationError> {
    let hh = ctx.state.household(household)?;
    let config = ctx.config;
    let payment = config.affordable_payment(hh.income);

    if market == MarketKind::Rent {
        return Ok(Some(payment));
    }

    let budget = config.serviceable_mortgage(payment, ctx.annual_rate());
    let mut deposit = hh.capital;
    if market == MarketKind::Mortgage {
        if let Some(residence) = hh.residence {
            if let Some(holding) = hh.holding(residence) {
                let house = ctx.state.house(residence)?;
                if house.is_for_sale() {
                    deposit += holding.equity_at(house.sale_price);
                }
            }
        }
    }

    let upper = (budget + deposit).min(ltv_price_cap(deposit, config.ltv()));
    Ok((upper > 0.0).then_some(upper))
}

/// Listing ids on the market a bidder trades on, fixed at the start of matching
struct Listings {
    for_sale: Vec<HouseId>,
    for_rent: Vec<HouseId>,
}

/// Make this tick's offers; returns how many were placed
pub fn make_offers(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let listings = Listings {
        for_sale: ctx
            .state
            .houses()
            .filter(|h| h.is_for_sale())
            .map(|h| h.id)
            .collect(),
        for_rent: ctx
            .state
            .houses()
            .filter(|h| h.is_for_rent())
            .map(|h| h.id)
            .collect(),
    };

    let mut placed = 0;
    for bidder in ctx.state.market_participants() {
        if make_offer(ctx, bidder, &listings)? {
            placed += 1;
        }
    }

    ctx.monitors.n_offers = placed;
    debug!("tick {}: {} offers placed", ctx.tick, placed);
    Ok(placed)
}

fn make_offer(ctx: &mut TickContext<'_>, bidder: HouseholdId, listings: &Listings) -> Result<bool, SimulationError> {
    let hh = ctx.state.household(bidder)?;
    let Some(market) = hh.market else {
        return Ok(false);
    };
    if hh.offer.is_some() {
        return Ok(false);
    }
    let residence = hh.residence;

    let Some(upper) = affordability_upper_bound(ctx, bidder, market)? else {
        match market {
            MarketKind::Mortgage => {
                // homeless bidders keep searching; housed ones give up and
                // take their own home back off the market
                if let Some(residence) = residence {
                    ctx.leave_market(bidder)?;
                    if ctx.state.household(bidder)?.owns(residence) {
                        ctx.unlist_house(residence)?;
                    }
                }
            }
            MarketKind::BuyToLet => ctx.leave_market(bidder)?,
            MarketKind::Rent => {}
        }
        return Ok(false);
    };
    let window = PriceWindow::new(upper);

    let pool = if market.is_purchase() {
        &listings.for_sale
    } else {
        &listings.for_rent
    };
    let hh = ctx.state.household(bidder)?;
    let mut candidates: Vec<(HouseId, f64)> = pool
        .iter()
        .filter_map(|id| ctx.state.get_house(*id))
        .filter(|h| h.offered_to.is_none())
        .filter(|h| Some(h.id) != residence && !hh.owns(h.id))
        .filter_map(|h| {
            let price = if market.is_purchase() {
                h.is_for_sale().then_some(h.sale_price)?
            } else {
                h.is_for_rent().then_some(h.rent_price)?
            };
            window.contains(price).then_some((h.id, price))
        })
        .collect();

    let search_length = ctx.config.buyer_search_length;
    if candidates.len() > search_length {
        let picks = ctx.rng.sample_indices(candidates.len(), search_length);
        candidates = picks.into_iter().map(|i| candidates[i]).collect();
    }

    // highest price wins; ties go to the first drawn
    let mut best: Option<(HouseId, f64)> = None;
    for (id, price) in candidates {
        if best.map_or(true, |(_, p)| price > p) {
            best = Some((id, price));
        }
    }
    let Some((house, price)) = best else {
        return Ok(false);
    };

    ctx.state.place_offer(bidder, house)?;
    ctx.log(Event::OfferMade {
        tick: ctx.tick,
        household: bidder,
        house,
        market,
        price,
    });
    Ok(true)
}
