//! Transfer of houses between households
//!
//! # Sales
//!
//! The seller is paid its equity and loses the holding. The buyer pays from
//! capital first and finances any shortfall with a new mortgage over the
//! full mortgage duration, fixed for a randomly drawn term. An owner-occupier
//! buyer moves in; a buy-to-let buyer lets the house out at the higher of
//! the local rent and its new repayment.
//!
//! # Tenancies
//!
//! The landlord starts collecting the agreed rent and the tenant moves in.
//!
//! In both cases the household's previous home is left listed, so a later
//! link of a chain can still complete against it this tick.

use crate::models::event::Event;
use crate::models::holding::Holding;
use crate::models::house::Tenure;
use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId};
use crate::models::realtor::RecordKind;
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use crate::valuation::{evaluate, record_price};

/// Leave the current home, keeping it listed for whoever bid on it
fn vacate(ctx: &mut TickContext<'_>, household: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
    let owned = ctx.state.household(household)?.owns(house);
    let h = ctx.state.house_mut(house)?;
    if h.occupier == Some(household) {
        h.occupier = None;
    }
    let landlord = h.owner;

    if !owned {
        if let Some(landlord) = landlord {
            if let Some(holding) = ctx.state.household_mut(landlord)?.holding_mut(house) {
                holding.rent_income = 0.0;
            }
        }
        ctx.state.household_mut(household)?.rent = 0.0;
    }
    ctx.ensure_listed(house)?;

    let hh = ctx.state.household_mut(household)?;
    if hh.residence == Some(house) {
        hh.residence = None;
    }
    Ok(())
}

/// Complete a purchase of `house` by `buyer`
pub fn settle_sale(ctx: &mut TickContext<'_>, buyer: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
    let market = ctx
        .state
        .household(buyer)?
        .market
        .filter(|m| m.is_purchase())
        .ok_or_else(|| SimulationError::Invariant(format!("{} settles a sale off the purchase market", buyer)))?;
    let h = ctx.state.house(house)?;
    let price = h.sale_price;
    let seller = h.owner;

    if let Some(seller) = seller {
        let s = ctx.state.household_mut(seller)?;
        let holding = s
            .take_holding(house)
            .ok_or(SimulationError::NotInPortfolio { household: seller, house })?;
        s.capital += holding.equity_at(price);
        if s.residence == Some(house) {
            s.residence = None;
            ctx.unplace_household(seller)?;
        }
    }
    ctx.state.house_mut(house)?.occupier = None;

    let capital = ctx.state.household(buyer)?.capital;
    let principal = (price - capital).max(0.0);
    let holding = if principal > 0.0 {
        let rate_term = ctx
            .config
            .draw_rate_term(ctx.rng, market == MarketKind::BuyToLet);
        Holding::financed(house, principal, ctx.rate, ctx.config.mortgage_periods(), rate_term)
    } else {
        Holding::outright(house)
    };
    let repayment = holding.repayment;
    let b = ctx.state.household_mut(buyer)?;
    b.capital = (capital - price).max(0.0);
    b.portfolio.push(holding);
    ctx.state.house_mut(house)?.owner = Some(buyer);
    record_price(ctx.state, house, RecordKind::Sale, ctx.tick)?;

    match market {
        MarketKind::Mortgage => {
            if let Some(old) = ctx.state.household(buyer)?.residence {
                vacate(ctx, buyer, old)?;
            }
            let h = ctx.state.house_mut(house)?;
            h.tenure = Tenure::Mortgage;
            h.occupier = Some(buyer);
            ctx.unlist_house(house)?;

            let b = ctx.state.household_mut(buyer)?;
            b.homeless = 0;
            b.tenure = Tenure::Mortgage;
            b.residence = Some(house);
            b.offer = None;
            ctx.leave_market(buyer)?;
            ctx.move_household(buyer, house)?;
        }
        _ => {
            ctx.state.house_mut(house)?.tenure = Tenure::Rent;
            ctx.list_house(house)?;
            let local_rent = evaluate(ctx.state, ctx.space, ctx.config.locality, house)?;
            ctx.state.house_mut(house)?.rent_price = local_rent.max(repayment);
            ctx.state.household_mut(buyer)?.offer = None;
            ctx.leave_market(buyer)?;
        }
    }

    ctx.log(Event::SaleSettled {
        tick: ctx.tick,
        buyer,
        seller,
        house,
        price,
        mortgage: principal,
        market,
    });
    Ok(())
}

/// Complete a letting of `house` to `tenant`
pub fn settle_tenancy(ctx: &mut TickContext<'_>, tenant: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
    let h = ctx.state.house(house)?;
    let rent = h.rent_price;
    let landlord = h.owner;
    let previous = h.occupier;

    if let Some(landlord) = landlord {
        if let Some(holding) = ctx.state.household_mut(landlord)?.holding_mut(house) {
            holding.rent_income = rent;
        }
    }

    if let Some(previous) = previous.filter(|p| *p != tenant) {
        let p = ctx.state.household_mut(previous)?;
        p.residence = None;
        p.rent = 0.0;
        ctx.unplace_household(previous)?;
    }

    if let Some(old) = ctx.state.household(tenant)?.residence {
        if old != house {
            vacate(ctx, tenant, old)?;
        }
    }

    ctx.state.house_mut(house)?.occupier = Some(tenant);
    ctx.unlist_house(house)?;
    record_price(ctx.state, house, RecordKind::Rent, ctx.tick)?;

    let t = ctx.state.household_mut(tenant)?;
    t.homeless = 0;
    t.tenure = Tenure::Rent;
    t.residence = Some(house);
    t.rent = rent;
    t.offer = None;
    ctx.leave_market(tenant)?;
    ctx.move_household(tenant, house)?;

    ctx.log(Event::TenancySettled {
        tick: ctx.tick,
        tenant,
        landlord,
        house,
        rent,
    });
    Ok(())
}
