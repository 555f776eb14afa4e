//! Eviction Cascade
//!
//! Evicting a tenant clears one tenancy. Evicting an owner-occupier
//! repossesses the whole portfolio: every owned house loses its occupant
//! (tenants are evicted in turn and sent to the rent market), is converted
//! to sale stock and relisted, and the owner leaves propertyless.
//!
//! Removal of a household from the city reuses the same cascade so that no
//! house is left pointing at a departed owner or occupier.

use crate::models::event::Event;
use crate::models::house::Tenure;
use crate::models::household::MarketKind;
use crate::models::ids::{HouseId, HouseholdId};
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use log::{debug, trace};

/// Evict a household from its residence
///
/// Returns every house relisted as a consequence, the residence included.
///
/// # Errors
///
/// `NoResidence` if the household is homeless.
pub fn evict(ctx: &mut TickContext<'_>, id: HouseholdId) -> Result<Vec<HouseId>, SimulationError> {
    let hh = ctx.state.household(id)?;
    let residence = hh.residence.ok_or(SimulationError::NoResidence(id))?;
    let owner_occupier = hh.owns(residence);

    let relisted = if owner_occupier {
        release_portfolio(ctx, id)?
    } else {
        vacate_tenancy(ctx, id, residence)?;
        vec![residence]
    };

    let hh = ctx.state.household_mut(id)?;
    hh.residence = None;
    hh.rent = 0.0;
    hh.homeless = 0;
    let tenure = hh.tenure;
    ctx.unplace_household(id)?;

    debug!(
        "tick {}: evicted {} from {} ({} houses relisted)",
        ctx.tick,
        id,
        residence,
        relisted.len()
    );
    ctx.log(Event::Evicted {
        tick: ctx.tick,
        household: id,
        house: residence,
        tenure,
        relisted: relisted.clone(),
    });
    Ok(relisted)
}

/// Clear a tenant's link to a let house and relist it
fn vacate_tenancy(ctx: &mut TickContext<'_>, tenant: HouseholdId, house: HouseId) -> Result<(), SimulationError> {
    let h = ctx.state.house_mut(house)?;
    if h.occupier == Some(tenant) {
        h.occupier = None;
    }
    let landlord = h.owner;
    ctx.list_house(house)?;
    if let Some(landlord) = landlord {
        if let Some(holding) = ctx.state.household_mut(landlord)?.holding_mut(house) {
            holding.rent_income = 0.0;
        }
    }
    Ok(())
}

/// Strip a household of every house it owns
///
/// Occupants other than the owner are evicted into the rent market. Each
/// house is converted to sale stock, unowned, unoccupied and relisted.
/// Returns the relisted houses in portfolio order.
pub fn release_portfolio(ctx: &mut TickContext<'_>, id: HouseholdId) -> Result<Vec<HouseId>, SimulationError> {
    let owned = ctx.state.household(id)?.owned_houses();

    for house in &owned {
        if let Some(occupier) = ctx.state.house(*house)?.occupier {
            if occupier != id {
                trace!("{} displaced from {} by repossession", occupier, house);
                evict(ctx, occupier)?;
                ctx.enter_market(occupier, MarketKind::Rent)?;
            }
        }
        let h = ctx.state.house_mut(*house)?;
        h.tenure = Tenure::Mortgage;
        h.owner = None;
        h.occupier = None;
        ctx.list_house(*house)?;
    }

    ctx.state.household_mut(id)?.portfolio.clear();
    Ok(owned)
}

/// Put one non-residence house of a struggling landlord up for sale
///
/// A vacant let house is preferred, chosen at random, and converted to
/// sale stock. Otherwise the house
/// with the most equity is taken, its tenant evicted into the rent market,
/// and it is converted to sale stock. Returns the house listed, if the
/// household had one to spare.
pub fn force_sell(ctx: &mut TickContext<'_>, id: HouseholdId) -> Result<Option<HouseId>, SimulationError> {
    let hh = ctx.state.household(id)?;
    let residence = hh.residence;

    let mut vacant = Vec::new();
    let mut best: Option<(HouseId, f64)> = None;
    for holding in hh.portfolio.iter().filter(|h| Some(h.house) != residence) {
        let house = ctx.state.house(holding.house)?;
        if house.tenure == Tenure::Rent && house.occupier.is_none() {
            vacant.push(house.id);
        }
        let equity = holding.equity_at(house.sale_price);
        if best.map_or(true, |(_, e)| equity > e) {
            best = Some((house.id, equity));
        }
    }

    let chosen = if let Some(index) = ctx.rng.choose_index(vacant.len()) {
        let house = vacant[index];
        ctx.state.house_mut(house)?.tenure = Tenure::Mortgage;
        ctx.list_house(house)?;
        house
    } else if let Some((house, _)) = best {
        if let Some(occupier) = ctx.state.house(house)?.occupier {
            evict(ctx, occupier)?;
            ctx.enter_market(occupier, MarketKind::Rent)?;
        }
        ctx.state.house_mut(house)?.tenure = Tenure::Mortgage;
        ctx.list_house(house)?;
        house
    } else {
        return Ok(None);
    };

    ctx.log(Event::ForcedSale {
        tick: ctx.tick,
        household: id,
        house: chosen,
    });
    Ok(Some(chosen))
}

/// Remove a household from the city, releasing everything it holds
pub fn remove_household(ctx: &mut TickContext<'_>, id: HouseholdId) -> Result<(), SimulationError> {
    if ctx.state.household(id)?.is_housed() {
        evict(ctx, id)?;
    }
    if !ctx.state.household(id)?.portfolio.is_empty() {
        release_portfolio(ctx, id)?;
    }
    if let Some(house) = ctx.state.household(id)?.offer {
        ctx.state.withdraw_offer(house);
    }
    ctx.unplace_household(id)?;
    ctx.state.remove_household(id);
    Ok(())
}
