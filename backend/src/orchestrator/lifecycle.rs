//! Population and housing-stock dynamics
//!
//! The phases of a tick that do not trade: households arriving, leaving and
//! giving up, houses being built and demolished, and the end-of-tick
//! financial update of every household.

use crate::models::event::Event;
use crate::models::house::{House, Tenure};
use crate::models::household::{Household, MarketKind};
use crate::models::ids::{Entity, HouseId, HouseholdId};
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use crate::settlement::eviction::{evict, remove_household};
use crate::spatial::vacant_plots;
use crate::valuation::{
    assign_local_realtors, demolition_candidates, join_localities, leave_localities, remove_records, MarketSnapshot,
};
use log::debug;

fn share_of(count: usize, percent: f64) -> usize {
    (count as f64 * percent / 100.0).floor() as usize
}

// ============================================================================
// Population
// ============================================================================

/// Remove a random sample of housed households from the city
pub fn natural_exit(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let housed: Vec<HouseholdId> = ctx
        .state
        .households()
        .filter(|h| h.is_housed())
        .map(|h| h.id)
        .collect();
    let n = share_of(ctx.state.num_households(), ctx.config.exit_rate).min(housed.len());

    let mut exited = 0;
    for index in ctx.rng.sample_indices(housed.len(), n) {
        let id = housed[index];
        // an earlier exit may have taken this household's landlord, not the household
        if ctx.state.get_household(id).is_none() {
            continue;
        }
        remove_household(ctx, id)?;
        ctx.log(Event::HouseholdExited {
            tick: ctx.tick,
            household: id,
        });
        exited += 1;
    }

    ctx.monitors.n_natural_exit = exited;
    Ok(exited)
}

/// Bring new homeless households into the city, half on each market
pub fn natural_entry(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let n = share_of(ctx.state.num_households(), ctx.config.entry_rate);
    let mean_income = ctx.config.mean_income;

    for _ in 0..n {
        let market = if ctx.rng.next_f64() < 0.5 {
            MarketKind::Rent
        } else {
            MarketKind::Mortgage
        };
        let (tenure, capital_percent) = match market {
            MarketKind::Rent => (Tenure::Rent, ctx.config.capital_rent),
            _ => (Tenure::Mortgage, ctx.config.capital_mortgage),
        };
        let income = ctx.rng.normal(mean_income, mean_income / 6.0).max(0.0);
        let propensity = ctx.rng.next_f64();

        let id = ctx.state.next_household_id();
        let mut hh = Household::new(id, tenure, income, income * capital_percent / 100.0, propensity);
        hh.income_surplus = income / ctx.config.ticks_per_year as f64;
        ctx.state.insert_household(hh);

        ctx.log(Event::HouseholdEntered {
            tick: ctx.tick,
            household: id,
            market,
            income,
        });
        ctx.enter_market(id, market)?;
    }

    ctx.monitors.n_entry = n;
    Ok(n)
}

/// Count another homeless tick for every homeless household and remove
/// those that have waited too long
pub fn discourage_homeless(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let homeless: Vec<HouseholdId> = ctx
        .state
        .households()
        .filter(|h| !h.is_housed())
        .map(|h| h.id)
        .collect();

    let mut discouraged = 0;
    for id in homeless {
        let hh = ctx.state.household_mut(id)?;
        hh.homeless += 1;
        if hh.homeless <= ctx.config.max_homeless_period {
            continue;
        }
        let market = hh.market;
        remove_household(ctx, id)?;

        let m = &mut *ctx.monitors;
        match market {
            Some(MarketKind::Mortgage) => m.n_discouraged_mortgage += 1,
            Some(MarketKind::Rent) => m.n_discouraged_rent += 1,
            Some(MarketKind::BuyToLet) => m.n_discouraged_btl += 1,
            None => {}
        }
        ctx.log(Event::HouseholdDiscouraged {
            tick: ctx.tick,
            household: id,
            market,
        });
        discouraged += 1;
    }

    ctx.monitors.n_discouraged = discouraged;
    Ok(discouraged)
}

// ============================================================================
// Housing stock
// ============================================================================

/// Build new sale stock on random vacant plots
///
/// Stops early, without error, when the space runs out of vacant plots.
pub fn construct_houses(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let n = share_of(ctx.state.num_houses(), ctx.config.house_construction_rate);
    let mut plots = vacant_plots(ctx.space);
    let tpy = ctx.config.ticks_per_year as f64;

    let mut built = 0;
    for _ in 0..n {
        let Some(index) = ctx.rng.choose_index(plots.len()) else {
            debug!("tick {}: no vacant plot left for construction", ctx.tick);
            break;
        };
        let plot = plots.swap_remove(index);
        let end_of_life = ctx
            .rng
            .normal(
                ctx.config.house_mean_lifetime * tpy + ctx.tick as f64,
                ctx.config.house_lifetime_std_dev,
            )
            .max(0.0) as usize;
        let realtors = assign_local_realtors(ctx.state, ctx.space, plot, ctx.config.realtor_territory);

        let id = ctx.state.next_house_id();
        ctx.state
            .insert_house(House::new(id, plot, Tenure::Mortgage, end_of_life, realtors));
        ctx.space.place(Entity::House(id), plot)?;
        join_localities(ctx.state, id)?;
        ctx.list_house(id)?;

        ctx.log(Event::HouseConstructed {
            tick: ctx.tick,
            house: id,
            plot,
        });
        built += 1;
    }

    ctx.monitors.n_constructed = built;
    Ok(built)
}

/// Demolish worn-out and unsellable stock
///
/// `market` must be the snapshot of median asking prices taken before
/// matching this tick.
pub fn demolish_houses(ctx: &mut TickContext<'_>, market: &MarketSnapshot) -> Result<usize, SimulationError> {
    let candidates = demolition_candidates(ctx.state, ctx.tick, market, ctx.config.min_price_percent);

    let mut demolished = 0;
    for (id, reason) in candidates {
        let Some(house) = ctx.state.get_house(id) else {
            continue;
        };
        let (tenure, owner, occupier, price) = (house.tenure, house.owner, house.occupier, house.sale_price);

        match tenure {
            Tenure::Rent => {
                if let Some(tenant) = occupier {
                    evict(ctx, tenant)?;
                    ctx.enter_market(tenant, MarketKind::Rent)?;
                }
                if let Some(owner) = owner {
                    let o = ctx.state.household_mut(owner)?;
                    let holding = o
                        .take_holding(id)
                        .ok_or(SimulationError::NotInPortfolio { household: owner, house: id })?;
                    o.capital = (o.capital + holding.equity_at(price)).max(0.0);
                }
            }
            Tenure::Mortgage => match (owner, occupier) {
                (Some(owner), Some(occupier)) if owner == occupier => {
                    let o = ctx.state.household_mut(owner)?;
                    let equity = o
                        .holding(id)
                        .ok_or(SimulationError::NotInPortfolio { household: owner, house: id })?
                        .equity_at(price);
                    o.capital = (o.capital + equity).max(0.0);
                    evict(ctx, owner)?;
                    ctx.enter_market(owner, MarketKind::Mortgage)?;
                }
                (Some(owner), None) => {
                    ctx.state
                        .household_mut(owner)?
                        .take_holding(id)
                        .ok_or(SimulationError::NotInPortfolio { household: owner, house: id })?;
                }
                (None, None) => {}
                (owner, Some(occupier)) => {
                    return Err(SimulationError::Invariant(format!(
                        "mortgage-type {} occupied by {} but owned by {:?}",
                        id, occupier, owner
                    )));
                }
            },
        }

        remove_house(ctx, id)?;
        ctx.log(Event::HouseDemolished {
            tick: ctx.tick,
            house: id,
            owner,
            reason,
        });
        demolished += 1;
    }

    ctx.monitors.n_demolished = demolished;
    Ok(demolished)
}

/// Take an unowned, unoccupied house out of the registry and the space
fn remove_house(ctx: &mut TickContext<'_>, id: HouseId) -> Result<(), SimulationError> {
    ctx.state.withdraw_offer(id);
    remove_records(ctx.state, id);
    leave_localities(ctx.state, id);
    ctx.space.remove_if_placed(Entity::House(id))?;
    ctx.state.remove_house(id);
    Ok(())
}

// ============================================================================
// Finances
// ============================================================================

/// End-of-tick financial update of every household
///
/// Repays every holding, resets expired fixed rates onto the prevailing
/// rate, saves a share of surplus income and applies wage growth. Returns
/// the number of rate resets.
pub fn update_owners(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let tpy = ctx.config.ticks_per_year;
    let periods = ctx.config.mortgage_periods();
    let wage_factor = 1.0 + ctx.config.wage_rise / 100.0;
    let mut resets = 0;

    for id in ctx.state.household_ids() {
        let hh = ctx.state.household(id)?;
        let residence = hh.residence;

        for house in hh.owned_houses() {
            let holding = ctx
                .state
                .household_mut(id)?
                .holding_mut(house)
                .ok_or(SimulationError::NotInPortfolio { household: id, house })?;
            holding.apply_repayment();

            if holding.needs_rate_reset() {
                let term = ctx.config.draw_rate_term(ctx.rng, Some(house) != residence);
                let holding = ctx
                    .state
                    .household_mut(id)?
                    .holding_mut(house)
                    .ok_or(SimulationError::NotInPortfolio { household: id, house })?;
                let old_rate = holding.rate;
                holding.reset_rate(ctx.rate, periods, term);
                let (new_rate, repayment) = (holding.rate, holding.repayment);
                ctx.log(Event::RateReset {
                    tick: ctx.tick,
                    household: id,
                    house,
                    old_rate,
                    new_rate,
                    repayment,
                });
                resets += 1;
            }

            if let Some(holding) = ctx.state.household_mut(id)?.holding_mut(house) {
                holding.count_down_terms();
            }
        }

        let hh = ctx.state.household_mut(id)?;
        let savings = if hh.portfolio.is_empty() {
            ctx.config.savings_rent
        } else {
            ctx.config.savings
        };
        hh.capital = (hh.capital + hh.income_surplus * savings / 100.0).max(0.0);
        hh.refresh_surplus(tpy);
        hh.income *= wage_factor;
    }

    ctx.monitors.n_rate_resets = resets;
    Ok(resets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_of_floors() {
        assert_eq!(share_of(99, 2.0), 1);
        assert_eq!(share_of(1_100, 0.36), 3);
        assert_eq!(share_of(10, 0.0), 0);
    }
}
