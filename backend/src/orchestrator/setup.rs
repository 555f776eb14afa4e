//! Initial population of the city
//!
//! Builds realtors, housing stock and households at tick 0:
//!
//! 1. Realtors on random plots of a ring around the centre of the space
//! 2. Houses on random empty plots, split between sale and let stock
//! 3. Owner-occupiers, each financing its house with the largest mortgage
//!    its income and deposit allow
//! 4. Tenants, each let a house by a random owner-occupier at the
//!    affordable share of its income
//! 5. Remaining let stock handed to random landlords and listed for rent;
//!    remaining sale stock listed for sale
//!
//! Running out of stock for a household is a setup error.

use crate::core::stats::median;
use crate::models::holding::Holding;
use crate::models::house::{House, Tenure};
use crate::models::household::Household;
use crate::models::ids::{Entity, HouseId, HouseholdId, PlotId};
use crate::models::realtor::{Realtor, RecordKind};
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use crate::spatial::empty_plots;
use crate::valuation::{assign_local_realtors, evaluate, join_localities, record_price, refresh_realtor_means};
use log::{debug, info};

/// Agents created by [`initialise`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupSummary {
    pub realtors: usize,
    pub mortgage_houses: usize,
    pub rent_houses: usize,
    pub mortgage_households: usize,
    pub rent_households: usize,
    pub fully_paid: usize,
}

/// Populate an empty registry and space
pub fn initialise(ctx: &mut TickContext<'_>) -> Result<SetupSummary, SimulationError> {
    let mut summary = SetupSummary {
        realtors: place_realtors(ctx)?,
        ..Default::default()
    };

    let (mortgage_stock, rent_stock) = build_houses(ctx)?;
    summary.mortgage_houses = mortgage_stock.len();
    summary.rent_houses = rent_stock.len();

    let total = mortgage_stock.len() + rent_stock.len();
    let occupancy = ctx.config.initial_occupancy / 100.0;
    let n_mortgage = (total as f64 * ctx.config.owned_rent_percentage / 100.0 * occupancy).floor() as usize;
    let n_rent = ((total - n_mortgage.min(total)) as f64 * occupancy).floor() as usize;
    if n_mortgage > mortgage_stock.len() {
        return Err(SimulationError::Setup(format!(
            "{} owner-occupiers but only {} sale houses",
            n_mortgage,
            mortgage_stock.len()
        )));
    }
    if n_rent > rent_stock.len() {
        return Err(SimulationError::Setup(format!(
            "{} tenants but only {} let houses",
            n_rent,
            rent_stock.len()
        )));
    }
    if n_rent > 0 && n_mortgage == 0 {
        return Err(SimulationError::Setup("tenants but no landlords".to_string()));
    }

    let mut vacant_mortgage = mortgage_stock;
    let owners = seed_owner_occupiers(ctx, &mut vacant_mortgage, n_mortgage)?;
    let mut vacant_rent = rent_stock;
    let rents = seed_tenants(ctx, &mut vacant_rent, &owners, n_rent)?;
    summary.mortgage_households = owners.len();
    summary.rent_households = n_rent;

    if !vacant_rent.is_empty() && owners.is_empty() {
        return Err(SimulationError::Setup("let houses but no landlords".to_string()));
    }
    let fallback_rent = ctx.config.affordable_payment(ctx.config.mean_income);
    let median_rent = median(&rents).unwrap_or(fallback_rent);
    for house in vacant_rent {
        let_vacant(ctx, house, &owners, median_rent)?;
    }
    for house in &vacant_mortgage {
        ctx.list_house(*house)?;
    }

    summary.fully_paid = pay_off_sample(ctx, &owners);

    let tpy = ctx.config.ticks_per_year;
    for hh in ctx.state.households_mut() {
        hh.refresh_surplus(tpy);
    }
    refresh_realtor_means(ctx.state);
    for house in vacant_mortgage {
        let value = evaluate(ctx.state, ctx.space, ctx.config.locality, house)?;
        ctx.state.house_mut(house)?.sale_price = value;
    }

    info!(
        "setup: {} realtors, {}+{} houses, {}+{} households ({} fully paid)",
        summary.realtors,
        summary.mortgage_houses,
        summary.rent_houses,
        summary.mortgage_households,
        summary.rent_households,
        summary.fully_paid
    );
    Ok(summary)
}

fn place_realtors(ctx: &mut TickContext<'_>) -> Result<usize, SimulationError> {
    let radius = ctx.config.grid_width as f64 / 4.0;
    let mut ring = ctx.space.plots_within_radius(ctx.space.center(), radius, true);
    if ring.len() < ctx.config.n_realtors {
        return Err(SimulationError::Setup(format!(
            "{} realtors but only {} plots on the ring of radius {}",
            ctx.config.n_realtors,
            ring.len(),
            radius
        )));
    }
    for _ in 0..ctx.config.n_realtors {
        let Some(index) = ctx.rng.choose_index(ring.len()) else {
            break;
        };
        let plot = ring.swap_remove(index);
        let id = ctx.state.next_realtor_id();
        ctx.state.insert_realtor(Realtor::new(id, plot));
        ctx.space.place(Entity::Realtor(id), plot)?;
    }
    Ok(ctx.state.num_realtors())
}

/// Place sale and let stock on random empty plots
fn build_houses(ctx: &mut TickContext<'_>) -> Result<(Vec<HouseId>, Vec<HouseId>), SimulationError> {
    let mut plots: Vec<PlotId> = empty_plots(ctx.space);
    let n_houses = (ctx.space.plot_count() as f64 * ctx.config.density / 100.0).floor() as usize;
    let n_mortgage = (n_houses as f64 * ctx.config.owned_rent_percentage / 100.0).floor() as usize;
    if n_houses > plots.len() {
        return Err(SimulationError::Setup(format!(
            "{} houses but only {} empty plots",
            n_houses,
            plots.len()
        )));
    }

    let lifetime = ctx.config.house_mean_lifetime * ctx.config.ticks_per_year as f64;
    let mut mortgage = Vec::with_capacity(n_mortgage);
    let mut rent = Vec::with_capacity(n_houses - n_mortgage);
    for i in 0..n_houses {
        let tenure = if i < n_mortgage { Tenure::Mortgage } else { Tenure::Rent };
        let end_of_life = ctx
            .rng
            .normal(lifetime, ctx.config.house_lifetime_std_dev)
            .max(0.0) as usize;
        let Some(index) = ctx.rng.choose_index(plots.len()) else {
            break;
        };
        let plot = plots.swap_remove(index);
        let realtors = assign_local_realtors(ctx.state, ctx.space, plot, ctx.config.realtor_territory);

        let id = ctx.state.next_house_id();
        ctx.state
            .insert_house(House::new(id, plot, tenure, end_of_life, realtors));
        ctx.space.place(Entity::House(id), plot)?;
        join_localities(ctx.state, id)?;
        match tenure {
            Tenure::Mortgage => mortgage.push(id),
            Tenure::Rent => rent.push(id),
        }
    }
    debug!("built {} sale and {} let houses", mortgage.len(), rent.len());
    Ok((mortgage, rent))
}

fn draw_household(ctx: &mut TickContext<'_>, tenure: Tenure, capital_percent: f64) -> Household {
    let mean = ctx.config.mean_income;
    let income = ctx.rng.normal(mean, mean / 6.0).max(0.0);
    let propensity = ctx.rng.uniform(0.0, 1.0);
    let id = ctx.state.next_household_id();
    let mut hh = Household::new(id, tenure, income, income * capital_percent / 100.0, propensity);
    hh.income_surplus = income / ctx.config.ticks_per_year as f64;
    hh
}

fn take_random(ctx: &mut TickContext<'_>, stock: &mut Vec<HouseId>) -> Result<HouseId, SimulationError> {
    let index = ctx
        .rng
        .choose_index(stock.len())
        .ok_or_else(|| SimulationError::Setup("ran out of vacant houses".to_string()))?;
    Ok(stock.swap_remove(index))
}

fn seed_owner_occupiers(
    ctx: &mut TickContext<'_>,
    stock: &mut Vec<HouseId>,
    n: usize,
) -> Result<Vec<HouseholdId>, SimulationError> {
    let periods = ctx.config.mortgage_periods();
    let ltv = ctx.config.ltv();
    let capital_percent = ctx.config.capital_mortgage;
    let mut owners = Vec::with_capacity(n);

    for _ in 0..n {
        let house = take_random(ctx, stock)?;
        let mut hh = draw_household(ctx, Tenure::Mortgage, capital_percent);
        let serviceable = ctx
            .config
            .serviceable_mortgage(ctx.config.affordable_payment(hh.income), ctx.annual_rate());
        let mortgage = if ltv < 1.0 {
            serviceable.min(hh.capital * ltv / (1.0 - ltv))
        } else {
            serviceable
        };
        let rate_term = ctx.config.draw_rate_term(ctx.rng, false);
        hh.portfolio
            .push(Holding::financed(house, mortgage, ctx.rate, periods, rate_term));
        hh.residence = Some(house);
        let id = hh.id;
        ctx.state.insert_household(hh);

        let h = ctx.state.house_mut(house)?;
        h.owner = Some(id);
        h.occupier = Some(id);
        h.sale_price = mortgage;
        record_price(ctx.state, house, RecordKind::Sale, ctx.tick)?;
        ctx.move_household(id, house)?;
        owners.push(id);
    }
    Ok(owners)
}

/// Let houses to new tenants; returns the agreed rents
fn seed_tenants(
    ctx: &mut TickContext<'_>,
    stock: &mut Vec<HouseId>,
    landlords: &[HouseholdId],
    n: usize,
) -> Result<Vec<f64>, SimulationError> {
    let periods = ctx.config.mortgage_periods();
    let capital_percent = ctx.config.capital_rent;
    let mut rents = Vec::with_capacity(n);

    for _ in 0..n {
        let house = take_random(ctx, stock)?;
        let mut hh = draw_household(ctx, Tenure::Rent, capital_percent);
        let rent = ctx.config.affordable_payment(hh.income);
        hh.rent = rent;
        hh.residence = Some(house);
        let id = hh.id;
        ctx.state.insert_household(hh);

        let landlord = landlords[ctx.rng.choose_index(landlords.len()).unwrap_or(0)];
        let price = ctx.config.serviceable_mortgage(rent, ctx.annual_rate());
        let rate_term = ctx.config.draw_rate_term(ctx.rng, true);
        let mut holding = Holding::financed(house, price, ctx.rate, periods, rate_term);
        holding.rent_income = rent;
        ctx.state.household_mut(landlord)?.portfolio.push(holding);

        let h = ctx.state.house_mut(house)?;
        h.owner = Some(landlord);
        h.occupier = Some(id);
        h.sale_price = price;
        h.rent_price = rent;
        record_price(ctx.state, house, RecordKind::Rent, ctx.tick)?;
        ctx.move_household(id, house)?;
        rents.push(rent);
    }
    Ok(rents)
}

/// Hand an empty let house to a random landlord and list it
fn let_vacant(
    ctx: &mut TickContext<'_>,
    house: HouseId,
    landlords: &[HouseholdId],
    rent: f64,
) -> Result<(), SimulationError> {
    let landlord = landlords[ctx.rng.choose_index(landlords.len()).unwrap_or(0)];
    let rate_term = ctx.config.draw_rate_term(ctx.rng, true);

    let l = ctx.state.household(landlord)?;
    let residence = l.residence.ok_or(SimulationError::NoResidence(landlord))?;
    let mut holding = l
        .holding(residence)
        .cloned()
        .ok_or(SimulationError::NotInPortfolio { household: landlord, house: residence })?;
    holding.house = house;
    holding.rent_income = 0.0;
    holding.rate_term = Some(rate_term);
    let price = ctx.state.house(residence)?.sale_price;
    ctx.state.household_mut(landlord)?.portfolio.push(holding);

    let h = ctx.state.house_mut(house)?;
    h.owner = Some(landlord);
    h.sale_price = price;
    h.rent_price = rent;
    ctx.list_house(house)?;
    Ok(())
}

/// Clear the debts of a share of owner-occupiers
fn pay_off_sample(ctx: &mut TickContext<'_>, owners: &[HouseholdId]) -> usize {
    let k = (owners.len() as f64 * ctx.config.fully_paid_mortgage_owners / 100.0).floor() as usize;
    let picks = ctx.rng.sample_indices(owners.len(), k);
    for index in &picks {
        if let Some(hh) = ctx.state.get_household_mut(owners[*index]) {
            for holding in &mut hh.portfolio {
                holding.pay_off();
            }
        }
    }
    picks.len()
}
