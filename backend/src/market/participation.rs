//! Market Participation Classifier
//!
//! Once per tick every housed household that is not already on a market is
//! tested against the poor and rich predicates. Classification is a pure
//! read of the registry; [`apply`] then acts on the cohorts in a fixed
//! order: evictions, forced sales, then admission of the rich.

use crate::core::stats::mean;
use crate::finance::repayment_for;
use crate::models::house::Tenure;
use crate::models::household::{Household, MarketKind};
use crate::models::ids::HouseholdId;
use crate::models::state::SimulationState;
use crate::orchestrator::config::ModelConfig;
use crate::orchestrator::context::TickContext;
use crate::orchestrator::SimulationError;
use crate::settlement::eviction::{evict, force_sell};
use log::debug;
use std::collections::BTreeSet;

/// Households sorted into the classifier's cohorts, each in id order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cohorts {
    /// Owner-occupiers whose repayments outrun their income
    pub poor_mortgage: Vec<HouseholdId>,
    /// Poor owner-occupiers with a single house: evicted
    pub poor_mortgage_evict: Vec<HouseholdId>,
    /// Poor owner-occupiers with several houses, none listed: forced to sell one
    pub poor_mortgage_stay: Vec<HouseholdId>,
    /// Tenants whose rent outruns their income: evicted
    pub poor_rent: Vec<HouseholdId>,
    /// Owner-occupiers able to fund another purchase
    pub rich_mortgage: Vec<HouseholdId>,
    /// Tenants able to buy or to rent something better
    pub rich_rent: Vec<HouseholdId>,
}

/// What [`apply`] did with the cohorts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticipationOutcome {
    pub evicted: usize,
    pub forced_sales: usize,
    pub entered_mortgage: usize,
    pub entered_buy_to_let: usize,
    pub entered_rent: usize,
}

fn is_poor_mortgage(hh: &Household, config: &ModelConfig) -> bool {
    let tpy = config.ticks_per_year as f64;
    let annual_repayment = hh.total_repayment() * tpy;
    let annual_income = hh.income + hh.total_rent_income() * tpy;
    annual_repayment > config.eviction_threshold_mortgage * annual_income * config.affordability_share()
}

fn is_poor_rent(hh: &Household, config: &ModelConfig) -> bool {
    let tpy = config.ticks_per_year as f64;
    hh.rent * tpy > config.eviction_threshold_rent * hh.income * config.affordability_share()
}

fn is_rich_mortgage(hh: &Household, config: &ModelConfig) -> bool {
    let (Some(balance), Some(repayment)) = (hh.median_balance(), hh.median_repayment()) else {
        return false;
    };
    let tpy = config.ticks_per_year as f64;
    let spare_capital = hh.capital > balance * (1.0 - config.ltv());
    let net_income = hh.income + hh.total_rent_income() * tpy - hh.total_repayment() * tpy;
    let spare_income = net_income * config.affordability_share() > repayment * tpy;
    spare_capital && spare_income
}

fn is_rich_rent(hh: &Household, state: &SimulationState, config: &ModelConfig, rate: f64) -> bool {
    let Some(price) = hh
        .residence
        .and_then(|id| state.get_house(id))
        .map(|h| h.sale_price)
    else {
        return false;
    };
    let deposit = price * (1.0 - config.ltv());
    let spare_capital = hh.capital > config.savings_to_price_threshold * deposit;
    // annual budget against the per-tick repayment of the current home
    let repayment = repayment_for(price * config.ltv(), rate, config.mortgage_periods());
    let spare_income = hh.income * config.affordability_share() > repayment;
    spare_capital && spare_income
}

/// Sort housed, inactive households into cohorts
///
/// Rich cohorts are made disjoint from the poor ones by subtraction, so a
/// contradictory configuration never both evicts and promotes a household.
pub fn classify(state: &SimulationState, config: &ModelConfig, rate: f64) -> Cohorts {
    let mut cohorts = Cohorts::default();

    for hh in state
        .households()
        .filter(|h| h.is_housed() && !h.is_on_market())
    {
        match hh.tenure {
            Tenure::Mortgage => {
                if is_poor_mortgage(hh, config) {
                    cohorts.poor_mortgage.push(hh.id);
                    if hh.portfolio.len() <= 1 {
                        cohorts.poor_mortgage_evict.push(hh.id);
                    } else {
                        let any_listed = hh
                            .portfolio
                            .iter()
                            .filter_map(|holding| state.get_house(holding.house))
                            .any(|house| house.is_listed());
                        if !any_listed {
                            cohorts.poor_mortgage_stay.push(hh.id);
                        }
                    }
                }
                if is_rich_mortgage(hh, config) {
                    cohorts.rich_mortgage.push(hh.id);
                }
            }
            Tenure::Rent => {
                if is_poor_rent(hh, config) {
                    cohorts.poor_rent.push(hh.id);
                }
                if is_rich_rent(hh, state, config, rate) {
                    cohorts.rich_rent.push(hh.id);
                }
            }
        }
    }

    let poor_mortgage: BTreeSet<_> = cohorts.poor_mortgage.iter().copied().collect();
    let poor_rent: BTreeSet<_> = cohorts.poor_rent.iter().copied().collect();
    cohorts.rich_mortgage.retain(|id| !poor_mortgage.contains(id));
    cohorts.rich_rent.retain(|id| !poor_rent.contains(id));

    cohorts
}

/// Act on classified cohorts
///
/// Poor single-house owners and poor tenants are evicted into the rent
/// market first, then poor multi-house owners list one house, then the
/// rich draw against their propensity to enter a market. Households
/// displaced earlier in the pass are skipped by later steps.
pub fn apply(ctx: &mut TickContext<'_>, cohorts: &Cohorts) -> Result<ParticipationOutcome, SimulationError> {
    let mut outcome = ParticipationOutcome::default();

    let evict_incomes = |ids: &[HouseholdId], state: &SimulationState| -> Vec<f64> {
        ids.iter()
            .filter_map(|id| state.get_household(*id))
            .map(|h| h.income)
            .collect()
    };
    let mortgage_incomes = evict_incomes(&cohorts.poor_mortgage_evict, &*ctx.state);
    let rent_incomes = evict_incomes(&cohorts.poor_rent, &*ctx.state);

    for id in cohorts
        .poor_mortgage_evict
        .iter()
        .chain(cohorts.poor_rent.iter())
    {
        // a landlord's eviction may already have displaced this tenant
        if ctx.state.household(*id)?.is_housed() {
            evict(ctx, *id)?;
            outcome.evicted += 1;
        }
        ctx.enter_market(*id, MarketKind::Rent)?;
        outcome.entered_rent += 1;
    }

    for id in &cohorts.poor_mortgage_stay {
        let hh = ctx.state.household(*id)?;
        if hh.is_housed() && hh.portfolio.len() > 1 && force_sell(ctx, *id)?.is_some() {
            outcome.forced_sales += 1;
        }
    }

    let investor_cut = 1.0 - ctx.config.investors / 100.0;
    for id in &cohorts.rich_mortgage {
        let hh = ctx.state.household(*id)?;
        if !hh.is_housed() || hh.is_on_market() {
            continue;
        }
        if hh.propensity >= investor_cut {
            ctx.enter_market(*id, MarketKind::BuyToLet)?;
            outcome.entered_buy_to_let += 1;
        }
    }

    let upgrade_cut = 1.0 - ctx.config.upgrade_tenancy / 100.0;
    for id in &cohorts.rich_rent {
        let hh = ctx.state.household(*id)?;
        if !hh.is_housed() || hh.is_on_market() {
            continue;
        }
        if hh.propensity >= upgrade_cut {
            ctx.enter_market(*id, MarketKind::Rent)?;
            outcome.entered_rent += 1;
        } else {
            ctx.enter_market(*id, MarketKind::Mortgage)?;
            outcome.entered_mortgage += 1;
        }
    }

    let m = &mut *ctx.monitors;
    m.n_poor_mortgage = cohorts.poor_mortgage.len();
    m.n_evicted_mortgage = cohorts.poor_mortgage_evict.len();
    m.n_evicted_rent = cohorts.poor_rent.len();
    m.n_homeless = cohorts.poor_mortgage_evict.len() + cohorts.poor_rent.len();
    m.n_force_sell = outcome.forced_sales;
    m.n_enter_market_rent = outcome.entered_rent;
    m.n_enter_market_mortgage = outcome.entered_mortgage;
    m.n_enter_market_btl = outcome.entered_buy_to_let;
    m.mean_income_evicted_mortgage = mean(&mortgage_incomes).unwrap_or(0.0);
    m.mean_income_evicted_rent = mean(&rent_incomes).unwrap_or(0.0);

    debug!(
        "tick {}: {} evicted, {} forced sales, {} entered (m/btl/r {}/{}/{})",
        ctx.tick,
        outcome.evicted,
        outcome.forced_sales,
        outcome.entered_mortgage + outcome.entered_buy_to_let + outcome.entered_rent,
        outcome.entered_mortgage,
        outcome.entered_buy_to_let,
        outcome.entered_rent
    );

    Ok(outcome)
}
