//! Valuation Engine
//!
//! Realtors price houses from what they have seen trade nearby:
//!
//! - A new listing is valued by each of the house's local realtors as the
//!   **median** of that realtor's records of the matching kind within the
//!   configured locality of the house, falling back to the realtor's
//!   territory-wide mean. The **maximum** across realtors becomes the ask.
//! - Listed stock decays every tick by the configured drop rates.
//! - Stock past its end of life, or listed below a floor derived from this
//!   tick's median asking price, is flagged for demolition.

use crate::core::stats::{mean, median};
use crate::models::event::DemolitionReason;
use crate::models::house::{House, Tenure};
use crate::models::ids::{HouseId, PlotId, RealtorId};
use crate::models::realtor::{PriceRecord, RecordKind};
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;
use crate::spatial::SpatialIndex;
use log::debug;

// ============================================================================
// Realtor bookkeeping
// ============================================================================

/// Local realtors for a house on `plot`
///
/// Every realtor within `territory` of the plot; the nearest realtor when
/// none is that close. Ties go to the lowest id.
pub fn assign_local_realtors(
    state: &SimulationState,
    space: &dyn SpatialIndex,
    plot: PlotId,
    territory: f64,
) -> Vec<RealtorId> {
    let mut nearest: Option<(RealtorId, f64)> = None;
    let mut local = Vec::new();
    for realtor in state.realtors() {
        let d = space.distance(plot, realtor.plot);
        if d <= territory {
            local.push(realtor.id);
        }
        if nearest.map_or(true, |(_, best)| d < best) {
            nearest = Some((realtor.id, d));
        }
    }
    if local.is_empty() {
        local.extend(nearest.map(|(id, _)| id));
    }
    local
}

/// Add a house to the locality of each of its realtors
pub fn join_localities(state: &mut SimulationState, house: HouseId) -> Result<(), SimulationError> {
    let realtors = state.house(house)?.local_realtors.clone();
    for id in realtors {
        state.realtor_mut(id)?.locality_houses.push(house);
    }
    Ok(())
}

/// Remove a house from every realtor's locality
pub fn leave_localities(state: &mut SimulationState, house: HouseId) {
    for realtor in state.realtors_mut() {
        realtor.locality_houses.retain(|h| *h != house);
    }
}

/// Recompute each realtor's mean price and rent over its locality
///
/// Only positive prices count; a realtor with no priced house keeps its
/// previous means.
pub fn refresh_realtor_means(state: &mut SimulationState) {
    let mut means = Vec::new();
    for realtor in state.realtors() {
        let mut prices = Vec::new();
        let mut rents = Vec::new();
        for house in realtor
            .locality_houses
            .iter()
            .filter_map(|id| state.get_house(*id))
        {
            if house.sale_price > 0.0 {
                prices.push(house.sale_price);
            }
            if house.rent_price > 0.0 {
                rents.push(house.rent_price);
            }
        }
        means.push((realtor.id, mean(&prices), mean(&rents)));
    }
    for (id, price, rent) in means {
        if let Some(realtor) = state.get_realtor_mut(id) {
            if let Some(price) = price {
                realtor.mean_price = price;
            }
            if let Some(rent) = rent {
                realtor.mean_rent = rent;
            }
        }
    }
}

/// Log the current price of `house` with each of its local realtors
///
/// `Sale` records carry only the sale price, `Rent` only the rent, and
/// `Unknown` both.
pub fn record_price(
    state: &mut SimulationState,
    house: HouseId,
    kind: RecordKind,
    tick: usize,
) -> Result<(), SimulationError> {
    let h = state.house(house)?;
    let (sale_price, rent_price) = match kind {
        RecordKind::Sale => (h.sale_price, 0.0),
        RecordKind::Rent => (0.0, h.rent_price),
        RecordKind::Unknown => (h.sale_price, h.rent_price),
    };
    let record = PriceRecord {
        house,
        plot: h.plot,
        tick,
        sale_price,
        rent_price,
        kind,
    };
    for id in h.local_realtors.clone() {
        state.realtor_mut(id)?.records.push(record.clone());
    }
    Ok(())
}

/// Forget every record about `house`; returns whether any existed
pub fn remove_records(state: &mut SimulationState, house: HouseId) -> bool {
    let mut removed = 0;
    for realtor in state.realtors_mut() {
        removed += realtor.forget_house(house);
    }
    removed > 0
}

/// Drop records older than `memory` ticks
pub fn prune_records(state: &mut SimulationState, tick: usize, memory: usize) -> usize {
    let oldest = tick.saturating_sub(memory);
    state
        .realtors_mut()
        .map(|realtor| realtor.prune_before(oldest))
        .sum()
}

// ============================================================================
// Pricing
// ============================================================================

/// Value a house across its local realtors
///
/// A house listed for rent is valued on rent records, anything else on sale
/// records (unlisted stock by its tenure).
pub fn evaluate(
    state: &SimulationState,
    space: &dyn SpatialIndex,
    locality: f64,
    house: HouseId,
) -> Result<f64, SimulationError> {
    let h = state.house(house)?;
    let kind = valuation_kind(h);

    let mut best: Option<f64> = None;
    for id in &h.local_realtors {
        let realtor = state
            .get_realtor(*id)
            .ok_or(SimulationError::RealtorNotFound(*id))?;
        let local: Vec<f64> = realtor
            .records_of(kind)
            .filter(|r| space.distance(h.plot, r.plot) <= locality)
            .map(|r| match kind {
                RecordKind::Rent => r.rent_price,
                _ => r.sale_price,
            })
            .collect();
        let value = median(&local).unwrap_or(match kind {
            RecordKind::Rent => realtor.mean_rent,
            _ => realtor.mean_price,
        });
        best = Some(best.map_or(value, |b: f64| b.max(value)));
    }

    best.ok_or_else(|| SimulationError::Invariant(format!("{} has no local realtor", house)))
}

/// Records a house is valued on: rent records when it is let or listed for
/// rent, sale records otherwise
fn valuation_kind(house: &House) -> RecordKind {
    if house.is_for_rent() || (!house.is_for_sale() && house.tenure == Tenure::Rent) {
        RecordKind::Rent
    } else {
        RecordKind::Sale
    }
}

/// Quality index of a house valued at `value`
///
/// The value relative to the mean of its local realtors' territory means;
/// 1 when no realtor has a positive mean yet.
pub fn quality_index(state: &SimulationState, house: HouseId, value: f64) -> Result<f64, SimulationError> {
    let h = state.house(house)?;
    let kind = valuation_kind(h);
    let means: Vec<f64> = h
        .local_realtors
        .iter()
        .filter_map(|id| state.get_realtor(*id))
        .map(|r| match kind {
            RecordKind::Rent => r.mean_rent,
            _ => r.mean_price,
        })
        .filter(|m| *m > 0.0)
        .collect();
    Ok(mean(&means).map_or(1.0, |baseline| value / baseline))
}

/// Price every house listed at `tick`; returns how many were priced
///
/// Each priced house also gets its quality index.
pub fn price_new_listings(
    state: &mut SimulationState,
    space: &dyn SpatialIndex,
    locality: f64,
    tick: usize,
) -> Result<usize, SimulationError> {
    let fresh: Vec<HouseId> = state
        .houses()
        .filter(|h| h.listed_since() == Some(tick))
        .map(|h| h.id)
        .collect();
    for id in &fresh {
        let value = evaluate(state, space, locality, *id)?;
        let quality = quality_index(state, *id, value)?;
        let house = state.house_mut(*id)?;
        house.quality = quality;
        if house.is_for_rent() {
            house.rent_price = value;
        } else {
            house.sale_price = value;
        }
    }
    debug!("priced {} new listings at tick {}", fresh.len(), tick);
    Ok(fresh.len())
}

/// Median asking prices of listed stock, taken once per tick after pricing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketSnapshot {
    pub median_sale: Option<f64>,
    pub median_rent: Option<f64>,
}

impl MarketSnapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let sale: Vec<f64> = state
            .houses()
            .filter(|h| h.is_for_sale())
            .map(|h| h.sale_price)
            .collect();
        let rent: Vec<f64> = state
            .houses()
            .filter(|h| h.is_for_rent())
            .map(|h| h.rent_price)
            .collect();
        Self {
            median_sale: median(&sale),
            median_rent: median(&rent),
        }
    }
}

// ============================================================================
// Decay and demolition
// ============================================================================

/// Decay the prices of listed stock whose listing matches its tenure
pub fn decay_prices(state: &mut SimulationState, price_drop_rate: f64, rent_drop_rate: f64) -> usize {
    let price_factor = 1.0 - price_drop_rate / 100.0;
    let rent_factor = 1.0 - rent_drop_rate / 100.0;
    let mut decayed = 0;
    for house in state.houses_mut() {
        let matching = (house.is_for_sale() && house.tenure == Tenure::Mortgage)
            || (house.is_for_rent() && house.tenure == Tenure::Rent);
        if matching {
            house.sale_price *= price_factor;
            house.rent_price *= rent_factor;
            decayed += 1;
        }
    }
    decayed
}

/// Houses to demolish this tick, rent-type stock first
pub fn demolition_candidates(
    state: &SimulationState,
    tick: usize,
    market: &MarketSnapshot,
    min_price_percent: f64,
) -> Vec<(HouseId, DemolitionReason)> {
    let floor_sale = market.median_sale.map(|m| m * min_price_percent / 100.0);
    let floor_rent = market.median_rent.map(|m| m * min_price_percent / 100.0);

    let mut rent = Vec::new();
    let mut mortgage = Vec::new();
    for house in state.houses() {
        let reason = if tick > house.end_of_life {
            Some(DemolitionReason::EndOfLife)
        } else {
            let cheap = match house.tenure {
                Tenure::Mortgage => {
                    house.is_for_sale() && floor_sale.map_or(false, |f| house.sale_price < f)
                }
                Tenure::Rent => {
                    house.is_for_rent() && floor_rent.map_or(false, |f| house.rent_price < f)
                }
            };
            cheap.then_some(DemolitionReason::BelowPriceFloor)
        };
        if let Some(reason) = reason {
            match house.tenure {
                Tenure::Rent => rent.push((house.id, reason)),
                Tenure::Mortgage => mortgage.push((house.id, reason)),
            }
        }
    }
    rent.extend(mortgage);
    rent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::house::House;
    use crate::models::realtor::Realtor;
    use crate::spatial::GridSpace;

    fn setup() -> (SimulationState, GridSpace, HouseId) {
        let grid = GridSpace::new(10, 10);
        let mut state = SimulationState::new();
        for (id, plot) in [(0, 0), (1, 9)] {
            state.insert_realtor(Realtor::new(RealtorId(id), PlotId(plot)));
        }
        let mut house = House::new(
            HouseId(0),
            PlotId(11),
            Tenure::Mortgage,
            400,
            vec![RealtorId(0), RealtorId(1)],
        );
        house.list(1);
        state.insert_house(house);
        (state, grid, HouseId(0))
    }

    fn sale_record(plot: usize, price: f64) -> PriceRecord {
        PriceRecord {
            house: HouseId(99),
            plot: PlotId(plot),
            tick: 0,
            sale_price: price,
            rent_price: 0.0,
            kind: RecordKind::Sale,
        }
    }

    #[test]
    fn test_median_of_local_records() {
        let (mut state, grid, house) = setup();
        let r = state.get_realtor_mut(RealtorId(0)).unwrap();
        r.records.push(sale_record(12, 100.0));
        r.records.push(sale_record(13, 300.0));
        r.records.push(sale_record(21, 200.0));
        // far outside the locality
        r.records.push(sale_record(99, 1_000_000.0));
        let value = evaluate(&state, &grid, 3.0, house).unwrap();
        assert_eq!(value, 200.0);
    }

    #[test]
    fn test_falls_back_to_mean_and_takes_maximum() {
        let (mut state, grid, house) = setup();
        state.get_realtor_mut(RealtorId(0)).unwrap().mean_price = 150.0;
        state.get_realtor_mut(RealtorId(1)).unwrap().mean_price = 180.0;
        assert_eq!(evaluate(&state, &grid, 3.0, house).unwrap(), 180.0);
    }

    #[test]
    fn test_rent_listing_uses_rent_records() {
        let (mut state, grid, house) = setup();
        {
            let h = state.get_house_mut(house).unwrap();
            h.tenure = Tenure::Rent;
            h.list(2);
        }
        let r = state.get_realtor_mut(RealtorId(0)).unwrap();
        r.records.push(sale_record(12, 100_000.0));
        r.mean_rent = 450.0;
        assert_eq!(evaluate(&state, &grid, 3.0, house).unwrap(), 450.0);
    }

    #[test]
    fn test_prune_keeps_recent() {
        let (mut state, _, _) = setup();
        let r = state.get_realtor_mut(RealtorId(0)).unwrap();
        for tick in 0..15 {
            r.records.push(PriceRecord {
                tick,
                ..sale_record(1, 1.0)
            });
        }
        assert_eq!(prune_records(&mut state, 14, 10), 4);
    }

    #[test]
    fn test_realtor_means_ignore_zero_prices() {
        let (mut state, _, house) = setup();
        join_localities(&mut state, house).unwrap();
        state.get_house_mut(house).unwrap().sale_price = 500.0;
        refresh_realtor_means(&mut state);
        let r = state.get_realtor(RealtorId(0)).unwrap();
        assert_eq!(r.mean_price, 500.0);
        assert_eq!(r.mean_rent, 0.0);
    }

    #[test]
    fn test_nearest_realtor_when_none_in_territory() {
        let (state, grid, _) = setup();
        let local = assign_local_realtors(&state, &grid, PlotId(8), 0.5);
        assert_eq!(local, vec![RealtorId(1)]);
        let both = assign_local_realtors(&state, &grid, PlotId(4), 20.0);
        assert_eq!(both, vec![RealtorId(0), RealtorId(1)]);
    }

    #[test]
    fn test_demolition_flags() {
        let (mut state, _, house) = setup();
        state.get_house_mut(house).unwrap().sale_price = 10.0;
        let market = MarketSnapshot {
            median_sale: Some(100.0),
            median_rent: None,
        };
        let flagged = demolition_candidates(&state, 5, &market, 20.0);
        assert_eq!(flagged, vec![(house, DemolitionReason::BelowPriceFloor)]);

        let flagged = demolition_candidates(&state, 401, &MarketSnapshot::default(), 20.0);
        assert_eq!(flagged, vec![(house, DemolitionReason::EndOfLife)]);
    }
}
