//! Valuation engine: pricing of new listings, decay and demolition flags

use housing_simulator_core_rs::models::{House, PlotId, PriceRecord, Realtor, RealtorId, RecordKind, Tenure};
use housing_simulator_core_rs::valuation::{
    decay_prices, demolition_candidates, price_new_listings, MarketSnapshot,
};
use housing_simulator_core_rs::{GridSpace, HouseId, SimulationState};
use proptest::prelude::*;

fn listed_house(state: &mut SimulationState, tenure: Tenure, sale: f64, rent: f64, tick: usize) -> HouseId {
    let id = state.next_house_id();
    let mut house = House::new(id, PlotId(id.0 as usize), tenure, 1_000, vec![]);
    house.sale_price = sale;
    house.rent_price = rent;
    house.list(tick);
    state.insert_house(house);
    id
}

proptest! {
    /// Price after k ticks listed equals initial * (1 - d)^k
    #[test]
    fn prop_decay_is_geometric(
        initial in 1_000.0f64..1_000_000.0,
        drop in 0.0f64..20.0,
        ticks in 0usize..60,
    ) {
        let mut state = SimulationState::new();
        let house = listed_house(&mut state, Tenure::Mortgage, initial, 0.0, 0);
        for _ in 0..ticks {
            decay_prices(&mut state, drop, drop);
        }
        let expected = initial * (1.0 - drop / 100.0).powi(ticks as i32);
        let price = state.get_house(house).unwrap().sale_price;
        prop_assert!((price - expected).abs() <= expected * 1e-9 + 1e-9);
    }

    /// Prices never increase through decay
    #[test]
    fn prop_decay_monotone(initial in 1.0f64..10_000.0, drop in 0.0f64..100.0) {
        let mut state = SimulationState::new();
        let house = listed_house(&mut state, Tenure::Rent, 0.0, initial, 0);
        let mut last = initial;
        for _ in 0..10 {
            decay_prices(&mut state, drop, drop);
            let rent = state.get_house(house).unwrap().rent_price;
            prop_assert!(rent <= last);
            last = rent;
        }
    }
}

#[test]
fn test_unlisted_stock_does_not_decay() {
    let mut state = SimulationState::new();
    let listed = listed_house(&mut state, Tenure::Mortgage, 100_000.0, 0.0, 0);
    let unlisted = listed_house(&mut state, Tenure::Mortgage, 100_000.0, 0.0, 0);
    state.get_house_mut(unlisted).unwrap().unlist();

    assert_eq!(decay_prices(&mut state, 3.0, 3.0), 1);
    assert!((state.get_house(listed).unwrap().sale_price - 97_000.0).abs() < 1e-6);
    assert_eq!(state.get_house(unlisted).unwrap().sale_price, 100_000.0);
}

#[test]
fn test_only_fresh_listings_are_priced() {
    let grid = GridSpace::new(10, 10);
    let mut state = SimulationState::new();
    let mut realtor = Realtor::new(RealtorId(0), PlotId(0));
    realtor.records.push(PriceRecord {
        house: HouseId(50),
        plot: PlotId(2),
        tick: 1,
        sale_price: 120_000.0,
        rent_price: 0.0,
        kind: RecordKind::Sale,
    });
    state.insert_realtor(realtor);

    let mut fresh = House::new(HouseId(0), PlotId(1), Tenure::Mortgage, 1_000, vec![RealtorId(0)]);
    fresh.list(3);
    let mut stale = House::new(HouseId(1), PlotId(3), Tenure::Mortgage, 1_000, vec![RealtorId(0)]);
    stale.sale_price = 80_000.0;
    stale.list(2);
    state.insert_house(fresh);
    state.insert_house(stale);

    assert_eq!(price_new_listings(&mut state, &grid, 3.0, 3).unwrap(), 1);
    assert_eq!(state.get_house(HouseId(0)).unwrap().sale_price, 120_000.0);
    assert_eq!(state.get_house(HouseId(1)).unwrap().sale_price, 80_000.0);
    // without realtor means the index is neutral
    assert_eq!(state.get_house(HouseId(0)).unwrap().quality, 1.0);
    assert_eq!(state.get_house(HouseId(1)).unwrap().quality, 0.0);
}

#[test]
fn test_priced_listing_gets_quality_against_territory() {
    let grid = GridSpace::new(10, 10);
    let mut state = SimulationState::new();
    let mut realtor = Realtor::new(RealtorId(0), PlotId(0));
    realtor.mean_price = 100_000.0;
    realtor.mean_rent = 500.0;
    realtor.records.push(PriceRecord {
        house: HouseId(50),
        plot: PlotId(2),
        tick: 1,
        sale_price: 120_000.0,
        rent_price: 0.0,
        kind: RecordKind::Sale,
    });
    state.insert_realtor(realtor);

    let mut sale = House::new(HouseId(0), PlotId(1), Tenure::Mortgage, 1_000, vec![RealtorId(0)]);
    sale.list(3);
    // no rent records nearby, so valued at the territory mean
    let mut flat = House::new(HouseId(1), PlotId(3), Tenure::Rent, 1_000, vec![RealtorId(0)]);
    flat.list(3);
    state.insert_house(sale);
    state.insert_house(flat);

    assert_eq!(price_new_listings(&mut state, &grid, 3.0, 3).unwrap(), 2);
    let sale = state.get_house(HouseId(0)).unwrap();
    assert_eq!(sale.sale_price, 120_000.0);
    assert!((sale.quality - 1.2).abs() < 1e-12);
    let flat = state.get_house(HouseId(1)).unwrap();
    assert_eq!(flat.rent_price, 500.0);
    assert_eq!(flat.quality, 1.0);
}

#[test]
fn test_market_snapshot_medians() {
    let mut state = SimulationState::new();
    for price in [100.0, 300.0, 200.0] {
        listed_house(&mut state, Tenure::Mortgage, price, 0.0, 0);
    }
    let snapshot = MarketSnapshot::capture(&state);
    assert_eq!(snapshot.median_sale, Some(200.0));
    assert_eq!(snapshot.median_rent, None);
}

#[test]
fn test_rent_stock_flagged_before_sale_stock() {
    let mut state = SimulationState::new();
    let sale = listed_house(&mut state, Tenure::Mortgage, 100.0, 0.0, 0);
    let rent = listed_house(&mut state, Tenure::Rent, 0.0, 1.0, 0);
    let market = MarketSnapshot {
        median_sale: Some(10_000.0),
        median_rent: Some(500.0),
    };
    let flagged: Vec<HouseId> = demolition_candidates(&state, 1, &market, 20.0)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(flagged, vec![rent, sale]);
}
