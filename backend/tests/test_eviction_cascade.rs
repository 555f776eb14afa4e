//! Eviction cascade across whole portfolios

use housing_simulator_core_rs::models::{Entity, Holding, House, Household, PlotId};
use housing_simulator_core_rs::orchestrator::TickContext;
use housing_simulator_core_rs::settlement::{evict, remove_household};
use housing_simulator_core_rs::{
    EventLog, GridSpace, HouseId, HouseholdId, MarketKind, ModelConfig, Monitors, RngManager, SimulationError,
    SimulationState, SpatialIndex, Tenure,
};

struct World {
    state: SimulationState,
    space: GridSpace,
    rng: RngManager,
    events: EventLog,
    monitors: Monitors,
    config: ModelConfig,
}

impl World {
    fn new() -> Self {
        Self {
            state: SimulationState::new(),
            space: GridSpace::new(10, 10),
            rng: RngManager::new(8),
            events: EventLog::new(),
            monitors: Monitors::default(),
            config: ModelConfig::default(),
        }
    }

    fn ctx(&mut self) -> TickContext<'_> {
        TickContext {
            state: &mut self.state,
            space: &mut self.space,
            rng: &mut self.rng,
            events: &mut self.events,
            monitors: &mut self.monitors,
            config: &self.config,
            tick: 2,
            rate: 0.0075,
        }
    }

    fn household(&mut self, tenure: Tenure) -> HouseholdId {
        let id = self.state.next_household_id();
        self.state
            .insert_household(Household::new(id, tenure, 30_000.0, 5_000.0, 0.5));
        id
    }

    fn house(&mut self, tenure: Tenure, owner: HouseholdId, occupier: Option<HouseholdId>) -> HouseId {
        let id = self.state.next_house_id();
        let plot = PlotId(id.0 as usize);
        let mut house = House::new(id, plot, tenure, 400, vec![]);
        house.sale_price = 100_000.0;
        house.rent_price = 600.0;
        house.owner = Some(owner);
        house.occupier = occupier;
        self.state.insert_house(house);
        self.space.place(Entity::House(id), plot).unwrap();

        let mut holding = Holding::financed(id, 40_000.0, 0.0075, 100, 8);
        if let Some(occ) = occupier {
            self.space.place(Entity::Household(occ), plot).unwrap();
            let hh = self.state.get_household_mut(occ).unwrap();
            hh.residence = Some(id);
            if occ != owner {
                hh.rent = 600.0;
                holding.rent_income = 600.0;
            }
        }
        self.state.get_household_mut(owner).unwrap().portfolio.push(holding);
        id
    }

    /// A landlord living in its own house and letting `lets` occupied houses
    fn landlord(&mut self, lets: usize) -> (HouseholdId, Vec<HouseId>, Vec<HouseholdId>) {
        let owner = self.household(Tenure::Mortgage);
        let mut houses = vec![self.house(Tenure::Mortgage, owner, Some(owner))];
        let mut tenants = Vec::new();
        for _ in 0..lets {
            let tenant = self.household(Tenure::Rent);
            houses.push(self.house(Tenure::Rent, owner, Some(tenant)));
            tenants.push(tenant);
        }
        (owner, houses, tenants)
    }
}

#[test]
fn test_owner_eviction_relists_every_house() {
    for n in 1..=6 {
        let mut w = World::new();
        let (owner, houses, tenants) = w.landlord(n - 1);

        let relisted = evict(&mut w.ctx(), owner).unwrap();

        assert_eq!(relisted.len(), n, "portfolio of {}", n);
        assert_eq!(relisted, houses);
        for id in &houses {
            let house = w.state.get_house(*id).unwrap();
            assert!(house.is_for_sale(), "{} not relisted", id);
            assert_eq!(house.tenure, Tenure::Mortgage);
            assert!(house.owner.is_none());
            assert!(house.occupier.is_none());
        }

        let hh = w.state.get_household(owner).unwrap();
        assert!(hh.portfolio.is_empty());
        assert!(hh.residence.is_none());
        assert!(w.space.location_of(Entity::Household(owner)).is_none());

        let displaced = tenants
            .iter()
            .filter(|t| {
                let t = w.state.get_household(**t).unwrap();
                !t.is_housed() && t.market == Some(MarketKind::Rent) && t.rent == 0.0
            })
            .count();
        assert_eq!(displaced, n - 1);
        assert_eq!(w.events.events_of_type("Evicted").len(), n);
        w.state.check_invariants().unwrap();
    }
}

#[test]
fn test_tenant_eviction_leaves_landlord_intact() {
    let mut w = World::new();
    let (owner, houses, tenants) = w.landlord(2);

    let relisted = evict(&mut w.ctx(), tenants[0]).unwrap();

    assert_eq!(relisted, vec![houses[1]]);
    let landlord = w.state.get_household(owner).unwrap();
    assert_eq!(landlord.portfolio.len(), 3);
    assert_eq!(landlord.holding(houses[1]).unwrap().rent_income, 0.0);
    assert_eq!(landlord.holding(houses[2]).unwrap().rent_income, 600.0);
    assert!(w.state.get_house(houses[1]).unwrap().is_for_rent());
    assert!(w.state.get_household(tenants[1]).unwrap().is_housed());
    // a plain eviction does not choose a market for the household
    assert_eq!(w.state.get_household(tenants[0]).unwrap().market, None);
    w.state.check_invariants().unwrap();
}

#[test]
fn test_eviction_resets_homeless_counter() {
    let mut w = World::new();
    let (owner, _, _) = w.landlord(0);
    w.state.get_household_mut(owner).unwrap().homeless = 4;

    evict(&mut w.ctx(), owner).unwrap();

    assert_eq!(w.state.get_household(owner).unwrap().homeless, 0);
}

#[test]
fn test_evicting_the_homeless_is_an_error() {
    let mut w = World::new();
    let id = w.household(Tenure::Rent);
    assert_eq!(evict(&mut w.ctx(), id), Err(SimulationError::NoResidence(id)));
}

#[test]
fn test_departing_landlord_displaces_tenants() {
    let mut w = World::new();
    let (owner, houses, tenants) = w.landlord(3);

    remove_household(&mut w.ctx(), owner).unwrap();

    assert!(w.state.get_household(owner).is_none());
    for id in &houses {
        let house = w.state.get_house(*id).unwrap();
        assert!(house.owner.is_none());
        assert!(house.is_for_sale());
    }
    for t in tenants {
        assert_eq!(w.state.get_household(t).unwrap().market, Some(MarketKind::Rent));
    }
    w.state.check_invariants().unwrap();
}

#[test]
fn test_departing_bidder_withdraws_offer() {
    let mut w = World::new();
    let (_, houses, _) = w.landlord(0);
    w.state.get_house_mut(houses[0]).unwrap().list(1);
    let bidder = w.household(Tenure::Rent);
    w.state.get_household_mut(bidder).unwrap().enter_market(MarketKind::Mortgage);
    w.state.place_offer(bidder, houses[0]).unwrap();

    remove_household(&mut w.ctx(), bidder).unwrap();

    assert!(w.state.get_house(houses[0]).unwrap().offered_to.is_none());
    w.state.check_invariants().unwrap();
}
