//! Population dynamics, construction, demolition and the owners' update

use housing_simulator_core_rs::finance::repayment_for;
use housing_simulator_core_rs::models::{Entity, Event, Holding, House, Household, PlotId, Realtor};
use housing_simulator_core_rs::orchestrator::lifecycle::{
    construct_houses, demolish_houses, discourage_homeless, natural_entry, natural_exit, update_owners,
};
use housing_simulator_core_rs::orchestrator::TickContext;
use housing_simulator_core_rs::valuation::MarketSnapshot;
use housing_simulator_core_rs::{
    EventLog, GridSpace, HouseId, HouseholdId, MarketKind, ModelConfig, Monitors, RngManager, SimulationState,
    SpatialIndex, Tenure,
};

struct World {
    state: SimulationState,
    space: GridSpace,
    rng: RngManager,
    events: EventLog,
    monitors: Monitors,
    config: ModelConfig,
    rate: f64,
}

impl World {
    fn new() -> Self {
        Self::with_grid(10, 10)
    }

    fn with_grid(width: usize, height: usize) -> Self {
        Self {
            state: SimulationState::new(),
            space: GridSpace::new(width, height),
            rng: RngManager::new(17),
            events: EventLog::new(),
            monitors: Monitors::default(),
            config: ModelConfig::default(),
            rate: 0.0075,
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
            tick: 5,
            rate: self.rate,
        }
    }

    fn household(&mut self, tenure: Tenure) -> HouseholdId {
        let id = self.state.next_household_id();
        self.state
            .insert_household(Household::new(id, tenure, 30_000.0, 1_000.0, 0.5));
        id
    }

    fn house(&mut self, tenure: Tenure, owner: Option<HouseholdId>, occupier: Option<HouseholdId>) -> HouseId {
        let id = self.state.next_house_id();
        let plot = PlotId(id.0 as usize);
        let mut house = House::new(id, plot, tenure, 400, vec![]);
        house.sale_price = 100_000.0;
        house.rent_price = 500.0;
        house.owner = owner;
        house.occupier = occupier;
        self.state.insert_house(house);
        self.space.place(Entity::House(id), plot).unwrap();
        if let Some(occ) = occupier {
            self.space.place(Entity::Household(occ), plot).unwrap();
            self.state.get_household_mut(occ).unwrap().residence = Some(id);
        }
        if let Some(owner) = owner {
            let mut holding = Holding::financed(id, 50_000.0, 0.0075, 100, 8);
            if occupier.is_some() && occupier != Some(owner) {
                holding.rent_income = 500.0;
            }
            self.state.get_household_mut(owner).unwrap().portfolio.push(holding);
        }
        id
    }

    fn owner_occupier(&mut self) -> (HouseholdId, HouseId) {
        let id = self.household(Tenure::Mortgage);
        let home = self.house(Tenure::Mortgage, Some(id), Some(id));
        (id, home)
    }
}

// ============================================================================
// Population
// ============================================================================

#[test]
fn test_entry_adds_homeless_bidders() {
    let mut w = World::new();
    w.config.entry_rate = 50.0;
    for _ in 0..4 {
        w.household(Tenure::Rent);
    }

    assert_eq!(natural_entry(&mut w.ctx()).unwrap(), 2);

    assert_eq!(w.state.num_households(), 6);
    let newcomers: Vec<_> = w.state.households().filter(|h| h.is_on_market()).collect();
    assert_eq!(newcomers.len(), 2);
    for hh in newcomers {
        assert!(!hh.is_housed());
        assert!(matches!(hh.market, Some(MarketKind::Rent) | Some(MarketKind::Mortgage)));
        assert!(hh.income >= 0.0);
    }
    assert_eq!(w.events.events_of_type("HouseholdEntered").len(), 2);
    assert_eq!(w.monitors.n_entry, 2);
}

#[test]
fn test_exit_samples_only_the_housed() {
    let mut w = World::new();
    w.config.exit_rate = 50.0;
    let homeless = w.household(Tenure::Rent);
    let (a, home_a) = w.owner_occupier();
    let (b, home_b) = w.owner_occupier();

    // floor(3 * 50 %) = 1
    assert_eq!(natural_exit(&mut w.ctx()).unwrap(), 1);

    assert!(w.state.get_household(homeless).is_some());
    let gone: Vec<_> = [(a, home_a), (b, home_b)]
        .into_iter()
        .filter(|(id, _)| w.state.get_household(*id).is_none())
        .collect();
    assert_eq!(gone.len(), 1);
    let house = w.state.get_house(gone[0].1).unwrap();
    assert!(house.owner.is_none());
    assert!(house.is_for_sale());
    assert_eq!(w.events.events_of_type("HouseholdExited").len(), 1);
    w.state.check_invariants().unwrap();
}

#[test]
fn test_long_homeless_are_discouraged() {
    let mut w = World::new();
    let patient = w.household(Tenure::Rent);
    let tired = w.household(Tenure::Rent);
    w.state.get_household_mut(tired).unwrap().homeless = w.config.max_homeless_period;
    w.state.get_household_mut(tired).unwrap().enter_market(MarketKind::Rent);

    assert_eq!(discourage_homeless(&mut w.ctx()).unwrap(), 1);

    assert!(w.state.get_household(tired).is_none());
    assert_eq!(w.state.get_household(patient).unwrap().homeless, 1);
    assert_eq!(w.monitors.n_discouraged_rent, 1);
    assert_eq!(w.monitors.n_discouraged_mortgage, 0);
}

// ============================================================================
// Housing stock
// ============================================================================

#[test]
fn test_construction_lists_new_sale_stock() {
    let mut w = World::new();
    w.config.house_construction_rate = 50.0;
    let realtor = w.state.next_realtor_id();
    w.state.insert_realtor(Realtor::new(realtor, PlotId(99)));
    w.space.place(Entity::Realtor(realtor), PlotId(99)).unwrap();
    w.house(Tenure::Mortgage, None, None);
    w.house(Tenure::Rent, None, None);

    assert_eq!(construct_houses(&mut w.ctx()).unwrap(), 1);

    let built = w.state.get_house(HouseId(2)).unwrap();
    assert_eq!(built.tenure, Tenure::Mortgage);
    assert_eq!(built.listed_since(), Some(5));
    assert!(built.is_for_sale());
    assert_eq!(built.local_realtors, vec![realtor]);
    assert_eq!(w.space.location_of(Entity::House(built.id)), Some(built.plot));
    assert!(built.plot != PlotId(0) && built.plot != PlotId(1));
    assert_eq!(w.monitors.n_constructed, 1);
}

#[test]
fn test_construction_stops_when_space_is_full() {
    let mut w = World::with_grid(2, 1);
    w.config.house_construction_rate = 100.0;
    w.house(Tenure::Mortgage, None, None);
    w.house(Tenure::Mortgage, None, None);

    assert_eq!(construct_houses(&mut w.ctx()).unwrap(), 0);
    assert_eq!(w.state.num_houses(), 2);
}

#[test]
fn test_worn_out_let_is_demolished() {
    let mut w = World::new();
    let (landlord, _) = w.owner_occupier();
    let tenant = w.household(Tenure::Rent);
    let flat = w.house(Tenure::Rent, Some(landlord), Some(tenant));
    w.state.get_house_mut(flat).unwrap().end_of_life = 1;

    assert_eq!(demolish_houses(&mut w.ctx(), &MarketSnapshot::default()).unwrap(), 1);

    assert!(w.state.get_house(flat).is_none());
    assert!(w.space.location_of(Entity::House(flat)).is_none());
    let t = w.state.get_household(tenant).unwrap();
    assert!(!t.is_housed());
    assert_eq!(t.market, Some(MarketKind::Rent));
    let l = w.state.get_household(landlord).unwrap();
    assert_eq!(l.portfolio.len(), 1);
    // 1,000 of savings plus 50,000 of equity
    assert!((l.capital - 51_000.0).abs() < 1e-6);
    assert_eq!(w.monitors.n_demolished, 1);
    w.state.check_invariants().unwrap();
}

#[test]
fn test_demolished_home_sends_owner_to_market() {
    let mut w = World::new();
    let (owner, home) = w.owner_occupier();
    let tenant = w.household(Tenure::Rent);
    let flat = w.house(Tenure::Rent, Some(owner), Some(tenant));
    w.state.get_house_mut(home).unwrap().end_of_life = 0;

    demolish_houses(&mut w.ctx(), &MarketSnapshot::default()).unwrap();

    assert!(w.state.get_house(home).is_none());
    let o = w.state.get_household(owner).unwrap();
    assert!(o.portfolio.is_empty());
    assert_eq!(o.market, Some(MarketKind::Mortgage));
    assert!((o.capital - 51_000.0).abs() < 1e-6);
    // the rest of the portfolio is repossessed
    let f = w.state.get_house(flat).unwrap();
    assert!(f.owner.is_none());
    assert!(f.is_for_sale());
    assert_eq!(w.state.get_household(tenant).unwrap().market, Some(MarketKind::Rent));
    w.state.check_invariants().unwrap();
}

#[test]
fn test_cheap_listing_is_demolished() {
    let mut w = World::new();
    let cheap = w.house(Tenure::Mortgage, None, None);
    let fair = w.house(Tenure::Mortgage, None, None);
    w.state.get_house_mut(cheap).unwrap().sale_price = 10_000.0;
    w.state.get_house_mut(cheap).unwrap().list(3);
    w.state.get_house_mut(fair).unwrap().list(3);
    let market = MarketSnapshot {
        median_sale: Some(100_000.0),
        median_rent: None,
    };

    assert_eq!(demolish_houses(&mut w.ctx(), &market).unwrap(), 1);
    assert!(w.state.get_house(cheap).is_none());
    assert!(w.state.get_house(fair).is_some());
    let demolished = w.events.events_of_type("HouseDemolished");
    assert!(matches!(demolished[0], Event::HouseDemolished { house, .. } if *house == cheap));
}

// ============================================================================
// Finances
// ============================================================================

#[test]
fn test_expired_fixed_rate_resets_to_prevailing() {
    let mut w = World::new();
    w.rate = 0.01;
    let (owner, home) = w.owner_occupier();
    let holding = w.state.get_household_mut(owner).unwrap().holding_mut(home).unwrap();
    holding.rate_term = Some(0);
    let first_repayment = holding.repayment;

    assert_eq!(update_owners(&mut w.ctx()).unwrap(), 1);

    let holding = w.state.get_household(owner).unwrap().holding(home).unwrap();
    assert_eq!(holding.rate, 0.01);
    assert!((holding.balance - (50_000.0 - first_repayment)).abs() < 1e-6);
    assert!((holding.repayment - repayment_for(50_000.0, 0.01, w.config.mortgage_periods())).abs() < 1e-9);
    let term = holding.rate_term.unwrap();
    assert!((7..=19).contains(&term), "term {}", term);
    assert_eq!(holding.mortgage_term, Some(99));
    assert_eq!(w.events.events_of_type("RateReset").len(), 1);
    assert_eq!(w.monitors.n_rate_resets, 1);
}

#[test]
fn test_savings_and_surplus() {
    let mut w = World::new();
    w.config.wage_rise = 1.0;
    let renter = w.household(Tenure::Rent);
    {
        let hh = w.state.get_household_mut(renter).unwrap();
        hh.income_surplus = 1_000.0;
        hh.rent = 500.0;
    }

    update_owners(&mut w.ctx()).unwrap();

    let hh = w.state.get_household(renter).unwrap();
    // 5 % of surplus for households without property
    assert!((hh.capital - 1_050.0).abs() < 1e-9);
    assert!((hh.income_surplus - (7_500.0 - 500.0)).abs() < 1e-9);
    assert!((hh.income - 30_300.0).abs() < 1e-9);
}

#[test]
fn test_capital_never_negative() {
    let mut w = World::new();
    let id = w.household(Tenure::Rent);
    w.state.get_household_mut(id).unwrap().income_surplus = -1_000_000.0;

    update_owners(&mut w.ctx()).unwrap();

    assert_eq!(w.state.get_household(id).unwrap().capital, 0.0);
}
