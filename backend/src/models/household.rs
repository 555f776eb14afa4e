//! Household model
//!
//! An economic actor: earns income, saves capital, rents or owns its
//! residence, and may own further houses as a landlord.
//!
//! # Critical Invariants
//!
//! 1. The portfolio holds at most one [`Holding`] per house, and every
//!    holding's house names this household as owner
//! 2. An owned residence is always in the portfolio
//! 3. A household is either housed (`residence` is set) or homeless; exited
//!    households are removed from the registry entirely

use crate::core::stats::median;
use crate::models::holding::Holding;
use crate::models::house::Tenure;
use crate::models::ids::{HouseId, HouseholdId};
use serde::{Deserialize, Serialize};

/// The market a household is currently bidding on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    /// Buying a home to live in
    Mortgage,
    /// Buying a house to let
    BuyToLet,
    /// Renting a home
    Rent,
}

impl MarketKind {
    /// Whether this market trades sale-listed stock
    pub fn is_purchase(&self) -> bool {
        matches!(self, MarketKind::Mortgage | MarketKind::BuyToLet)
    }

    /// Name used in event logs and monitors
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Mortgage => "mortgage",
            MarketKind::BuyToLet => "buy-to-let",
            MarketKind::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,

    /// Annual income from work
    pub income: f64,

    /// Per-tick income left after housing costs
    pub income_surplus: f64,

    pub capital: f64,

    /// Tenure of the primary residence (or of the market it entered on)
    pub tenure: Tenure,

    /// Consecutive ticks spent without a residence
    pub homeless: u32,

    /// Market currently participated in, if any
    pub market: Option<MarketKind>,

    /// Probability of investing, drawn once at creation
    pub propensity: f64,

    /// Rent paid per tick
    pub rent: f64,

    pub residence: Option<HouseId>,

    /// House this household has a pending offer on
    pub offer: Option<HouseId>,

    pub portfolio: Vec<Holding>,
}

impl Household {
    pub fn new(id: HouseholdId, tenure: Tenure, income: f64, capital: f64, propensity: f64) -> Self {
        Self {
            id,
            income,
            income_surplus: 0.0,
            capital,
            tenure,
            homeless: 0,
            market: None,
            propensity,
            rent: 0.0,
            residence: None,
            offer: None,
            portfolio: Vec::new(),
        }
    }

    pub fn is_housed(&self) -> bool {
        self.residence.is_some()
    }

    pub fn is_on_market(&self) -> bool {
        self.market.is_some()
    }

    pub fn enter_market(&mut self, kind: MarketKind) {
        self.market = Some(kind);
    }

    pub fn leave_market(&mut self) {
        self.market = None;
    }

    pub fn owns(&self, house: HouseId) -> bool {
        self.portfolio.iter().any(|h| h.house == house)
    }

    pub fn holding(&self, house: HouseId) -> Option<&Holding> {
        self.portfolio.iter().find(|h| h.house == house)
    }

    pub fn holding_mut(&mut self, house: HouseId) -> Option<&mut Holding> {
        self.portfolio.iter_mut().find(|h| h.house == house)
    }

    /// Remove and return the holding on `house`
    pub fn take_holding(&mut self, house: HouseId) -> Option<Holding> {
        let index = self.portfolio.iter().position(|h| h.house == house)?;
        Some(self.portfolio.remove(index))
    }

    /// Whether the residence is a house this household owns
    pub fn owns_residence(&self) -> bool {
        self.residence.map_or(false, |house| self.owns(house))
    }

    /// Houses owned, in acquisition order
    pub fn owned_houses(&self) -> Vec<HouseId> {
        self.portfolio.iter().map(|h| h.house).collect()
    }

    pub fn total_repayment(&self) -> f64 {
        self.portfolio.iter().map(|h| h.repayment).sum()
    }

    pub fn total_rent_income(&self) -> f64 {
        self.portfolio.iter().map(|h| h.rent_income).sum()
    }

    pub fn median_balance(&self) -> Option<f64> {
        let balances: Vec<f64> = self.portfolio.iter().map(|h| h.balance).collect();
        median(&balances)
    }

    pub fn median_repayment(&self) -> Option<f64> {
        let repayments: Vec<f64> = self.portfolio.iter().map(|h| h.repayment).collect();
        median(&repayments)
    }

    /// Recompute the per-tick surplus from income, rents and repayments
    pub fn refresh_surplus(&mut self, ticks_per_year: usize) {
        self.income_surplus = self.income / ticks_per_year as f64 + self.total_rent_income()
            - self.total_repayment()
            - self.rent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household() -> Household {
        Household::new(HouseholdId(1), Tenure::Mortgage, 40_000.0, 10_000.0, 0.5)
    }

    #[test]
    fn test_take_holding_by_house() {
        let mut hh = household();
        hh.portfolio.push(Holding::outright(HouseId(1)));
        hh.portfolio.push(Holding::outright(HouseId(2)));
        let taken = hh.take_holding(HouseId(1)).unwrap();
        assert_eq!(taken.house, HouseId(1));
        assert_eq!(hh.owned_houses(), vec![HouseId(2)]);
        assert!(hh.take_holding(HouseId(1)).is_none());
    }

    #[test]
    fn test_refresh_surplus() {
        let mut hh = household();
        let mut holding = Holding::outright(HouseId(1));
        holding.repayment = 1_000.0;
        holding.rent_income = 300.0;
        hh.portfolio.push(holding);
        hh.rent = 0.0;
        hh.refresh_surplus(4);
        assert_eq!(hh.income_surplus, 10_000.0 + 300.0 - 1_000.0);
    }

    #[test]
    fn test_owns_residence() {
        let mut hh = household();
        hh.residence = Some(HouseId(5));
        assert!(!hh.owns_residence());
        hh.portfolio.push(Holding::outright(HouseId(5)));
        assert!(hh.owns_residence());
    }

    #[test]
    fn test_market_kind_purchase() {
        assert!(MarketKind::Mortgage.is_purchase());
        assert!(MarketKind::BuyToLet.is_purchase());
        assert!(!MarketKind::Rent.is_purchase());
    }
}
