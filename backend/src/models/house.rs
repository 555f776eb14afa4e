//! House model
//!
//! A unit of housing stock. A house is either mortgage-type (owner-occupied
//! stock, sold on the sale market) or rent-type (let by a landlord on the
//! rent market). Its tenure decides which price is authoritative and which
//! market it is listed on.
//!
//! # Critical Invariants
//!
//! 1. A house is for sale XOR for rent XOR unlisted (encoded by [`Listing`])
//! 2. A house with a pending offerer is listed
//! 3. Owner ≠ occupier only for rent-type houses

use crate::models::ids::{HouseId, HouseholdId, PlotId, RealtorId};
use serde::{Deserialize, Serialize};

/// Tenure kind of a house, or of a household's primary residence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenure {
    /// Owner-occupied stock, traded on the sale market
    Mortgage,
    /// Let stock, traded on the rent market
    Rent,
}

/// Market state of a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Listing {
    Unlisted,
    /// Listed on the sale market since the given tick
    ForSale { since: usize },
    /// Listed on the rent market since the given tick
    ForRent { since: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,

    /// Where the house stands in the spatial collaborator
    pub plot: PlotId,

    pub tenure: Tenure,

    pub listing: Listing,

    /// Asking price when for sale, last transacted price otherwise
    pub sale_price: f64,

    /// Asking rent per tick when for rent, last agreed rent otherwise
    pub rent_price: f64,

    /// Tick after which the house is demolished
    pub end_of_life: usize,

    /// Asking value relative to the local realtors' means, set when priced
    pub quality: f64,

    pub owner: Option<HouseholdId>,

    /// Household living here (the owner, or a tenant for rent-type stock)
    pub occupier: Option<HouseholdId>,

    /// Household holding the single pending offer on this house this tick
    pub offered_to: Option<HouseholdId>,

    /// Realtors whose territory covers this house, fixed at creation
    pub local_realtors: Vec<RealtorId>,
}

impl House {
    /// Create an unlisted, unowned, unpriced house
    pub fn new(
        id: HouseId,
        plot: PlotId,
        tenure: Tenure,
        end_of_life: usize,
        local_realtors: Vec<RealtorId>,
    ) -> Self {
        Self {
            id,
            plot,
            tenure,
            listing: Listing::Unlisted,
            sale_price: 0.0,
            rent_price: 0.0,
            end_of_life,
            quality: 0.0,
            owner: None,
            occupier: None,
            offered_to: None,
            local_realtors,
        }
    }

    pub fn is_for_sale(&self) -> bool {
        matches!(self.listing, Listing::ForSale { .. })
    }

    pub fn is_for_rent(&self) -> bool {
        matches!(self.listing, Listing::ForRent { .. })
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self.listing, Listing::Unlisted)
    }

    /// Tick at which the current listing started
    pub fn listed_since(&self) -> Option<usize> {
        match self.listing {
            Listing::Unlisted => None,
            Listing::ForSale { since } | Listing::ForRent { since } => Some(since),
        }
    }

    /// Put the house on the market that matches its tenure
    ///
    /// Any pending offer is withdrawn; the withdrawn offerer is returned so
    /// the caller can clear the reciprocal reference.
    pub fn list(&mut self, tick: usize) -> Option<HouseholdId> {
        self.listing = match self.tenure {
            Tenure::Mortgage => Listing::ForSale { since: tick },
            Tenure::Rent => Listing::ForRent { since: tick },
        };
        self.offered_to.take()
    }

    /// Take the house off the market, withdrawing any pending offer
    pub fn unlist(&mut self) -> Option<HouseholdId> {
        self.listing = Listing::Unlisted;
        self.offered_to.take()
    }

    /// The price that tenure makes authoritative (sale price or rent)
    pub fn asking_price(&self) -> f64 {
        match self.tenure {
            Tenure::Mortgage => self.sale_price,
            Tenure::Rent => self.rent_price,
        }
    }
}
