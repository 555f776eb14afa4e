//! Spatial collaborator
//!
//! The market engine never reasons about geometry itself. It places agents
//! on plots, moves and removes them, and asks for distances and radius
//! queries through [`SpatialIndex`]. [`GridSpace`] is a small rectangular
//! implementation so the crate runs standalone.

mod grid;

pub use grid::GridSpace;

use crate::models::ids::{Entity, PlotId};
use crate::models::state::SimulationState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    #[error("{0} is outside the space")]
    PlotOutOfBounds(PlotId),

    #[error("{0:?} is not placed")]
    NotPlaced(Entity),

    #[error("{0:?} is already placed at {1}")]
    AlreadyPlaced(Entity, PlotId),
}

/// Placement and proximity queries over plots
pub trait SpatialIndex: std::fmt::Debug {
    /// Total number of plots
    fn plot_count(&self) -> usize;

    /// Plot nearest the middle of the space
    fn center(&self) -> PlotId;

    /// Put an entity on a plot; fails if it is already placed
    fn place(&mut self, entity: Entity, plot: PlotId) -> Result<(), SpatialError>;

    /// Move an entity to a plot, placing it if it is not yet placed
    fn move_entity(&mut self, entity: Entity, plot: PlotId) -> Result<(), SpatialError>;

    /// Take an entity off the space
    fn remove(&mut self, entity: Entity) -> Result<(), SpatialError>;

    /// Plots within `radius` of `center`; with `outline_only` just the ring
    /// at that radius
    fn plots_within_radius(&self, center: PlotId, radius: f64, outline_only: bool) -> Vec<PlotId>;

    /// Distance between two plots
    fn distance(&self, a: PlotId, b: PlotId) -> f64;

    /// Entities standing on a plot
    fn entities_at(&self, plot: PlotId) -> Vec<Entity>;

    /// Plot an entity stands on
    fn location_of(&self, entity: Entity) -> Option<PlotId>;

    /// Remove every entity
    fn clear(&mut self);

    /// Distance between two placed entities
    fn distance_between(&self, a: Entity, b: Entity) -> Result<f64, SpatialError> {
        let pa = self.location_of(a).ok_or(SpatialError::NotPlaced(a))?;
        let pb = self.location_of(b).ok_or(SpatialError::NotPlaced(b))?;
        Ok(self.distance(pa, pb))
    }

    /// Remove an entity if it is placed; returns whether it was
    fn remove_if_placed(&mut self, entity: Entity) -> Result<bool, SpatialError> {
        if self.location_of(entity).is_none() {
            return Ok(false);
        }
        self.remove(entity)?;
        Ok(true)
    }
}

/// Place every agent of `state` on an emptied `space`
///
/// Houses and realtors stand on their own plots; housed households stand on
/// the plot of their residence. Homeless households are not placed.
pub fn populate(space: &mut dyn SpatialIndex, state: &SimulationState) -> Result<(), SpatialError> {
    space.clear();
    for realtor in state.realtors() {
        space.place(Entity::Realtor(realtor.id), realtor.plot)?;
    }
    for house in state.houses() {
        space.place(Entity::House(house.id), house.plot)?;
    }
    for household in state.households() {
        if let Some(residence) = household.residence {
            if let Some(house) = state.get_house(residence) {
                space.place(Entity::Household(household.id), house.plot)?;
            }
        }
    }
    Ok(())
}

/// Plots on which no house stands
pub fn vacant_plots(space: &dyn SpatialIndex) -> Vec<PlotId> {
    (0..space.plot_count())
        .map(PlotId)
        .filter(|plot| {
            !space
                .entities_at(*plot)
                .iter()
                .any(|e| matches!(e, Entity::House(_)))
        })
        .collect()
}

/// Plots with nothing on them at all
pub fn empty_plots(space: &dyn SpatialIndex) -> Vec<PlotId> {
    (0..space.plot_count())
        .map(PlotId)
        .filter(|plot| space.entities_at(*plot).is_empty())
        .collect()
}
