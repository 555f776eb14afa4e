//! Rectangular grid of plots with Euclidean distance
//!
//! Plot `i` sits at column `i % width`, row `i / width`.

use super::{SpatialError, SpatialIndex};
use crate::models::ids::{Entity, PlotId};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct GridSpace {
    width: usize,
    height: usize,
    occupants: Vec<Vec<Entity>>,
    locations: BTreeMap<Entity, PlotId>,
}

impl GridSpace {
    /// Create an empty grid
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        Self {
            width,
            height,
            occupants: vec![Vec::new(); width * height],
            locations: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Plot at column `x`, row `y`
    pub fn plot_at(&self, x: usize, y: usize) -> Option<PlotId> {
        if x < self.width && y < self.height {
            Some(PlotId(y * self.width + x))
        } else {
            None
        }
    }

    fn coords(&self, plot: PlotId) -> (f64, f64) {
        ((plot.0 % self.width) as f64, (plot.0 / self.width) as f64)
    }

    fn check(&self, plot: PlotId) -> Result<(), SpatialError> {
        if plot.0 < self.occupants.len() {
            Ok(())
        } else {
            Err(SpatialError::PlotOutOfBounds(plot))
        }
    }
}

impl SpatialIndex for GridSpace {
    fn plot_count(&self) -> usize {
        self.occupants.len()
    }

    fn center(&self) -> PlotId {
        PlotId((self.height / 2) * self.width + self.width / 2)
    }

    fn place(&mut self, entity: Entity, plot: PlotId) -> Result<(), SpatialError> {
        self.check(plot)?;
        if let Some(at) = self.locations.get(&entity) {
            return Err(SpatialError::AlreadyPlaced(entity, *at));
        }
        self.occupants[plot.0].push(entity);
        self.locations.insert(entity, plot);
        Ok(())
    }

    fn move_entity(&mut self, entity: Entity, plot: PlotId) -> Result<(), SpatialError> {
        self.check(plot)?;
        if self.locations.contains_key(&entity) {
            self.remove(entity)?;
        }
        self.place(entity, plot)
    }

    fn remove(&mut self, entity: Entity) -> Result<(), SpatialError> {
        let plot = self
            .locations
            .remove(&entity)
            .ok_or(SpatialError::NotPlaced(entity))?;
        self.occupants[plot.0].retain(|e| *e != entity);
        Ok(())
    }

    fn plots_within_radius(&self, center: PlotId, radius: f64, outline_only: bool) -> Vec<PlotId> {
        (0..self.occupants.len())
            .map(PlotId)
            .filter(|plot| {
                let d = self.distance(center, *plot);
                if outline_only {
                    d <= radius && d > radius - 1.0
                } else {
                    d <= radius
                }
            })
            .collect()
    }

    fn distance(&self, a: PlotId, b: PlotId) -> f64 {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    fn entities_at(&self, plot: PlotId) -> Vec<Entity> {
        self.occupants.get(plot.0).cloned().unwrap_or_default()
    }

    fn location_of(&self, entity: Entity) -> Option<PlotId> {
        self.locations.get(&entity).copied()
    }

    fn clear(&mut self) {
        for plot in &mut self.occupants {
            plot.clear();
        }
        self.locations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::{HouseId, HouseholdId};

    #[test]
    fn test_distance_is_euclidean() {
        let grid = GridSpace::new(10, 10);
        let a = grid.plot_at(0, 0).unwrap();
        let b = grid.plot_at(3, 4).unwrap();
        assert_eq!(grid.distance(a, b), 5.0);
    }

    #[test]
    fn test_ring_excludes_interior() {
        let grid = GridSpace::new(9, 9);
        let center = grid.center();
        let disc = grid.plots_within_radius(center, 2.0, false);
        let ring = grid.plots_within_radius(center, 2.0, true);
        assert!(disc.contains(&center));
        assert!(!ring.contains(&center));
        assert!(ring.len() < disc.len());
        assert!(ring.iter().all(|p| grid.distance(center, *p) > 1.0));
    }

    #[test]
    fn test_place_move_remove() {
        let mut grid = GridSpace::new(4, 4);
        let hh = Entity::Household(HouseholdId(1));
        grid.place(hh, PlotId(2)).unwrap();
        assert!(grid.place(hh, PlotId(3)).is_err());

        grid.move_entity(hh, PlotId(5)).unwrap();
        assert!(grid.entities_at(PlotId(2)).is_empty());
        assert_eq!(grid.location_of(hh), Some(PlotId(5)));

        grid.remove(hh).unwrap();
        assert_eq!(grid.remove(hh), Err(SpatialError::NotPlaced(hh)));
    }

    #[test]
    fn test_move_places_unplaced_entity() {
        let mut grid = GridSpace::new(4, 4);
        let house = Entity::House(HouseId(9));
        grid.move_entity(house, PlotId(1)).unwrap();
        assert_eq!(grid.entities_at(PlotId(1)), vec![house]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = GridSpace::new(2, 2);
        let e = Entity::House(HouseId(0));
        assert_eq!(grid.place(e, PlotId(4)), Err(SpatialError::PlotOutOfBounds(PlotId(4))));
    }
}
