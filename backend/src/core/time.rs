//! Time management for the simulation
//!
//! The simulation operates in discrete ticks. A fixed number of ticks forms
//! a year; yearly model inputs (durations, incomes, rates) are converted to
//! ticks through this module.

use serde::{Deserialize, Serialize};

/// Manages simulation time in discrete ticks and years
///
/// Tick 0 is the setup phase. The first call to [`TimeManager::advance_tick`]
/// moves the clock to tick 1, which is the first simulated period.
///
/// # Example
/// ```
/// use housing_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(4); // quarterly ticks
/// assert_eq!(time.current_tick(), 0);
/// assert_eq!(time.current_year(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    /// Total ticks elapsed since setup
    current_tick: usize,
    /// Number of ticks in one year
    ticks_per_year: usize,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::TimeManager;
    ///
    /// let time = TimeManager::new(4);
    /// assert_eq!(time.ticks_per_year(), 4);
    /// ```
    pub fn new(ticks_per_year: usize) -> Self {
        assert!(ticks_per_year > 0, "ticks_per_year must be positive");
        Self {
            current_tick: 0,
            ticks_per_year,
        }
    }

    /// Restore a clock at an arbitrary tick (checkpoint restore)
    pub fn at_tick(ticks_per_year: usize, current_tick: usize) -> Self {
        let mut time = Self::new(ticks_per_year);
        time.current_tick = current_tick;
        time
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick (total ticks since setup)
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Get the current year (0-indexed)
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::TimeManager;
    ///
    /// let mut time = TimeManager::new(4);
    /// for _ in 0..9 {
    ///     time.advance_tick();
    /// }
    /// assert_eq!(time.current_year(), 2);
    /// ```
    pub fn current_year(&self) -> usize {
        self.current_tick / self.ticks_per_year
    }

    /// Get the tick within the current year (0-indexed)
    pub fn tick_within_year(&self) -> usize {
        self.current_tick % self.ticks_per_year
    }

    /// Check if current tick is the last tick of the year
    pub fn is_end_of_year(&self) -> bool {
        self.tick_within_year() == self.ticks_per_year - 1
    }

    /// Get ticks per year
    pub fn ticks_per_year(&self) -> usize {
        self.ticks_per_year
    }

    /// Convert a duration in years to ticks
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::TimeManager;
    ///
    /// let time = TimeManager::new(4);
    /// assert_eq!(time.years_to_ticks(25), 100);
    /// ```
    pub fn years_to_ticks(&self, years: usize) -> usize {
        years * self.ticks_per_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "ticks_per_year must be positive")]
    fn test_zero_ticks_per_year_panics() {
        TimeManager::new(0);
    }

    #[test]
    fn test_at_tick_restores_position() {
        let time = TimeManager::at_tick(4, 10);
        assert_eq!(time.current_tick(), 10);
        assert_eq!(time.current_year(), 2);
        assert_eq!(time.tick_within_year(), 2);
    }
}
