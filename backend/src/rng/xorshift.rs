//! xorshift64* random number generator
//!
//! This is a fast, high-quality PRNG that is deterministic and suitable
//! for simulation purposes.
//!
//! # Algorithm
//!
//! xorshift64* is a variant of xorshift that passes TestU01's BigCrush
//! statistical tests. It uses 64-bit state and produces 64-bit output.
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers. Every draw in the housing
//! model (incomes, lifetimes, propensities, plot choice, bounded-rationality
//! sampling, fixed-rate terms) goes through one `RngManager`, so a run is
//! reproducible from its seed.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use housing_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let range_value = rng.range(0, 100); // [0, 100)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Generate random value in range [min, max] (both inclusive)
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// let years = rng.range_inclusive(2, 5);
    /// assert!((2..=5).contains(&years));
    /// ```
    pub fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        self.range(min, max + 1)
    }

    /// Get current RNG state (for checkpointing/replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) by dividing by 2^53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate random f64 in range [min, max)
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Draw from a normal distribution (Box–Muller transform)
    ///
    /// # Example
    /// ```
    /// use housing_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(42);
    /// let income = rng.normal(30_000.0, 5_000.0);
    /// assert!(income.is_finite());
    /// ```
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - u keeps u1 in (0, 1] so ln() stays finite
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick a uniformly random index into a collection of `len` items
    ///
    /// Returns `None` for an empty collection.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.range(0, len as i64) as usize)
    }

    /// Sample `k` distinct indices from `0..len` without replacement
    ///
    /// Uses a partial Fisher–Yates shuffle. When `k >= len` every index is
    /// returned (in shuffled order).
    pub fn sample_indices(&mut self, len: usize, k: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        let take = k.min(len);
        for i in 0..take {
            let j = self.range(i as i64, len as i64) as usize;
            indices.swap(i, j);
        }
        indices.truncate(take);
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = RngManager::new(12345);
        rng.range(100, 50);
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn test_range_inclusive_hits_both_bounds() {
        let mut rng = RngManager::new(2024);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..500 {
            match rng.range_inclusive(1, 3) {
                1 => seen_min = true,
                3 => seen_max = true,
                2 => {}
                other => panic!("value {} outside [1, 3]", other),
            }
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_normal_sample_mean_is_close() {
        let mut rng = RngManager::new(99);
        let n = 20_000;
        let total: f64 = (0..n).map(|_| rng.normal(100.0, 10.0)).sum();
        let mean = total / n as f64;
        assert!((mean - 100.0).abs() < 1.0, "sample mean {} too far from 100", mean);
    }

    #[test]
    fn test_sample_indices_distinct_and_bounded() {
        let mut rng = RngManager::new(5);
        let sample = rng.sample_indices(10, 4);
        assert_eq!(sample.len(), 4);
        let mut sorted = sample.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert!(sample.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_sample_indices_larger_than_len_returns_all() {
        let mut rng = RngManager::new(5);
        let mut sample = rng.sample_indices(3, 10);
        sample.sort_unstable();
        assert_eq!(sample, vec![0, 1, 2]);
    }

    #[test]
    fn test_choose_index_empty() {
        let mut rng = RngManager::new(5);
        assert_eq!(rng.choose_index(0), None);
    }
}
