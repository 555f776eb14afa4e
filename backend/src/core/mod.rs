//! Core simulation primitives (time, descriptive statistics)

pub mod stats;
pub mod time;

pub use time::TimeManager;
