//! Deterministic random number generation
//!
//! A single seeded xorshift64* stream drives incomes, lifetimes, plot
//! choice, offer sampling and fixed-rate terms. Nothing else in the crate
//! may draw random numbers.

mod xorshift;

pub use xorshift::RngManager;
