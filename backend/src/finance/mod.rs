//! Financial model
//!
//! Amortization, repayment and loan-to-value arithmetic. The per-house
//! financial record that applies this arithmetic over time lives in
//! [`crate::models::holding`].

pub mod amortization;

pub use amortization::{
    annuity_value, ltv_price_cap, max_mortgage, outstanding_after, per_tick_rate, repayment_for,
};
