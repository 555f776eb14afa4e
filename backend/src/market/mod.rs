//! Market participation and offer matching
//!
//! - **participation**: decides who acts this tick (evictions, forced sales,
//!   market entry)
//! - **matching**: turns active participants into pending offers

pub mod matching;
pub mod participation;

pub use matching::{affordability_upper_bound, make_offers, PriceWindow};
pub use participation::{apply, classify, Cohorts, ParticipationOutcome};
