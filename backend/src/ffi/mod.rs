//! Python bindings
//!
//! Configuration crosses the boundary as JSON so Python callers can build
//! it from any mapping. Per-tick results come back as dicts; monitors and
//! checkpoints come back as JSON.

pub mod model;
