//! Derived-write propagators.
//!
//! A propagator performs additional derived writes as a side effect of a
//! primary entity mutation. Both run against the caller's live connection so
//! they join the caller's transaction: if the propagated state is invalid,
//! the original mutation rolls back with it.

mod occupancy;
mod stock;

pub use occupancy::*;
pub use stock::*;
