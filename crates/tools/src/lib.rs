//! Developer tooling: read-only fleet inspection and run statistics.
//!
//! # Invariants
//! - Tools never mutate the world or the event log.

pub mod inspector;

pub use inspector::{FleetInspector, FleetSummary, TruckInfo};
