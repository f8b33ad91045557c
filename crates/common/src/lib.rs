//! Shared primitives for the fleetsim workspace.
//!
//! # Invariants
//! - Nothing in this crate depends on simulation state.
//! - Geometry and RNG are deterministic for a given input/seed.

pub mod geometry;
pub mod logging;
pub mod rng;

pub use geometry::{Vec2, distance, move_toward};
pub use logging::{LogBuffer, init_logging};
pub use rng::DeterministicRng;
