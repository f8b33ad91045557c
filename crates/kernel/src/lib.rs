//! Fleet kernel: authoritative world state, the event log and the
//! deterministic stepping engine.
//!
//! # Invariants
//! - Stepping is a pure function of world, feature flags and the `dt`
//!   sequence.
//! - All state mutations flow through [`Simulation::step`] or explicit
//!   world/truck operations between steps.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod features;
pub mod invariants;
pub mod model;
pub mod world;

pub use builder::{NodeSpec, ProblemDescription, build_world, truck_speed};
pub use config::{EngineOptions, SimConfig, TravelModel};
pub use engine::Simulation;
pub use error::KernelError;
pub use event::{EventKind, EventQueue, SimEvent};
pub use features::FeatureFlags;
pub use invariants::InvariantViolation;
pub use model::{
    Customer, CustomerId, CustomerStatus, DepotCandidateStop, DepotCarrier, DepotNodeId, StationId,
    StopId, TargetRef, Truck, TruckId, TruckState,
};
pub use world::World;
