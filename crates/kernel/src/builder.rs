//! World construction from an already-parsed problem description.
//!
//! Reading instance files is someone else's job; this module only maps a
//! [`ProblemDescription`] plus a [`SimConfig`] onto an initial [`World`].

use std::collections::{BTreeMap, BTreeSet};

use fleetsim_common::Vec2;
use serde::{Deserialize, Serialize};

use crate::KernelError;
use crate::config::SimConfig;
use crate::features::FeatureFlags;
use crate::model::{
    Customer, CustomerId, CustomerStatus, DepotCandidateStop, DepotCarrier, DepotNodeId, StationId,
};
use crate::world::World;

/// Node id used for the depot when the description lists none.
pub const DEFAULT_DEPOT_NODE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: u32,
    pub pos: Vec2,
    #[serde(default)]
    pub demand: u32,
    #[serde(default)]
    pub release_time: f32,
    #[serde(default)]
    pub service_time: f32,
}

impl NodeSpec {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            demand: 0,
            release_time: 0.0,
            service_time: 0.0,
        }
    }

    pub fn with_demand(mut self, demand: u32) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_release_time(mut self, release_time: f32) -> Self {
        self.release_time = release_time;
        self
    }

    pub fn with_service_time(mut self, service_time: f32) -> Self {
        self.service_time = service_time;
        self
    }
}

/// A parsed routing problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemDescription {
    pub name: String,
    pub capacity: u32,
    pub truck_speed: f32,
    /// Zero for a stationary depot.
    pub depot_speed: f32,
    pub energy_capacity: Option<f32>,
    /// Energy per unit distance.
    pub energy_consumption: Option<f32>,
    pub nodes: Vec<NodeSpec>,
    pub depot_node_ids: Vec<u32>,
    pub depot_candidate_stops: Vec<DepotCandidateStop>,
    pub station_node_ids: Vec<u32>,
    /// Detected features; see [`FeatureFlags::detect`].
    pub features: FeatureFlags,
}

impl FeatureFlags {
    /// Derive the feature set from what the description actually contains.
    pub fn detect(problem: &ProblemDescription) -> Self {
        let mut flags = Self::empty();
        if problem.capacity > 0 && problem.nodes.iter().any(|n| n.demand > 0) {
            flags |= Self::CAPACITATED;
        }
        if problem.energy_capacity.is_some()
            || problem.energy_consumption.is_some()
            || !problem.station_node_ids.is_empty()
        {
            flags |= Self::ELECTRIC;
        }
        if problem.nodes.iter().any(|n| n.release_time > 0.0) {
            flags |= Self::DYNAMIC;
        }
        if problem.depot_speed > 0.0 || !problem.depot_candidate_stops.is_empty() {
            flags |= Self::MOVING_DEPOT;
        }
        flags
    }
}

/// Build the initial world. Trucks are not created here; see
/// [`World::create_demo_fleet`].
///
/// Customers are every node that is neither a depot nor a station. A
/// customer whose release time is already due starts out `Waiting`.
pub fn build_world(problem: &ProblemDescription, config: &SimConfig) -> Result<World, KernelError> {
    let mut positions = BTreeMap::new();
    for node in &problem.nodes {
        if positions.insert(node.id, node.pos).is_some() {
            return Err(KernelError::DuplicateNode(node.id));
        }
    }

    let depot_node = problem
        .depot_node_ids
        .first()
        .copied()
        .unwrap_or(DEFAULT_DEPOT_NODE);
    let depot_pos = *positions
        .get(&depot_node)
        .ok_or(KernelError::MissingDepotNode(depot_node))?;

    let features = problem.features;
    let depot_speed = if features.contains(FeatureFlags::MOVING_DEPOT) {
        config.override_depot_speed.unwrap_or(problem.depot_speed)
    } else {
        0.0
    };
    let depot = DepotCarrier::new(depot_pos, depot_speed)
        .with_candidate_stops(problem.depot_candidate_stops.clone());

    let mut world = World::new(problem.capacity, depot).with_features(features);
    world.set_depot_node_id(DepotNodeId(depot_node));
    world.set_energy_defaults(problem.energy_capacity, problem.energy_consumption);

    for &station in &problem.station_node_ids {
        let pos = *positions
            .get(&station)
            .ok_or(KernelError::MissingStationNode(station))?;
        world.add_station(StationId(station), pos);
    }

    let mut excluded: BTreeSet<u32> = problem.station_node_ids.iter().copied().collect();
    if problem.depot_node_ids.is_empty() {
        excluded.insert(DEFAULT_DEPOT_NODE);
    } else {
        excluded.extend(problem.depot_node_ids.iter().copied());
    }

    for node in problem.nodes.iter().filter(|n| !excluded.contains(&n.id)) {
        let status = if node.release_time <= 0.0 {
            CustomerStatus::Waiting
        } else {
            CustomerStatus::Unreleased
        };
        world.add_customer(
            Customer::new(CustomerId(node.id), node.pos, node.demand, node.release_time)
                .with_service_time(node.service_time)
                .with_status(status),
        );
    }

    tracing::info!(
        problem = %problem.name,
        kind = %features,
        customers = world.customers().len(),
        stations = world.stations().len(),
        "world built"
    );
    Ok(world)
}

/// Truck speed for a run: the config override when set, else the problem's.
pub fn truck_speed(problem: &ProblemDescription, config: &SimConfig) -> f32 {
    config.override_truck_speed.unwrap_or(problem.truck_speed)
}
