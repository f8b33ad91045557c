//! Seeded demo scenarios: a random problem and a naive round-robin plan.

use fleetsim_common::{DeterministicRng, Vec2};
use fleetsim_kernel::{
    DepotCandidateStop, DepotNodeId, FeatureFlags, KernelError, NodeSpec, ProblemDescription,
    SimConfig, StopId, TargetRef, World, build_world, truck_speed,
};

const DEPOT_NODE: u32 = 1;
const AREA: f32 = 50.0;

#[derive(Debug, Clone, Copy)]
pub struct DemoParams {
    pub customers: u32,
    pub trucks: u32,
    pub electric: bool,
    pub moving_depot: bool,
}

pub fn generate_problem(params: DemoParams, rng: &mut DeterministicRng) -> ProblemDescription {
    let mut nodes = vec![NodeSpec::new(DEPOT_NODE, Vec2::ZERO)];
    for i in 0..params.customers {
        let release_time = if rng.next_bool(0.3) {
            rng.next_range(1.0, 30.0)
        } else {
            0.0
        };
        nodes.push(
            NodeSpec::new(DEPOT_NODE + 1 + i, random_pos(rng))
                .with_demand(rng.next_int(1, 6) as u32)
                .with_release_time(release_time)
                .with_service_time(rng.next_range(0.5, 2.0)),
        );
    }

    let mut station_node_ids = Vec::new();
    if params.electric {
        let first_station = DEPOT_NODE + 1 + params.customers;
        for id in first_station..first_station + 2 {
            nodes.push(NodeSpec::new(id, random_pos(rng)));
            station_node_ids.push(id);
        }
    }

    let depot_candidate_stops = if params.moving_depot {
        vec![
            DepotCandidateStop::new(StopId(1), Vec2::ZERO),
            DepotCandidateStop::new(StopId(2), random_pos(rng)),
        ]
    } else {
        Vec::new()
    };

    let mut problem = ProblemDescription {
        name: format!("demo-{}", rng.seed()),
        capacity: (params.customers * 5 / params.trucks.max(1)).max(10),
        truck_speed: 5.0,
        depot_speed: if params.moving_depot { 2.0 } else { 0.0 },
        energy_capacity: params.electric.then_some(400.0),
        energy_consumption: params.electric.then_some(1.0),
        nodes,
        depot_node_ids: vec![DEPOT_NODE],
        depot_candidate_stops,
        station_node_ids,
        features: FeatureFlags::empty(),
    };
    problem.features = FeatureFlags::detect(&problem);
    problem
}

fn random_pos(rng: &mut DeterministicRng) -> Vec2 {
    Vec2::new(rng.next_range(-AREA, AREA), rng.next_range(-AREA, AREA))
}

/// Build the world, park the fleet at the depot and hand customers out
/// round-robin in id order. Every plan ends back at the depot.
pub fn build_demo_world(
    problem: &ProblemDescription,
    config: &SimConfig,
    trucks: u32,
) -> Result<World, KernelError> {
    let mut world = build_world(problem, config)?;
    world.create_demo_fleet(trucks, truck_speed(problem, config), config.locked_prefix_count);

    let customer_ids: Vec<_> = world.customers().iter().map(|c| c.id).collect();
    let fleet = world.trucks_mut();
    if fleet.is_empty() {
        return Ok(world);
    }
    let fleet_size = fleet.len();
    for (i, id) in customer_ids.into_iter().enumerate() {
        fleet[i % fleet_size].append_to_plan(TargetRef::Customer(id));
    }
    for truck in fleet.iter_mut() {
        truck.append_to_plan(TargetRef::Depot(DepotNodeId(DEPOT_NODE)));
    }

    if world.features().contains(FeatureFlags::MOVING_DEPOT) {
        world.command_depot(StopId(2))?;
    }
    Ok(world)
}
