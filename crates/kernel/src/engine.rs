//! The stepping engine: one call to [`Simulation::step`] advances the clock,
//! releases customers, moves the depot and runs every truck's state machine.
//!
//! # Invariants
//! - `step` is deterministic: same world, flags and `dt` sequence give the
//!   same events and final state.
//! - Exactly one `TruckArrived` per plan leg, however the tick is sliced.
//! - Trucks are processed in list order; the first truck to reach a
//!   waiting customer gets it.

use fleetsim_common::{distance, move_toward};

use crate::config::EngineOptions;
use crate::event::{EventQueue, SimEvent};
use crate::features::FeatureFlags;
use crate::invariants;
use crate::model::{CustomerId, CustomerStatus, DepotCarrier, TargetRef, Truck, TruckState};
use crate::world::World;

/// Owns a world and its event queue and steps them forward.
///
/// Not reentrant: `step` takes `&mut self` and runs to completion.
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    queue: EventQueue,
    options: EngineOptions,
}

/// Values fixed for the duration of one tick.
struct Tick<'q> {
    now: f32,
    dt: f32,
    epsilon: f32,
    electric: bool,
    queue: &'q mut EventQueue,
}

impl Simulation {
    pub fn new(world: World, options: EngineOptions) -> Self {
        Self::resume(world, EventQueue::new(), options)
    }

    /// Continue from a restored world and event log.
    pub fn resume(world: World, queue: EventQueue, options: EngineOptions) -> Self {
        Self {
            world,
            queue,
            options,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for external actors between steps (plan edits,
    /// depot commands).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn time(&self) -> f32 {
        self.world.time
    }

    pub fn into_parts(self) -> (World, EventQueue) {
        (self.world, self.queue)
    }

    /// Advance the simulation by `dt` seconds. Non-positive (or NaN) `dt`
    /// is a no-op.
    ///
    /// # Panics
    /// With diagnostics enabled, panics if the world violates an invariant
    /// after the step.
    pub fn step(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let _span = tracing::info_span!("sim_step", dt).entered();

        self.world.time += dt;
        let features = self.world.features;
        let mut tick = Tick {
            now: self.world.time,
            dt,
            epsilon: self.options.arrive_epsilon,
            electric: features.contains(FeatureFlags::ELECTRIC),
            queue: &mut self.queue,
        };

        release_customers(&mut self.world, &mut tick);

        if features.contains(FeatureFlags::MOVING_DEPOT) {
            move_depot(&mut self.world.depot, &mut tick);
        }

        // Trucks are detached so the rest of the world can be borrowed
        // mutably while each one runs.
        let mut trucks = std::mem::take(&mut self.world.trucks);
        for truck in &mut trucks {
            step_truck(truck, &mut self.world, &mut tick);
        }
        self.world.trucks = trucks;

        if self.options.diagnostics {
            if let Err(violation) = invariants::check(&self.world) {
                panic!(
                    "world invariant violated at t={}: {violation}",
                    self.world.time
                );
            }
        }
    }
}

fn release_customers(world: &mut World, tick: &mut Tick<'_>) {
    for customer in &mut world.customers {
        if customer.status == CustomerStatus::Unreleased && customer.release_time <= tick.now {
            customer.status = CustomerStatus::Waiting;
            tracing::debug!(customer = customer.id.0, time = tick.now, "customer released");
            tick.queue
                .enqueue(SimEvent::customer_released(tick.now, customer.id));
        }
    }
}

fn move_depot(depot: &mut DepotCarrier, tick: &mut Tick<'_>) {
    let Some(target) = depot.target else {
        return;
    };
    depot.pos = move_toward(depot.pos, target.pos, depot.speed * tick.dt);
    if distance(depot.pos, target.pos) <= tick.epsilon {
        depot.pos = target.pos;
        depot.target = None;
        tracing::debug!(stop = target.stop_id.0, time = tick.now, "depot arrived");
        tick.queue
            .enqueue(SimEvent::depot_arrived(tick.now, target.stop_id));
    }
}

fn step_truck(truck: &mut Truck, world: &mut World, tick: &mut Tick<'_>) {
    if truck.state == TruckState::Servicing {
        truck.service_remaining -= tick.dt;
        if truck.service_remaining <= 0.0 {
            complete_service(truck, world, tick);
        }
        return;
    }

    let Some(target) = truck.current_target() else {
        truck.clear_leg();
        truck.state = TruckState::Idle;
        return;
    };
    if truck.active_target != Some(target) {
        truck.active_target = Some(target);
        truck.arrival_signaled = false;
    }

    let Some(target_pos) = world.resolve_target(target) else {
        tracing::trace!(truck = truck.id.0, %target, "plan target unresolved; idling");
        truck.target_pos = None;
        truck.state = TruckState::Idle;
        return;
    };
    truck.target_pos = Some(target_pos);

    // Already parked at the customer: no move needed this tick.
    if let TargetRef::Customer(customer_id) = target {
        if distance(truck.pos, target_pos) <= tick.epsilon {
            signal_arrival(truck, target, tick);
            handle_customer_arrival(truck, customer_id, world, tick);
            return;
        }
    }

    let from = truck.pos;
    truck.pos = move_toward(from, target_pos, truck.speed * tick.dt);
    let moved = distance(from, truck.pos);
    truck.total_distance += moved;

    if moved > 0.0 && tick.electric && truck.energy_consumption > 0.0 {
        let used = moved * truck.energy_consumption;
        let drained = used.min(truck.battery.max(0.0));
        truck.battery = (truck.battery - used).max(0.0);
        truck.total_energy_used += drained;
        tick.queue.enqueue(SimEvent::truck_energy_changed(
            tick.now,
            truck.id,
            truck.battery,
        ));
    }

    if distance(truck.pos, target_pos) > tick.epsilon {
        truck.state = TruckState::Traveling;
        return;
    }

    truck.pos = target_pos;
    signal_arrival(truck, target, tick);
    match target {
        TargetRef::Customer(customer_id) => {
            handle_customer_arrival(truck, customer_id, world, tick);
        }
        TargetRef::Depot(_) | TargetRef::Station(_) => {
            tracing::debug!(truck = truck.id.0, %target, time = tick.now, "leg complete");
            truck.advance_plan();
        }
    }
}

/// Emit `TruckArrived` once per active target.
fn signal_arrival(truck: &mut Truck, target: TargetRef, tick: &mut Tick<'_>) {
    if truck.arrival_signaled {
        return;
    }
    truck.arrival_signaled = true;
    tick.queue
        .enqueue(SimEvent::truck_arrived(tick.now, truck.id, target));
}

fn handle_customer_arrival(
    truck: &mut Truck,
    customer_id: CustomerId,
    world: &mut World,
    tick: &mut Tick<'_>,
) {
    let Some(customer) = world.customer_mut(customer_id) else {
        truck.state = TruckState::Idle;
        return;
    };

    match customer.status {
        CustomerStatus::Unreleased => {
            tracing::warn!(
                truck = truck.id.0,
                customer = customer_id.0,
                time = tick.now,
                "customer visited before release"
            );
            truck.state = TruckState::Idle;
        }
        CustomerStatus::Served => {
            tracing::warn!(
                truck = truck.id.0,
                customer = customer_id.0,
                time = tick.now,
                "revisited already-served customer"
            );
            truck.advance_plan();
        }
        CustomerStatus::InService => {
            tracing::warn!(
                truck = truck.id.0,
                customer = customer_id.0,
                serviced_by = ?customer.assigned_truck.map(|t| t.0),
                time = tick.now,
                "customer already in service"
            );
            truck.state = TruckState::Idle;
        }
        CustomerStatus::Waiting => {
            customer.status = CustomerStatus::InService;
            customer.assigned_truck = Some(truck.id);
            let service_time = customer.service_time;

            truck.state = TruckState::Servicing;
            truck.servicing_customer = Some(customer_id);
            truck.service_remaining = service_time;
            tracing::debug!(
                truck = truck.id.0,
                customer = customer_id.0,
                time = tick.now,
                "service started"
            );
            if service_time <= 0.0 {
                complete_service(truck, world, tick);
            }
        }
    }
}

fn complete_service(truck: &mut Truck, world: &mut World, tick: &mut Tick<'_>) {
    let serviced_leg = truck.servicing_customer.map(TargetRef::Customer);
    let customer = truck
        .servicing_customer
        .and_then(|id| world.customer_mut(id));

    match customer {
        Some(customer) if customer.status == CustomerStatus::InService => {
            customer.status = CustomerStatus::Served;
            truck.load = truck.load.saturating_add(customer.demand);
            if truck.capacity > 0 && truck.load > truck.capacity {
                tracing::warn!(
                    truck = truck.id.0,
                    load = truck.load,
                    capacity = truck.capacity,
                    "truck load exceeds capacity"
                );
            }
            tracing::debug!(
                truck = truck.id.0,
                customer = customer.id.0,
                time = tick.now,
                "customer served"
            );
            tick.queue
                .enqueue(SimEvent::customer_served(tick.now, truck.id, customer.id));
        }
        Some(customer) => {
            tracing::warn!(
                truck = truck.id.0,
                customer = customer.id.0,
                status = ?customer.status,
                "service finished for a customer that was not in service"
            );
        }
        None => {
            tracing::warn!(
                truck = truck.id.0,
                customer = ?truck.servicing_customer.map(|c| c.0),
                "service finished for an unknown customer"
            );
        }
    }

    truck.servicing_customer = None;
    truck.service_remaining = 0.0;
    // A plan replaced mid-service already points at its first entry.
    if truck.current_target() == serviced_leg {
        truck.advance_plan();
    } else {
        tracing::debug!(truck = truck.id.0, "plan changed during service");
        truck.clear_leg();
        truck.state = TruckState::Idle;
    }
}
