use std::fmt;

use fleetsim_common::Vec2;
use fleetsim_kernel::{
    CustomerStatus, EventKind, EventQueue, TargetRef, TruckId, TruckState, World,
};

/// Fleet inspector for developer tooling.
///
/// Read-only queries against a world and its event log, for debugging and
/// end-of-run reports.
pub struct FleetInspector;

impl FleetInspector {
    pub fn summary(world: &World, queue: &EventQueue) -> FleetSummary {
        let count_customers =
            |status| world.customers().iter().filter(|c| c.status == status).count();
        let count_trucks = |state| world.trucks().iter().filter(|t| t.state == state).count();

        FleetSummary {
            time: world.time(),
            kind: world.features().kind_label(),
            customers: world.customers().len(),
            unreleased: count_customers(CustomerStatus::Unreleased),
            waiting: count_customers(CustomerStatus::Waiting),
            in_service: count_customers(CustomerStatus::InService),
            served: count_customers(CustomerStatus::Served),
            trucks: world.trucks().len(),
            idle: count_trucks(TruckState::Idle),
            traveling: count_trucks(TruckState::Traveling),
            servicing: count_trucks(TruckState::Servicing),
            total_distance: world.trucks().iter().map(|t| t.total_distance).sum(),
            total_energy_used: world.trucks().iter().map(|t| t.total_energy_used).sum(),
            total_load: world.trucks().iter().map(|t| u64::from(t.load)).sum(),
            events: queue.len(),
            arrivals: queue.count_kind(EventKind::TruckArrived),
        }
    }

    pub fn inspect_truck(world: &World, id: TruckId) -> Option<TruckInfo> {
        world.truck(id).map(|t| TruckInfo {
            id: t.id,
            pos: t.pos,
            state: t.state,
            load: t.load,
            capacity: t.capacity,
            battery: t.battery,
            next_target: t.current_target(),
            remaining_targets: t.remaining_plan().len(),
            total_distance: t.total_distance,
        })
    }

    pub fn list_trucks(world: &World) -> Vec<TruckId> {
        world.trucks().iter().map(|t| t.id).collect()
    }
}

/// End-of-run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSummary {
    pub time: f32,
    /// Problem kind label, e.g. `CDEM`.
    pub kind: String,
    pub customers: usize,
    pub unreleased: usize,
    pub waiting: usize,
    pub in_service: usize,
    pub served: usize,
    pub trucks: usize,
    pub idle: usize,
    pub traveling: usize,
    pub servicing: usize,
    pub total_distance: f32,
    pub total_energy_used: f32,
    pub total_load: u64,
    pub events: usize,
    pub arrivals: usize,
}

impl fmt::Display for FleetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fleet: t={:.2} kind={}", self.time, self.kind)?;
        writeln!(
            f,
            "  customers={} served={} in_service={} waiting={} unreleased={}",
            self.customers, self.served, self.in_service, self.waiting, self.unreleased
        )?;
        writeln!(
            f,
            "  trucks={} idle={} traveling={} servicing={}",
            self.trucks, self.idle, self.traveling, self.servicing
        )?;
        write!(
            f,
            "  distance={:.2} energy={:.2} load={} events={} arrivals={}",
            self.total_distance, self.total_energy_used, self.total_load, self.events, self.arrivals
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruckInfo {
    pub id: TruckId,
    pub pos: Vec2,
    pub state: TruckState,
    pub load: u32,
    pub capacity: u32,
    pub battery: f32,
    pub next_target: Option<TargetRef>,
    pub remaining_targets: usize,
    pub total_distance: f32,
}

impl fmt::Display for TruckInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let next = self
            .next_target
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        write!(
            f,
            concat!(
                "Truck {} {:?} pos=({:.2}, {:.2}) load={}/{} battery={:.1} ",
                "next={} remaining={} dist={:.2}",
            ),
            self.id,
            self.state,
            self.pos.x,
            self.pos.y,
            self.load,
            self.capacity,
            self.battery,
            next,
            self.remaining_targets,
            self.total_distance,
        )
    }
}
