use std::collections::BTreeMap;

use fleetsim_common::Vec2;

use crate::KernelError;
use crate::features::FeatureFlags;
use crate::model::{
    Customer, CustomerId, DepotCarrier, DepotNodeId, StationId, StopId, TargetRef, Truck, TruckId,
};

/// The aggregate the engine steps: clock, customers, depot, fleet and
/// stations.
///
/// Mutated in place every tick. Records refer to one another by id; the
/// customer index keeps id lookups O(log n). Snapshots go through
/// `fleetsim-persist`, never through implicit copies.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub(crate) time: f32,
    /// Fleet-wide default capacity (informational).
    pub(crate) capacity: u32,
    pub(crate) customers: Vec<Customer>,
    customer_index: BTreeMap<CustomerId, usize>,
    pub(crate) depot: DepotCarrier,
    pub(crate) depot_node_id: DepotNodeId,
    pub(crate) trucks: Vec<Truck>,
    pub(crate) features: FeatureFlags,
    pub(crate) energy_capacity: Option<f32>,
    pub(crate) energy_consumption: Option<f32>,
    pub(crate) stations: BTreeMap<StationId, Vec2>,
}

impl World {
    /// An empty world at time zero. The depot node id defaults to 1.
    pub fn new(capacity: u32, depot: DepotCarrier) -> Self {
        Self {
            time: 0.0,
            capacity,
            customers: Vec::new(),
            customer_index: BTreeMap::new(),
            depot,
            depot_node_id: DepotNodeId(1),
            trucks: Vec::new(),
            features: FeatureFlags::empty(),
            energy_capacity: None,
            energy_consumption: None,
            stations: BTreeMap::new(),
        }
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Set the clock directly (snapshot restore).
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn set_features(&mut self, features: FeatureFlags) {
        self.features = features;
    }

    pub fn depot(&self) -> &DepotCarrier {
        &self.depot
    }

    pub fn depot_mut(&mut self) -> &mut DepotCarrier {
        &mut self.depot
    }

    pub fn depot_node_id(&self) -> DepotNodeId {
        self.depot_node_id
    }

    pub fn set_depot_node_id(&mut self, id: DepotNodeId) {
        self.depot_node_id = id;
    }

    /// Electric defaults used when materializing trucks.
    pub fn energy_defaults(&self) -> (Option<f32>, Option<f32>) {
        (self.energy_capacity, self.energy_consumption)
    }

    pub fn set_energy_defaults(&mut self, capacity: Option<f32>, consumption: Option<f32>) {
        self.energy_capacity = capacity;
        self.energy_consumption = consumption;
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Add a customer, replacing any existing record with the same id.
    pub fn add_customer(&mut self, customer: Customer) {
        match self.customer_index.get(&customer.id) {
            Some(&i) => self.customers[i] = customer,
            None => {
                self.customer_index.insert(customer.id, self.customers.len());
                self.customers.push(customer);
            }
        }
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customer_index.get(&id).map(|&i| &self.customers[i])
    }

    pub fn customer_mut(&mut self, id: CustomerId) -> Option<&mut Customer> {
        self.customer_index.get(&id).map(|&i| &mut self.customers[i])
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn trucks_mut(&mut self) -> &mut [Truck] {
        &mut self.trucks
    }

    pub fn add_truck(&mut self, truck: Truck) {
        self.trucks.push(truck);
    }

    pub fn truck(&self, id: TruckId) -> Option<&Truck> {
        self.trucks.iter().find(|t| t.id == id)
    }

    pub fn truck_mut(&mut self, id: TruckId) -> Option<&mut Truck> {
        self.trucks.iter_mut().find(|t| t.id == id)
    }

    pub fn stations(&self) -> &BTreeMap<StationId, Vec2> {
        &self.stations
    }

    pub fn add_station(&mut self, id: StationId, pos: Vec2) {
        self.stations.insert(id, pos);
    }

    /// Resolve a plan target against the current world state.
    ///
    /// Depot targets follow the depot wherever it currently is. Returns
    /// `None` for ids the world does not know.
    pub fn resolve_target(&self, target: TargetRef) -> Option<Vec2> {
        match target {
            TargetRef::Depot(_) => Some(self.depot.pos),
            TargetRef::Customer(id) => self.customer(id).map(|c| c.pos),
            TargetRef::Station(id) => self.stations.get(&id).copied(),
        }
    }

    /// Send the depot toward one of its candidate stops.
    pub fn command_depot(&mut self, stop_id: StopId) -> Result<(), KernelError> {
        let stop = self
            .depot
            .candidate_stop(stop_id)
            .ok_or(KernelError::UnknownDepotStop(stop_id))?;
        self.depot.target = Some(stop);
        Ok(())
    }

    /// Replace the fleet with `count` identical trucks parked at the depot.
    ///
    /// Trucks get ids `1..=count`, the fleet-wide capacity and the world's
    /// electric defaults (zero when absent).
    pub fn create_demo_fleet(&mut self, count: u32, speed: f32, locked_prefix_count: usize) {
        let battery = self.energy_capacity.unwrap_or(0.0);
        let consumption = self.energy_consumption.unwrap_or(0.0);
        self.trucks = (1..=count)
            .map(|id| {
                let mut truck = Truck::new(TruckId(id), self.depot.pos, self.capacity, speed)
                    .with_battery(battery, consumption);
                truck.locked_prefix_count = locked_prefix_count;
                truck
            })
            .collect();
    }

    /// Deterministic hash of the full world state for run comparison.
    pub fn state_hash(&self) -> u64 {
        let mut h = Fnv::new();
        h.mix(&self.time.to_le_bytes());
        h.mix(&self.features.bits().to_le_bytes());
        h.vec2(self.depot.pos);
        if let Some(target) = self.depot.target {
            h.mix(&target.stop_id.0.to_le_bytes());
        }
        for c in &self.customers {
            h.mix(&c.id.0.to_le_bytes());
            h.mix(&[c.status.code()]);
            h.mix(&c.assigned_truck.map_or(0, |t| t.0.wrapping_add(1)).to_le_bytes());
        }
        for t in &self.trucks {
            h.mix(&t.id.0.to_le_bytes());
            h.vec2(t.pos);
            h.mix(&t.load.to_le_bytes());
            h.mix(&t.battery.to_le_bytes());
            h.mix(&[t.state.code()]);
            h.mix(&(t.current_target_index as u64).to_le_bytes());
            h.mix(&t.service_remaining.to_le_bytes());
        }
        h.0
    }
}

/// FNV-1a over raw little-endian bytes.
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }

    fn mix(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn vec2(&mut self, v: Vec2) {
        self.mix(&v.x.to_le_bytes());
        self.mix(&v.y.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerStatus, DepotCandidateStop};

    fn world() -> World {
        let depot = DepotCarrier::new(Vec2::ZERO, 2.0).with_candidate_stops(vec![
            DepotCandidateStop::new(StopId(1), Vec2::ZERO),
            DepotCandidateStop::new(StopId(2), Vec2::new(10.0, 0.0)),
        ]);
        let mut w = World::new(50, depot);
        w.add_customer(Customer::new(CustomerId(2), Vec2::new(3.0, 4.0), 5, 0.0));
        w.add_station(StationId(9), Vec2::new(-1.0, -1.0));
        w
    }

    #[test]
    fn resolves_targets_against_live_state() {
        let mut w = world();
        assert_eq!(w.resolve_target(TargetRef::Depot(DepotNodeId(1))), Some(Vec2::ZERO));
        assert_eq!(
            w.resolve_target(TargetRef::Customer(CustomerId(2))),
            Some(Vec2::new(3.0, 4.0))
        );
        assert_eq!(
            w.resolve_target(TargetRef::Station(StationId(9))),
            Some(Vec2::new(-1.0, -1.0))
        );
        assert_eq!(w.resolve_target(TargetRef::Station(StationId(1))), None);
        assert_eq!(w.resolve_target(TargetRef::Customer(CustomerId(99))), None);

        w.depot_mut().pos = Vec2::new(7.0, 7.0);
        assert_eq!(
            w.resolve_target(TargetRef::Depot(DepotNodeId(1))),
            Some(Vec2::new(7.0, 7.0))
        );
    }

    #[test]
    fn add_customer_replaces_same_id() {
        let mut w = world();
        w.add_customer(
            Customer::new(CustomerId(2), Vec2::ZERO, 1, 0.0).with_status(CustomerStatus::Waiting),
        );
        assert_eq!(w.customers().len(), 1);
        assert_eq!(w.customer(CustomerId(2)).unwrap().demand, 1);
    }

    #[test]
    fn command_depot_requires_known_stop() {
        let mut w = world();
        w.command_depot(StopId(2)).unwrap();
        assert_eq!(w.depot().target.map(|s| s.stop_id), Some(StopId(2)));
        assert!(matches!(
            w.command_depot(StopId(5)),
            Err(KernelError::UnknownDepotStop(StopId(5)))
        ));
    }

    #[test]
    fn demo_fleet_uses_world_defaults() {
        let mut w = world();
        w.set_energy_defaults(Some(80.0), Some(0.5));
        w.create_demo_fleet(3, 1.5, 2);
        assert_eq!(w.trucks().len(), 3);
        let ids: Vec<u32> = w.trucks().iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let t = w.truck(TruckId(2)).unwrap();
        assert_eq!(t.capacity, 50);
        assert_eq!(t.battery, 80.0);
        assert_eq!(t.energy_consumption, 0.5);
        assert_eq!(t.locked_prefix_count, 2);
        assert_eq!(t.pos, w.depot().pos);
    }

    #[test]
    fn state_hash_tracks_changes() {
        let mut a = world();
        let b = world();
        assert_eq!(a.state_hash(), b.state_hash());
        a.customer_mut(CustomerId(2)).unwrap().status = CustomerStatus::Waiting;
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
