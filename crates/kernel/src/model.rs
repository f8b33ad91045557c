//! Domain records: customers, trucks, the depot carrier and plan targets.
//!
//! Records reference each other by integer id, never by pointer; the
//! [`World`](crate::World) resolves ids against its collections.

use std::fmt;
use std::str::FromStr;

use fleetsim_common::Vec2;
use serde::{Deserialize, Serialize};

use crate::KernelError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Customer node id, unique and stable for a run.
    CustomerId
);
id_type!(TruckId);
id_type!(
    /// Id of a depot rendezvous stop.
    StopId
);
id_type!(
    /// Charging station node id.
    StationId
);
id_type!(
    /// Node id of the depot as a plan target.
    DepotNodeId
);

/// Customer lifecycle. Only ever advances in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerStatus {
    Unreleased,
    Waiting,
    InService,
    Served,
}

impl CustomerStatus {
    /// Stable numeric code used by the snapshot format.
    pub fn code(self) -> u8 {
        match self {
            Self::Unreleased => 0,
            Self::Waiting => 1,
            Self::InService => 2,
            Self::Served => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unreleased),
            1 => Some(Self::Waiting),
            2 => Some(Self::InService),
            3 => Some(Self::Served),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub pos: Vec2,
    pub demand: u32,
    pub release_time: f32,
    /// Duration of service once a truck starts it.
    pub service_time: f32,
    pub status: CustomerStatus,
    /// Set exactly when the status is `InService` or `Served`.
    pub assigned_truck: Option<TruckId>,
}

impl Customer {
    /// A customer that is not yet released and needs no service time.
    pub fn new(id: CustomerId, pos: Vec2, demand: u32, release_time: f32) -> Self {
        Self {
            id,
            pos,
            demand,
            release_time,
            service_time: 0.0,
            status: CustomerStatus::Unreleased,
            assigned_truck: None,
        }
    }

    pub fn with_service_time(mut self, service_time: f32) -> Self {
        self.service_time = service_time;
        self
    }

    pub fn with_status(mut self, status: CustomerStatus) -> Self {
        self.status = status;
        self
    }
}

/// A routing waypoint, resolved against the live world when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Depot(DepotNodeId),
    Customer(CustomerId),
    Station(StationId),
}

impl TargetRef {
    /// The raw id carried by the reference, whatever its kind.
    pub fn id(self) -> u32 {
        match self {
            Self::Depot(id) => id.0,
            Self::Customer(id) => id.0,
            Self::Station(id) => id.0,
        }
    }

    fn tag(self) -> char {
        match self {
            Self::Depot(_) => 'D',
            Self::Customer(_) => 'C',
            Self::Station(_) => 'S',
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag(), self.id())
    }
}

impl FromStr for TargetRef {
    type Err = KernelError;

    /// Parses the `D:1` / `C:7` / `S:3` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KernelError::InvalidTarget(s.to_string());
        let (tag, id) = s.split_once(':').ok_or_else(invalid)?;
        let id: u32 = id.trim().parse().map_err(|_| invalid())?;
        match tag.trim() {
            "D" => Ok(Self::Depot(DepotNodeId(id))),
            "C" => Ok(Self::Customer(CustomerId(id))),
            "S" => Ok(Self::Station(StationId(id))),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckState {
    Idle,
    Traveling,
    Servicing,
    /// Reserved: no stepping logic enters or leaves this state yet.
    Charging,
}

impl TruckState {
    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Traveling => 1,
            Self::Servicing => 2,
            Self::Charging => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Traveling),
            2 => Some(Self::Servicing),
            3 => Some(Self::Charging),
            _ => None,
        }
    }
}

/// A vehicle executing an externally supplied plan.
///
/// Plan contents belong to external planners. The state-machine fields
/// (`state`, the cursor and the leg fields below it) are written only by
/// the engine while stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    pub pos: Vec2,
    pub capacity: u32,
    pub load: u32,
    pub speed: f32,
    pub battery_capacity: f32,
    pub battery: f32,
    /// Energy per unit distance.
    pub energy_consumption: f32,
    pub plan: Vec<TargetRef>,
    /// Leading plan entries an external planner treats as committed.
    pub locked_prefix_count: usize,
    pub current_target_index: usize,
    pub state: TruckState,

    /// Position the current leg resolved to on the last tick.
    pub target_pos: Option<Vec2>,
    pub active_target: Option<TargetRef>,
    /// Whether `TruckArrived` has fired for `active_target`.
    pub arrival_signaled: bool,
    pub service_remaining: f32,
    pub servicing_customer: Option<CustomerId>,

    pub total_distance: f32,
    pub total_energy_used: f32,
}

impl Truck {
    pub fn new(id: TruckId, pos: Vec2, capacity: u32, speed: f32) -> Self {
        Self {
            id,
            pos,
            capacity,
            load: 0,
            speed,
            battery_capacity: 0.0,
            battery: 0.0,
            energy_consumption: 0.0,
            plan: Vec::new(),
            locked_prefix_count: 0,
            current_target_index: 0,
            state: TruckState::Idle,
            target_pos: None,
            active_target: None,
            arrival_signaled: false,
            service_remaining: 0.0,
            servicing_customer: None,
            total_distance: 0.0,
            total_energy_used: 0.0,
        }
    }

    /// Full battery of `capacity`, draining `consumption` per unit distance.
    pub fn with_battery(mut self, capacity: f32, consumption: f32) -> Self {
        self.battery_capacity = capacity;
        self.battery = capacity;
        self.energy_consumption = consumption;
        self
    }

    pub fn with_plan(mut self, plan: Vec<TargetRef>) -> Self {
        self.set_plan(plan);
        self
    }

    /// The plan entry under the cursor, or `None` once the plan is exhausted.
    pub fn current_target(&self) -> Option<TargetRef> {
        self.plan.get(self.current_target_index).copied()
    }

    pub fn plan_exhausted(&self) -> bool {
        self.current_target_index >= self.plan.len()
    }

    /// Entries not yet reached, starting at the cursor.
    pub fn remaining_plan(&self) -> &[TargetRef] {
        &self.plan[self.current_target_index.min(self.plan.len())..]
    }

    /// Replace the plan and rewind the cursor.
    pub fn set_plan(&mut self, plan: Vec<TargetRef>) {
        self.plan = plan;
        self.reset_cursor();
    }

    pub fn append_to_plan(&mut self, target: TargetRef) {
        self.plan.push(target);
    }

    pub fn clear_plan(&mut self) {
        self.plan.clear();
        self.reset_cursor();
    }

    /// Rewind to the first plan entry. Service in progress is left alone.
    pub fn reset_cursor(&mut self) {
        self.current_target_index = 0;
        self.clear_leg();
    }

    pub(crate) fn clear_leg(&mut self) {
        self.target_pos = None;
        self.active_target = None;
        self.arrival_signaled = false;
    }

    /// Move past the current entry, never beyond the end of the plan.
    pub(crate) fn advance_plan(&mut self) {
        self.current_target_index = (self.current_target_index + 1).min(self.plan.len());
        self.clear_leg();
        self.state = TruckState::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepotCandidateStop {
    pub stop_id: StopId,
    pub pos: Vec2,
}

impl DepotCandidateStop {
    pub fn new(stop_id: StopId, pos: Vec2) -> Self {
        Self { stop_id, pos }
    }
}

/// The (possibly mobile) depot. One per world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotCarrier {
    pub pos: Vec2,
    /// Zero unless the moving-depot feature applies.
    pub speed: f32,
    candidate_stops: Vec<DepotCandidateStop>,
    /// Stop the depot is currently heading for; cleared on arrival.
    pub target: Option<DepotCandidateStop>,
}

impl DepotCarrier {
    /// A depot whose only candidate stop (id 1) is its starting position.
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            speed,
            candidate_stops: vec![DepotCandidateStop::new(StopId(1), pos)],
            target: None,
        }
    }

    /// Replace the candidate stops. An empty list keeps the current ones so
    /// at least one stop always exists.
    pub fn with_candidate_stops(mut self, stops: Vec<DepotCandidateStop>) -> Self {
        if !stops.is_empty() {
            self.candidate_stops = stops;
        }
        self
    }

    pub fn candidate_stops(&self) -> &[DepotCandidateStop] {
        &self.candidate_stops
    }

    pub fn candidate_stop(&self, stop_id: StopId) -> Option<DepotCandidateStop> {
        self.candidate_stops
            .iter()
            .find(|s| s.stop_id == stop_id)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ref_display_and_parse() {
        let targets = [
            TargetRef::Depot(DepotNodeId(1)),
            TargetRef::Customer(CustomerId(42)),
            TargetRef::Station(StationId(7)),
        ];
        for t in targets {
            assert_eq!(t.to_string().parse::<TargetRef>().unwrap(), t);
        }
        assert_eq!(TargetRef::Customer(CustomerId(42)).to_string(), "C:42");
        assert_eq!(
            "D:1".parse::<TargetRef>().unwrap(),
            TargetRef::Depot(DepotNodeId(1))
        );
        assert_eq!(TargetRef::Depot(DepotNodeId(1)).id(), 1);
    }

    #[test]
    fn target_ref_equality_is_by_tag_and_id() {
        assert_ne!(TargetRef::Depot(DepotNodeId(3)), TargetRef::Station(StationId(3)));
        assert_eq!(TargetRef::Customer(CustomerId(3)), TargetRef::Customer(CustomerId(3)));
    }

    #[test]
    fn target_ref_rejects_garbage() {
        assert!("X:1".parse::<TargetRef>().is_err());
        assert!("C1".parse::<TargetRef>().is_err());
        assert!("C:-4".parse::<TargetRef>().is_err());
    }

    #[test]
    fn status_codes_round_trip_and_order() {
        for code in 0..4 {
            let status = CustomerStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(CustomerStatus::from_code(4).is_none());
        assert!(CustomerStatus::Unreleased < CustomerStatus::Waiting);
        assert!(CustomerStatus::InService < CustomerStatus::Served);
    }

    #[test]
    fn advance_plan_is_clamped_to_plan_length() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0)
            .with_plan(vec![TargetRef::Depot(DepotNodeId(1))]);
        truck.advance_plan();
        truck.advance_plan();
        assert_eq!(truck.current_target_index, 1);
        assert!(truck.plan_exhausted());
        assert!(truck.remaining_plan().is_empty());
    }

    #[test]
    fn set_plan_rewinds_cursor_and_leg() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0)
            .with_plan(vec![TargetRef::Depot(DepotNodeId(1)), TargetRef::Customer(CustomerId(2))]);
        truck.current_target_index = 1;
        truck.arrival_signaled = true;
        truck.set_plan(vec![TargetRef::Customer(CustomerId(5))]);
        assert_eq!(truck.current_target_index, 0);
        assert!(!truck.arrival_signaled);
        assert_eq!(truck.current_target(), Some(TargetRef::Customer(CustomerId(5))));
    }

    #[test]
    fn depot_always_keeps_a_candidate_stop() {
        let depot = DepotCarrier::new(Vec2::new(1.0, 2.0), 0.0).with_candidate_stops(Vec::new());
        assert_eq!(depot.candidate_stops().len(), 1);
        assert_eq!(depot.candidate_stop(StopId(1)).unwrap().pos, Vec2::new(1.0, 2.0));
    }
}
