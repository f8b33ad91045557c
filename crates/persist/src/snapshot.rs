//! Plain-text world snapshots.
//!
//! One record per line, `#` starts a comment, unknown lines are skipped:
//! ```text
//! # SNAPSHOT v1
//! time=12.5
//! seed=12345
//! features=3
//! depot=0,0,0
//! customers=1
//! customer <id> <x> <y> <demand> <release> <service> <status> <truck|-1>
//! trucks=1
//! truck <id> <x> <y> <speed> <cap> <load> <state> <battery> <battery_cap>
//!       <consumption> <locked> <cursor> <plan_len> <D:1|C:3|S:7>
//! events=1
//! event <time> <code> <a> <b>
//! ```
//! Extension lines carry the remaining world state so a restore is exact:
//! `capacity=`, `energy=`, `depot_node=`, `depot_target=`, `stop`,
//! `station` and one `leg` line per truck.
//!
//! Floats are written in shortest round-trip form.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use fleetsim_common::Vec2;
use fleetsim_kernel::{
    Customer, CustomerId, CustomerStatus, DepotCandidateStop, DepotCarrier, DepotNodeId, EventKind,
    EventQueue, FeatureFlags, SimEvent, StationId, StopId, TargetRef, Truck, TruckId, TruckState,
    World,
};

pub const SNAPSHOT_VERSION: u32 = 1;
const HEADER_PREFIX: &str = "# SNAPSHOT v";
const NONE: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("{section}: declared {declared} records, found {found}")]
    CountMismatch {
        section: &'static str,
        declared: usize,
        found: usize,
    },
    #[error("leg record for unknown truck {0}")]
    OrphanLeg(TruckId),
}

/// A world and its event log at one instant, plus the run seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub seed: u64,
    pub world: World,
    pub events: Vec<SimEvent>,
}

impl Snapshot {
    pub fn capture(world: &World, queue: &EventQueue, seed: u64) -> Self {
        Self {
            seed,
            world: world.clone(),
            events: queue.drain_to_vec(),
        }
    }

    /// Rebuild the world and queue. Event order is preserved as written.
    pub fn restore(&self) -> (World, EventQueue) {
        (self.world.clone(), self.events.iter().copied().collect())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::read(BufReader::new(File::open(path)?))
    }

    pub fn to_text(&self) -> Result<String, SnapshotError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn write(&self, w: &mut impl Write) -> Result<(), SnapshotError> {
        let world = &self.world;
        let depot = world.depot();
        writeln!(w, "{HEADER_PREFIX}{SNAPSHOT_VERSION}")?;
        writeln!(w, "time={}", world.time())?;
        writeln!(w, "seed={}", self.seed)?;
        writeln!(w, "features={}", world.features().bits())?;
        writeln!(w, "depot={},{},{}", depot.pos.x, depot.pos.y, depot.speed)?;

        writeln!(w, "capacity={}", world.capacity())?;
        let (energy_cap, energy_cons) = world.energy_defaults();
        writeln!(w, "energy={},{}", opt(energy_cap), opt(energy_cons))?;
        writeln!(w, "depot_node={}", world.depot_node_id())?;
        if let Some(target) = depot.target {
            writeln!(
                w,
                "depot_target={},{},{}",
                target.stop_id, target.pos.x, target.pos.y
            )?;
        }
        for stop in depot.candidate_stops() {
            writeln!(w, "stop {} {} {}", stop.stop_id, stop.pos.x, stop.pos.y)?;
        }
        for (id, pos) in world.stations() {
            writeln!(w, "station {id} {} {}", pos.x, pos.y)?;
        }

        writeln!(w, "customers={}", world.customers().len())?;
        for c in world.customers() {
            writeln!(
                w,
                "customer {} {} {} {} {} {} {} {}",
                c.id,
                c.pos.x,
                c.pos.y,
                c.demand,
                c.release_time,
                c.service_time,
                c.status.code(),
                c.assigned_truck.map_or(-1, |t| i64::from(t.0)),
            )?;
        }

        writeln!(w, "trucks={}", world.trucks().len())?;
        for t in world.trucks() {
            let plan: Vec<String> = t.plan.iter().map(ToString::to_string).collect();
            writeln!(
                w,
                "truck {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
                t.id,
                t.pos.x,
                t.pos.y,
                t.speed,
                t.capacity,
                t.load,
                t.state.code(),
                t.battery,
                t.battery_capacity,
                t.energy_consumption,
                t.locked_prefix_count,
                t.current_target_index,
                t.plan.len(),
                plan.join("|"),
            )?;
        }
        for t in world.trucks() {
            writeln!(
                w,
                "leg {} {} {} {} {} {} {} {}",
                t.id,
                opt(t.active_target),
                u8::from(t.arrival_signaled),
                t.service_remaining,
                t.servicing_customer.map_or(-1, |c| i64::from(c.0)),
                t.target_pos.map_or(NONE.to_string(), |p| format!("{},{}", p.x, p.y)),
                t.total_distance,
                t.total_energy_used,
            )?;
        }

        writeln!(w, "events={}", self.events.len())?;
        for e in &self.events {
            writeln!(w, "event {} {} {} {}", e.time, e.kind.code(), e.a, e.b)?;
        }
        Ok(())
    }

    pub fn read(reader: impl BufRead) -> Result<Self, SnapshotError> {
        let mut parts = Parts::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            parts.accept(index + 1, line.trim())?;
        }
        parts.finish()
    }
}

impl FromStr for Snapshot {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::read(s.as_bytes())
    }
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NONE.to_string(), |v| v.to_string())
}

/// Per-truck state that only the `leg` line carries.
struct Leg {
    truck: TruckId,
    active_target: Option<TargetRef>,
    arrival_signaled: bool,
    service_remaining: f32,
    servicing_customer: Option<CustomerId>,
    target_pos: Option<Vec2>,
    total_distance: f32,
    total_energy_used: f32,
}

/// Records collected while reading, assembled into a world at the end.
struct Parts {
    time: f32,
    seed: u64,
    features: FeatureFlags,
    depot_pos: Vec2,
    depot_speed: f32,
    capacity: u32,
    energy: (Option<f32>, Option<f32>),
    depot_node: Option<DepotNodeId>,
    depot_target: Option<DepotCandidateStop>,
    stops: Vec<DepotCandidateStop>,
    stations: Vec<(StationId, Vec2)>,
    declared_customers: Option<usize>,
    customers: Vec<Customer>,
    declared_trucks: Option<usize>,
    trucks: Vec<Truck>,
    legs: Vec<Leg>,
    declared_events: Option<usize>,
    events: Vec<SimEvent>,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            time: 0.0,
            seed: 0,
            features: FeatureFlags::empty(),
            depot_pos: Vec2::ZERO,
            depot_speed: 0.0,
            capacity: 0,
            energy: (None, None),
            depot_node: None,
            depot_target: None,
            stops: Vec::new(),
            stations: Vec::new(),
            declared_customers: None,
            customers: Vec::new(),
            declared_trucks: None,
            trucks: Vec::new(),
            legs: Vec::new(),
            declared_events: None,
            events: Vec::new(),
        }
    }
}

impl Parts {
    fn accept(&mut self, number: usize, line: &str) -> Result<(), SnapshotError> {
        if let Some(version) = line.strip_prefix(HEADER_PREFIX) {
            let version = Fields::single(number, version).parse::<u32>("version")?;
            if version != SNAPSHOT_VERSION {
                return Err(SnapshotError::UnsupportedVersion(version));
            }
            return Ok(());
        }
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        if let Some((key, value)) = line.split_once('=') {
            let mut f = Fields::list(number, value);
            match key {
                "time" => self.time = f.parse("time")?,
                "seed" => self.seed = f.parse("seed")?,
                "features" => {
                    self.features = FeatureFlags::from_bits_retain(f.parse("features")?)
                }
                "depot" => {
                    self.depot_pos = f.vec2("depot position")?;
                    self.depot_speed = f.parse("depot speed")?;
                }
                "capacity" => self.capacity = f.parse("capacity")?,
                "energy" => {
                    self.energy = (f.optional("energy capacity")?, f.optional("consumption")?)
                }
                "depot_node" => self.depot_node = Some(DepotNodeId(f.parse("depot node")?)),
                "depot_target" => {
                    let stop_id = StopId(f.parse("stop id")?);
                    self.depot_target = Some(DepotCandidateStop::new(stop_id, f.vec2("stop")?));
                }
                "customers" => self.declared_customers = Some(f.parse("customer count")?),
                "trucks" => self.declared_trucks = Some(f.parse("truck count")?),
                "events" => self.declared_events = Some(f.parse("event count")?),
                _ => {}
            }
            return Ok(());
        }

        let mut f = Fields::words(number, line);
        let Some(tag) = f.tokens.next() else {
            return Ok(());
        };
        match tag {
            "stop" => {
                let stop_id = StopId(f.parse("stop id")?);
                let pos = Vec2::new(f.parse("x")?, f.parse("y")?);
                self.stops.push(DepotCandidateStop::new(stop_id, pos));
            }
            "station" => {
                let id = StationId(f.parse("station id")?);
                self.stations
                    .push((id, Vec2::new(f.parse("x")?, f.parse("y")?)));
            }
            "customer" => self.customers.push(read_customer(&mut f)?),
            "truck" => self.trucks.push(read_truck(&mut f)?),
            "leg" => self.legs.push(read_leg(&mut f)?),
            "event" => {
                let time = f.parse("event time")?;
                let code: u8 = f.parse("event code")?;
                let kind = EventKind::from_code(code)
                    .ok_or_else(|| f.error(format!("unknown event code {code}")))?;
                self.events
                    .push(SimEvent::new(time, kind, f.parse("a")?, f.parse("b")?));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Snapshot, SnapshotError> {
        check_count("customers", self.declared_customers, self.customers.len())?;
        check_count("trucks", self.declared_trucks, self.trucks.len())?;
        check_count("events", self.declared_events, self.events.len())?;

        let mut depot = DepotCarrier::new(self.depot_pos, self.depot_speed)
            .with_candidate_stops(self.stops);
        depot.target = self.depot_target;

        let mut world = World::new(self.capacity, depot).with_features(self.features);
        world.set_time(self.time);
        world.set_energy_defaults(self.energy.0, self.energy.1);
        if let Some(node) = self.depot_node {
            world.set_depot_node_id(node);
        }
        for (id, pos) in self.stations {
            world.add_station(id, pos);
        }
        for customer in self.customers {
            world.add_customer(customer);
        }
        for truck in self.trucks {
            world.add_truck(truck);
        }
        for leg in self.legs {
            let truck = world
                .truck_mut(leg.truck)
                .ok_or(SnapshotError::OrphanLeg(leg.truck))?;
            truck.active_target = leg.active_target;
            truck.arrival_signaled = leg.arrival_signaled;
            truck.service_remaining = leg.service_remaining;
            truck.servicing_customer = leg.servicing_customer;
            truck.target_pos = leg.target_pos;
            truck.total_distance = leg.total_distance;
            truck.total_energy_used = leg.total_energy_used;
        }

        Ok(Snapshot {
            seed: self.seed,
            world,
            events: self.events,
        })
    }
}

fn check_count(
    section: &'static str,
    declared: Option<usize>,
    found: usize,
) -> Result<(), SnapshotError> {
    match declared {
        Some(declared) if declared != found => Err(SnapshotError::CountMismatch {
            section,
            declared,
            found,
        }),
        _ => Ok(()),
    }
}

fn read_customer(f: &mut Fields<'_>) -> Result<Customer, SnapshotError> {
    let id = CustomerId(f.parse("customer id")?);
    let pos = Vec2::new(f.parse("x")?, f.parse("y")?);
    let demand = f.parse("demand")?;
    let release_time = f.parse("release time")?;
    let service_time = f.parse("service time")?;
    let code: u8 = f.parse("status")?;
    let status = CustomerStatus::from_code(code)
        .ok_or_else(|| f.error(format!("unknown customer status {code}")))?;
    let assigned: i64 = f.parse("assigned truck")?;

    let mut customer = Customer::new(id, pos, demand, release_time)
        .with_service_time(service_time)
        .with_status(status);
    customer.assigned_truck = u32::try_from(assigned).ok().map(TruckId);
    Ok(customer)
}

fn read_truck(f: &mut Fields<'_>) -> Result<Truck, SnapshotError> {
    let id = TruckId(f.parse("truck id")?);
    let pos = Vec2::new(f.parse("x")?, f.parse("y")?);
    let speed = f.parse("speed")?;
    let capacity = f.parse("capacity")?;
    let mut truck = Truck::new(id, pos, capacity, speed);
    truck.load = f.parse("load")?;
    let code: u8 = f.parse("state")?;
    truck.state = TruckState::from_code(code)
        .ok_or_else(|| f.error(format!("unknown truck state {code}")))?;
    truck.battery = f.parse("battery")?;
    truck.battery_capacity = f.parse("battery capacity")?;
    truck.energy_consumption = f.parse("energy consumption")?;
    truck.locked_prefix_count = f.parse("locked prefix")?;
    truck.current_target_index = f.parse("cursor")?;

    let declared: usize = f.parse("plan length")?;
    let plan = match f.tokens.next() {
        Some(encoded) => encoded
            .split('|')
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<TargetRef>().map_err(|e| f.error(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    if plan.len() != declared {
        return Err(f.error(format!(
            "plan declares {declared} targets, found {}",
            plan.len()
        )));
    }
    truck.plan = plan;
    Ok(truck)
}

fn read_leg(f: &mut Fields<'_>) -> Result<Leg, SnapshotError> {
    let truck = TruckId(f.parse("truck id")?);
    let active_target = match f.token("active target")? {
        NONE => None,
        token => Some(token.parse::<TargetRef>().map_err(|e| f.error(e.to_string()))?),
    };
    let arrival_signaled = f.parse::<u8>("arrival flag")? != 0;
    let service_remaining = f.parse("service remaining")?;
    let servicing: i64 = f.parse("servicing customer")?;
    let target_pos = match f.token("target position")? {
        NONE => None,
        token => Some(Fields::list(f.number, token).vec2("target position")?),
    };
    Ok(Leg {
        truck,
        active_target,
        arrival_signaled,
        service_remaining,
        servicing_customer: u32::try_from(servicing).ok().map(CustomerId),
        target_pos,
        total_distance: f.parse("total distance")?,
        total_energy_used: f.parse("total energy")?,
    })
}

/// Cursor over the fields of one line.
struct Fields<'a> {
    number: usize,
    tokens: Box<dyn Iterator<Item = &'a str> + 'a>,
}

impl<'a> Fields<'a> {
    fn words(number: usize, line: &'a str) -> Self {
        Self {
            number,
            tokens: Box::new(line.split_whitespace()),
        }
    }

    fn list(number: usize, value: &'a str) -> Self {
        Self {
            number,
            tokens: Box::new(value.split(',').map(str::trim)),
        }
    }

    fn single(number: usize, value: &'a str) -> Self {
        Self {
            number,
            tokens: Box::new(std::iter::once(value.trim())),
        }
    }

    fn error(&self, message: String) -> SnapshotError {
        SnapshotError::Malformed {
            line: self.number,
            message,
        }
    }

    fn token(&mut self, what: &str) -> Result<&'a str, SnapshotError> {
        match self.tokens.next() {
            Some(token) => Ok(token),
            None => Err(self.error(format!("missing {what}"))),
        }
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T, SnapshotError> {
        let token = self.token(what)?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {what} `{token}`")))
    }

    fn optional<T: FromStr>(&mut self, what: &str) -> Result<Option<T>, SnapshotError> {
        match self.tokens.next() {
            None | Some(NONE) | Some("") => Ok(None),
            Some(token) => token
                .parse()
                .map(Some)
                .map_err(|_| self.error(format!("invalid {what} `{token}`"))),
        }
    }

    fn vec2(&mut self, what: &str) -> Result<Vec2, SnapshotError> {
        Ok(Vec2::new(self.parse(what)?, self.parse(what)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsim_kernel::{EngineOptions, Simulation};

    fn busy_world() -> World {
        let depot = DepotCarrier::new(Vec2::new(0.5, -1.25), 1.5).with_candidate_stops(vec![
            DepotCandidateStop::new(StopId(1), Vec2::new(0.5, -1.25)),
            DepotCandidateStop::new(StopId(4), Vec2::new(9.0, 3.0)),
        ]);
        let mut world = World::new(8, depot).with_features(FeatureFlags::all());
        world.set_energy_defaults(Some(60.0), Some(0.7));
        world.set_depot_node_id(DepotNodeId(3));
        world.add_station(StationId(11), Vec2::new(-4.0, 2.0));
        world.add_customer(
            Customer::new(CustomerId(2), Vec2::new(3.3, 1.1), 2, 0.0).with_service_time(1.7),
        );
        world.add_customer(
            Customer::new(CustomerId(5), Vec2::new(-2.0, 6.1), 3, 4.2).with_service_time(0.4),
        );
        world.add_customer(Customer::new(CustomerId(7), Vec2::new(1.0, 1.0), 1, 0.0));
        world.create_demo_fleet(2, 1.3, 1);
        world.trucks_mut()[0].set_plan(vec![
            TargetRef::Customer(CustomerId(2)),
            TargetRef::Station(StationId(11)),
            TargetRef::Customer(CustomerId(5)),
            TargetRef::Depot(DepotNodeId(1)),
        ]);
        world.trucks_mut()[1].set_plan(vec![TargetRef::Customer(CustomerId(7))]);
        world
    }

    fn mid_run() -> Simulation {
        let mut sim = Simulation::new(busy_world(), EngineOptions::default());
        sim.world_mut().command_depot(StopId(4)).unwrap();
        for _ in 0..7 {
            sim.step(0.3);
        }
        sim
    }

    #[test]
    fn round_trip_reproduces_world_and_events() {
        let sim = mid_run();
        let snap = Snapshot::capture(sim.world(), sim.queue(), 12345);
        let text = snap.to_text().unwrap();
        let restored: Snapshot = text.parse().unwrap();

        assert_eq!(restored, snap);
        let (world, queue) = restored.restore();
        assert_eq!(&world, sim.world());
        assert_eq!(world.state_hash(), sim.world().state_hash());
        assert_eq!(queue.drain_to_vec(), sim.queue().drain_to_vec());
    }

    #[test]
    fn resumed_run_matches_uninterrupted_run() {
        let mut straight = mid_run();
        let snap = Snapshot::capture(straight.world(), straight.queue(), 1);
        let (world, queue) = snap.to_text().unwrap().parse::<Snapshot>().unwrap().restore();
        let mut resumed = Simulation::resume(world, queue, straight.options());

        for _ in 0..60 {
            straight.step(0.3);
            resumed.step(0.3);
        }
        assert_eq!(resumed.world(), straight.world());
        assert_eq!(resumed.queue(), straight.queue());
    }

    #[test]
    fn core_lines_follow_v1_layout() {
        let mut world = World::new(5, DepotCarrier::new(Vec2::new(1.0, 2.0), 0.0));
        world.add_customer(Customer::new(CustomerId(3), Vec2::new(4.0, 5.0), 2, 0.0));
        world.add_truck(
            Truck::new(TruckId(1), Vec2::ZERO, 5, 1.0).with_plan(vec![
                TargetRef::Customer(CustomerId(3)),
                TargetRef::Depot(DepotNodeId(1)),
            ]),
        );
        let queue: EventQueue = [SimEvent::new(0.5, EventKind::CustomerReleased, 3, 0)]
            .into_iter()
            .collect();
        let text = Snapshot::capture(&world, &queue, 9).to_text().unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# SNAPSHOT v1");
        assert!(lines.contains(&"seed=9"));
        assert!(lines.contains(&"depot=1,2,0"));
        assert!(lines.contains(&"customer 3 4 5 2 0 0 0 -1"));
        assert!(lines.contains(&"truck 1 0 0 1 5 0 0 0 0 0 0 0 2 C:3|D:1"));
        assert!(lines.contains(&"event 0.5 0 3 0"));
    }

    #[test]
    fn reads_core_only_snapshot() {
        let text = "\
# SNAPSHOT v1
# written by hand
time=2
seed=7
features=4
depot=1,1,0
customers=1
customer 2 3 0 1 5 0 0 -1
trucks=1
truck 1 1 1 2 10 0 1 0 0 0 1 0 1 C:2
some_future_line 1 2 3
events=0
";
        let snap: Snapshot = text.parse().unwrap();
        let world = &snap.world;
        assert_eq!(snap.seed, 7);
        assert_eq!(world.time(), 2.0);
        assert_eq!(world.features(), FeatureFlags::DYNAMIC);
        assert_eq!(world.customers()[0].release_time, 5.0);
        assert_eq!(world.trucks()[0].state, TruckState::Traveling);
        assert_eq!(
            world.trucks()[0].current_target(),
            Some(TargetRef::Customer(CustomerId(2)))
        );
        assert!(world.trucks()[0].active_target.is_none());
        assert_eq!(world.depot().candidate_stops().len(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        let bad_version = "# SNAPSHOT v2\ntime=0\n";
        assert!(matches!(
            bad_version.parse::<Snapshot>(),
            Err(SnapshotError::UnsupportedVersion(2))
        ));

        let bad_number = "time=abc\n";
        assert!(matches!(
            bad_number.parse::<Snapshot>(),
            Err(SnapshotError::Malformed { line: 1, .. })
        ));

        let short_plan = "trucks=1\ntruck 1 0 0 1 5 0 0 0 0 0 0 0 2 C:3\n";
        assert!(matches!(
            short_plan.parse::<Snapshot>(),
            Err(SnapshotError::Malformed { line: 2, .. })
        ));

        let missing_event = "events=2\nevent 1 0 2 0\n";
        assert!(matches!(
            missing_event.parse::<Snapshot>(),
            Err(SnapshotError::CountMismatch {
                section: "events",
                declared: 2,
                found: 1
            })
        ));

        let orphan = "leg 4 - 0 0 -1 - 0 0\n";
        assert!(matches!(
            orphan.parse::<Snapshot>(),
            Err(SnapshotError::OrphanLeg(TruckId(4)))
        ));
    }

    #[test]
    fn file_round_trip() {
        let sim = mid_run();
        let snap = Snapshot::capture(sim.world(), sim.queue(), 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.snapshot.txt");
        snap.write_to_file(&path).unwrap();
        assert_eq!(Snapshot::read_from_file(&path).unwrap(), snap);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), snap.to_text().unwrap());
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_reach_the_caller() {
        let sim = mid_run();
        let snap = Snapshot::capture(sim.world(), sim.queue(), 3);
        assert!(matches!(snap.write(&mut FullDisk), Err(SnapshotError::Io(_))));
    }
}
