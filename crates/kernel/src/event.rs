//! Simulation events and the time-ordered queue they are appended to.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{CustomerId, StopId, TargetRef, TruckId};

/// Event vocabulary. Numeric codes are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `a` = customer id.
    CustomerReleased,
    /// `a` = truck id, `b` = target id.
    TruckArrived,
    /// `a` = depot stop id.
    DepotArrived,
    /// `a` = truck id, `b` = battery level rounded to an integer.
    TruckEnergyChanged,
    /// `a` = truck id, `b` = customer id.
    CustomerServed,
    /// Reserved; nothing emits it yet.
    CustomerInserted,
    /// Reserved; nothing emits it yet.
    ReplanRequested,
}

impl EventKind {
    pub fn code(self) -> u8 {
        match self {
            Self::CustomerReleased => 0,
            Self::TruckArrived => 1,
            Self::DepotArrived => 2,
            Self::TruckEnergyChanged => 3,
            Self::CustomerServed => 4,
            Self::CustomerInserted => 10,
            Self::ReplanRequested => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::CustomerReleased),
            1 => Some(Self::TruckArrived),
            2 => Some(Self::DepotArrived),
            3 => Some(Self::TruckEnergyChanged),
            4 => Some(Self::CustomerServed),
            10 => Some(Self::CustomerInserted),
            11 => Some(Self::ReplanRequested),
            _ => None,
        }
    }
}

/// An immutable event record: timestamp, kind and two kind-specific slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub time: f32,
    pub kind: EventKind,
    pub a: i64,
    pub b: i64,
}

impl SimEvent {
    pub fn new(time: f32, kind: EventKind, a: i64, b: i64) -> Self {
        Self { time, kind, a, b }
    }

    pub(crate) fn customer_released(time: f32, customer: CustomerId) -> Self {
        Self::new(time, EventKind::CustomerReleased, customer.0.into(), 0)
    }

    pub(crate) fn truck_arrived(time: f32, truck: TruckId, target: TargetRef) -> Self {
        Self::new(time, EventKind::TruckArrived, truck.0.into(), target.id().into())
    }

    pub(crate) fn depot_arrived(time: f32, stop: StopId) -> Self {
        Self::new(time, EventKind::DepotArrived, stop.0.into(), 0)
    }

    pub(crate) fn truck_energy_changed(time: f32, truck: TruckId, battery: f32) -> Self {
        Self::new(
            time,
            EventKind::TruckEnergyChanged,
            truck.0.into(),
            battery.round_ties_even() as i64,
        )
    }

    pub(crate) fn customer_served(time: f32, truck: TruckId, customer: CustomerId) -> Self {
        Self::new(time, EventKind::CustomerServed, truck.0.into(), customer.0.into())
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {:?} (a={}, b={})", self.time, self.kind, self.a, self.b)
    }
}

/// Events in ascending time order.
///
/// Insertion is stable: an event goes after every queued event with an
/// equal timestamp. Single writer (the engine); readers take copies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    events: VecDeque<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: SimEvent) {
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
    }

    pub fn peek_earliest(&self) -> Option<&SimEvent> {
        self.events.front()
    }

    pub fn pop_earliest(&mut self) -> Option<SimEvent> {
        self.events.pop_front()
    }

    /// Order-preserving copy of the whole queue. The queue is not modified.
    pub fn drain_to_vec(&self) -> Vec<SimEvent> {
        self.events.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of queued events of `kind`.
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

impl FromIterator<SimEvent> for EventQueue {
    fn from_iter<I: IntoIterator<Item = SimEvent>>(iter: I) -> Self {
        let mut queue = Self::new();
        for event in iter {
            queue.enqueue(event);
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(time: f32, a: i64) -> SimEvent {
        SimEvent::new(time, EventKind::CustomerReleased, a, 0)
    }

    #[test]
    fn event_codes_are_stable() {
        let kinds = [
            (EventKind::CustomerReleased, 0),
            (EventKind::TruckArrived, 1),
            (EventKind::DepotArrived, 2),
            (EventKind::TruckEnergyChanged, 3),
            (EventKind::CustomerServed, 4),
            (EventKind::CustomerInserted, 10),
            (EventKind::ReplanRequested, 11),
        ];
        for (kind, code) in kinds {
            assert_eq!(kind.code(), code);
            assert_eq!(EventKind::from_code(code), Some(kind));
        }
        assert_eq!(EventKind::from_code(5), None);
    }

    #[test]
    fn enqueue_orders_by_time() {
        let mut q = EventQueue::new();
        q.enqueue(ev(3.0, 1));
        q.enqueue(ev(1.0, 2));
        q.enqueue(ev(2.0, 3));
        let times: Vec<f32> = q.drain_to_vec().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut q = EventQueue::new();
        q.enqueue(ev(1.0, 1));
        q.enqueue(ev(0.5, 0));
        q.enqueue(ev(1.0, 2));
        q.enqueue(ev(1.0, 3));
        let order: Vec<i64> = q.drain_to_vec().iter().map(|e| e.a).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn peek_and_pop_earliest() {
        let mut q = EventQueue::new();
        assert!(q.peek_earliest().is_none());
        assert!(q.pop_earliest().is_none());

        q.enqueue(ev(2.0, 2));
        q.enqueue(ev(1.0, 1));
        assert_eq!(q.peek_earliest().map(|e| e.a), Some(1));
        assert_eq!(q.pop_earliest().map(|e| e.a), Some(1));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn drain_to_vec_does_not_mutate() {
        let mut q = EventQueue::new();
        q.enqueue(ev(1.0, 1));
        let copy = q.drain_to_vec();
        assert_eq!(copy.len(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn no_deduplication() {
        let q: EventQueue = [ev(1.0, 7), ev(1.0, 7)].into_iter().collect();
        assert_eq!(q.len(), 2);
        assert_eq!(q.count_kind(EventKind::CustomerReleased), 2);
    }

    #[test]
    fn energy_event_rounds_battery() {
        let e = SimEvent::truck_energy_changed(1.0, TruckId(4), 69.6);
        assert_eq!((e.a, e.b), (4, 70));
        let half_down = SimEvent::truck_energy_changed(1.0, TruckId(4), 68.5);
        assert_eq!(half_down.b, 68);
        let half_up = SimEvent::truck_energy_changed(1.0, TruckId(4), 69.5);
        assert_eq!(half_up.b, 70);
    }
}
