//! Diagnostic consistency checks, run after each step when enabled.
//!
//! Kept apart from the engine so the pass can be switched off without
//! touching stepping logic. A violation here is a bug in the engine or in
//! an external actor, never a user error.

use crate::model::{CustomerId, CustomerStatus, TruckId, TruckState};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("truck {truck} load {load} exceeds capacity {capacity}")]
    LoadOverCapacity {
        truck: TruckId,
        load: u32,
        capacity: u32,
    },
    #[error("truck {truck} battery {battery} outside [0, {capacity}]")]
    BatteryOutOfRange {
        truck: TruckId,
        battery: f32,
        capacity: f32,
    },
    #[error("truck {truck} is servicing without a customer")]
    ServicingWithoutCustomer { truck: TruckId },
    #[error("customer {customer} is in service with {servicers} servicing trucks")]
    ServicerCount {
        customer: CustomerId,
        servicers: usize,
    },
    #[error("truck {truck} cursor {index} outside plan of length {len}")]
    CursorOutOfRange {
        truck: TruckId,
        index: usize,
        len: usize,
    },
}

/// Every violation present in `world`, trucks first, then customers.
pub fn violations(world: &World) -> Vec<InvariantViolation> {
    let mut found = Vec::new();

    for truck in world.trucks() {
        if truck.capacity > 0 && truck.load > truck.capacity {
            found.push(InvariantViolation::LoadOverCapacity {
                truck: truck.id,
                load: truck.load,
                capacity: truck.capacity,
            });
        }
        if truck.battery_capacity > 0.0
            && !(0.0..=truck.battery_capacity).contains(&truck.battery)
        {
            found.push(InvariantViolation::BatteryOutOfRange {
                truck: truck.id,
                battery: truck.battery,
                capacity: truck.battery_capacity,
            });
        }
        if truck.state == TruckState::Servicing && truck.servicing_customer.is_none() {
            found.push(InvariantViolation::ServicingWithoutCustomer { truck: truck.id });
        }
        if truck.current_target_index > truck.plan.len() {
            found.push(InvariantViolation::CursorOutOfRange {
                truck: truck.id,
                index: truck.current_target_index,
                len: truck.plan.len(),
            });
        }
    }

    for customer in world.customers() {
        if customer.status != CustomerStatus::InService {
            continue;
        }
        let servicers = world
            .trucks()
            .iter()
            .filter(|t| {
                t.state == TruckState::Servicing && t.servicing_customer == Some(customer.id)
            })
            .count();
        if servicers != 1 {
            found.push(InvariantViolation::ServicerCount {
                customer: customer.id,
                servicers,
            });
        }
    }

    found
}

/// `Ok` when the world is consistent, otherwise the first violation.
pub fn check(world: &World) -> Result<(), InvariantViolation> {
    match violations(world).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, DepotCarrier, DepotNodeId, TargetRef, Truck};
    use fleetsim_common::Vec2;

    fn world_with_truck(truck: Truck) -> World {
        let mut world = World::new(10, DepotCarrier::new(Vec2::ZERO, 0.0));
        world.add_truck(truck);
        world
    }

    #[test]
    fn consistent_world_passes() {
        let world = world_with_truck(Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0));
        assert_eq!(check(&world), Ok(()));
    }

    #[test]
    fn detects_overload_and_bad_cursor() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0)
            .with_plan(vec![TargetRef::Depot(DepotNodeId(1))]);
        truck.load = 11;
        truck.current_target_index = 3;
        let found = violations(&world_with_truck(truck));
        assert_eq!(found.len(), 2);
        assert!(matches!(found[0], InvariantViolation::LoadOverCapacity { load: 11, .. }));
        assert!(matches!(found[1], InvariantViolation::CursorOutOfRange { index: 3, len: 1, .. }));
    }

    #[test]
    fn uncapacitated_truck_may_carry_anything() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 0, 1.0);
        truck.load = 1_000;
        assert!(check(&world_with_truck(truck)).is_ok());
    }

    #[test]
    fn detects_servicing_without_customer() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0);
        truck.state = TruckState::Servicing;
        assert_eq!(
            check(&world_with_truck(truck)),
            Err(InvariantViolation::ServicingWithoutCustomer { truck: TruckId(1) })
        );
    }

    #[test]
    fn in_service_customer_needs_exactly_one_servicer() {
        let mut world = world_with_truck(Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0));
        world.add_customer(
            Customer::new(CustomerId(5), Vec2::ONE, 1, 0.0).with_status(CustomerStatus::InService),
        );
        assert_eq!(
            check(&world),
            Err(InvariantViolation::ServicerCount {
                customer: CustomerId(5),
                servicers: 0
            })
        );

        for truck in world.trucks_mut() {
            truck.state = TruckState::Servicing;
            truck.servicing_customer = Some(CustomerId(5));
        }
        assert_eq!(check(&world), Ok(()));

        let mut second = Truck::new(TruckId(2), Vec2::ZERO, 10, 1.0);
        second.state = TruckState::Servicing;
        second.servicing_customer = Some(CustomerId(5));
        world.add_truck(second);
        assert!(matches!(
            check(&world),
            Err(InvariantViolation::ServicerCount { servicers: 2, .. })
        ));
    }

    #[test]
    fn detects_battery_overflow() {
        let mut truck = Truck::new(TruckId(1), Vec2::ZERO, 10, 1.0).with_battery(50.0, 1.0);
        truck.battery = 60.0;
        assert!(matches!(
            check(&world_with_truck(truck)),
            Err(InvariantViolation::BatteryOutOfRange { .. })
        ));
    }
}
