//! Builders for tests: rosters, candidates, and dispatchers without
//! boilerplate.

use std::sync::Arc;

use crate::clock::{VirtualClock, SECS_PER_HOUR};
use crate::coordinator::Dispatcher;
use crate::engine::PricingEngine;
use crate::matching::{CandidateVehicle, RiderContext, SelectionPolicyKind};
use crate::pricing::TariffSchedule;
use crate::spatial::Point;
use crate::vehicle::{Vehicle, VehicleSpec};

pub fn vehicle_spec(id: u64, name: &str, x: f64, y: f64) -> VehicleSpec {
    VehicleSpec {
        id,
        name: name.to_string(),
        plate: format!("TEST-{id:03}"),
        brand: "Test".to_string(),
        model: "Cab".to_string(),
        // High enough that simulated legs sit at the minimum duration.
        speed_kmh: 100_000.0,
        position: Point::new(x, y),
        available: true,
    }
}

pub fn vehicle_at(id: u64, x: f64, y: f64) -> Arc<Vehicle> {
    Vehicle::new(vehicle_spec(id, &format!("driver-{id}"), x, y))
}

pub fn candidate(index: usize, x: f64, y: f64) -> CandidateVehicle {
    CandidateVehicle {
        index,
        available: true,
        position: Point::new(x, y),
        rating: 5.0,
        trips_today: 0,
        rest_secs: 3600.0,
    }
}

pub fn rider(client_id: &str, x: f64, y: f64) -> RiderContext {
    RiderContext {
        client_id: client_id.to_string(),
        origin: Point::new(x, y),
        stars: 1,
    }
}

/// A dispatcher whose virtual clock is pinned to `epoch_hour` with a fast
/// multiplier, using the default tariff schedule and the nearest policy.
pub fn dispatcher_at_hour(epoch_hour: u8) -> Arc<Dispatcher> {
    dispatcher_at_hour_with_policy(epoch_hour, SelectionPolicyKind::Nearest)
}

pub fn dispatcher_at_hour_with_policy(
    epoch_hour: u8,
    policy: SelectionPolicyKind,
) -> Arc<Dispatcher> {
    let clock = VirtualClock::with_epoch(epoch_hour as u64 * SECS_PER_HOUR, 600.0);
    Dispatcher::new(PricingEngine::new(
        clock,
        TariffSchedule::default(),
        policy,
    ))
}
