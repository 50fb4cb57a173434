//! Vehicle agents: one thread per taxi running the trip state machine.
//!
//! The agent suspends on its wake channel while idle and on simulated travel
//! legs while driving; it never busy-waits. The coordinator's match lock is
//! the only gate that assigns work, so the agent itself takes no extra lock
//! in [Vehicle::assign].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coordinator::Dispatcher;
use crate::pricing;
use crate::request::ServiceRequest;
use crate::spatial::{distance_between, Point};

/// Fallback speed applied when a roster record carries a non-positive one.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Wall-clock scale applied to computed travel times.
const TRAVEL_TIME_SCALE: f64 = 0.05;

/// Travel legs never complete faster than this, so trips stay observable.
const MIN_LEG_SECS: f64 = 0.2;

/// Rest credit granted to a vehicle that has not driven yet.
const INITIAL_REST_SECS: f64 = 3600.0;

/// Client ratings are drawn uniformly from this range.
const RATING_RANGE: std::ops::RangeInclusive<u32> = 3..=5;

/// Trip state machine phases:
/// `Idle → Assigned → EnRouteToPickup → Transporting → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehiclePhase {
    Idle,
    Assigned,
    EnRouteToPickup,
    Transporting,
}

/// Fixed identity of a roster vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    pub id: u64,
    pub name: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub speed_kmh: f64,
    pub position: Point,
    /// Initial on-shift flag from the roster; off-shift vehicles sit in the
    /// roster but are never matched.
    pub available: bool,
}

/// Mutable vehicle state, guarded by the vehicle's own mutex. The
/// coordinator reads it and flips availability under the match lock; the
/// agent thread owns it through the rest of the trip lifecycle.
#[derive(Debug)]
pub struct VehicleState {
    pub position: Point,
    pub available: bool,
    pub phase: VehiclePhase,
    pub rating: f64,
    pub trips_total: u64,
    pub trips_today: u32,
    pub earnings: f64,
    last_trip_completed: Option<Instant>,
}

impl VehicleState {
    /// Seconds since the last trip settled. Fresh vehicles report a full
    /// hour so the rest term of their fitness score starts saturated.
    pub fn rest_secs(&self) -> f64 {
        match self.last_trip_completed {
            Some(at) => at.elapsed().as_secs_f64(),
            None => INITIAL_REST_SECS,
        }
    }

    /// Folds a new trip rating into the running mean.
    pub fn apply_rating(&mut self, rating: f64) {
        self.trips_total += 1;
        self.rating =
            (self.rating * (self.trips_total - 1) as f64 + rating) / self.trips_total as f64;
    }

    /// Restarts the rest counter. Called when a trip completes; rollover
    /// never touches this, rest time is wall-clock-derived.
    pub fn mark_rested(&mut self) {
        self.last_trip_completed = Some(Instant::now());
    }
}

pub struct Vehicle {
    pub id: u64,
    pub name: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    speed_kmh: f64,
    state: Mutex<VehicleState>,
    trip_tx: Sender<ServiceRequest>,
    trip_rx: Receiver<ServiceRequest>,
}

impl Vehicle {
    pub fn new(spec: VehicleSpec) -> Arc<Self> {
        let speed_kmh = if spec.speed_kmh > 0.0 {
            spec.speed_kmh
        } else {
            warn!(
                "vehicle {} configured with speed {} km/h, using {} km/h",
                spec.id, spec.speed_kmh, DEFAULT_SPEED_KMH
            );
            DEFAULT_SPEED_KMH
        };
        let (trip_tx, trip_rx) = unbounded();
        Arc::new(Self {
            id: spec.id,
            name: spec.name,
            plate: spec.plate,
            brand: spec.brand,
            model: spec.model,
            speed_kmh,
            state: Mutex::new(VehicleState {
                position: spec.position,
                available: spec.available,
                phase: VehiclePhase::Idle,
                rating: 5.0,
                trips_total: 0,
                trips_today: 0,
                earnings: 0.0,
                last_trip_completed: None,
            }),
            trip_tx,
            trip_rx,
        })
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Locks and returns the mutable state.
    pub fn state(&self) -> MutexGuard<'_, VehicleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands a request to this vehicle and wakes its agent. Callable only
    /// under the coordinator's match lock, which keeps two requests off the
    /// same idle vehicle; the send itself never blocks.
    pub fn assign(&self, request: ServiceRequest) {
        {
            let mut state = self.state();
            state.available = false;
            state.phase = VehiclePhase::Assigned;
        }
        let _ = self.trip_tx.send(request);
    }

    /// Wall-clock duration of one travel leg at this vehicle's speed, plus
    /// the leg distance in kilometers.
    pub fn travel_time(&self, from: Point, to: Point) -> (Duration, f64) {
        let km = distance_between(from, to);
        let secs = km / self.speed_kmh * 3600.0;
        let scaled = (secs * TRAVEL_TIME_SCALE).max(MIN_LEG_SECS);
        (Duration::from_secs_f64(scaled), km)
    }

    /// Blocks until the next assignment arrives. Used by tests that drive
    /// the state machine without a spawned agent thread.
    pub fn next_assignment(&self) -> Option<ServiceRequest> {
        self.trip_rx.recv().ok()
    }
}

/// Spawns the agent thread for `vehicle`: wait for an assignment, drive
/// both legs, settle with the coordinator, go idle again.
pub fn spawn_vehicle_agent(vehicle: Arc<Vehicle>, dispatcher: Arc<Dispatcher>) -> JoinHandle<()> {
    let rx = vehicle.trip_rx.clone();
    thread::spawn(move || {
        let mut rng = StdRng::from_entropy();
        while let Ok(request) = rx.recv() {
            run_trip(&vehicle, &dispatcher, request, &mut rng);
        }
    })
}

fn run_trip(vehicle: &Vehicle, dispatcher: &Dispatcher, request: ServiceRequest, rng: &mut StdRng) {
    let start = {
        let mut state = vehicle.state();
        state.phase = VehiclePhase::EnRouteToPickup;
        state.position
    };

    let (to_pickup, km_to_pickup) = vehicle.travel_time(start, request.origin);
    debug!(
        "vehicle {} en route to pickup for client {} ({km_to_pickup:.2} km)",
        vehicle.id, request.client_id
    );
    thread::sleep(to_pickup);

    vehicle.state().phase = VehiclePhase::Transporting;
    let (to_destination, km_trip) = vehicle.travel_time(request.origin, request.destination);
    thread::sleep(to_destination);

    // Price with the tariff captured at match time; fall back to the band
    // currently in force if the request carries none.
    let (tariff, kind) = request
        .tariff
        .unwrap_or_else(|| dispatcher.engine().current_tariff());
    let fare = pricing::fare(tariff, km_trip);
    let rating = rng.gen_range(RATING_RANGE) as f64;
    let total_km = km_to_pickup + km_trip;

    vehicle.state().position = request.destination;
    info!(
        "vehicle {} completed trip for client {} ({total_km:.2} km, fare {fare:.2})",
        vehicle.id, request.client_id
    );

    dispatcher.settle_trip(vehicle, &request, total_km, fare, kind, rating);

    let mut state = vehicle.state();
    state.phase = VehiclePhase::Idle;
    state.available = true;
    state.mark_rested();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Point;

    fn spec(id: u64, speed_kmh: f64) -> VehicleSpec {
        VehicleSpec {
            id,
            name: format!("driver-{id}"),
            plate: format!("PL-{id:03}"),
            brand: "Brand".to_string(),
            model: "Model".to_string(),
            speed_kmh,
            position: Point::new(0.0, 0.0),
            available: true,
        }
    }

    #[test]
    fn non_positive_speed_is_coerced_to_the_default() {
        let vehicle = Vehicle::new(spec(1, 0.0));
        assert_eq!(vehicle.speed_kmh(), DEFAULT_SPEED_KMH);
        let vehicle = Vehicle::new(spec(2, -5.0));
        assert_eq!(vehicle.speed_kmh(), DEFAULT_SPEED_KMH);
        let vehicle = Vehicle::new(spec(3, 55.0));
        assert_eq!(vehicle.speed_kmh(), 55.0);
    }

    #[test]
    fn travel_time_has_a_floor() {
        let vehicle = Vehicle::new(spec(1, 50.0));
        let (duration, km) = vehicle.travel_time(Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        assert_eq!(km, 0.0);
        assert_eq!(duration, Duration::from_secs_f64(0.2));
    }

    #[test]
    fn travel_time_scales_with_distance_and_speed() {
        let vehicle = Vehicle::new(spec(1, 50.0));
        let (duration, km) = vehicle.travel_time(Point::new(0.0, 0.0), Point::new(0.0, 100.0));
        assert_eq!(km, 100.0);
        // 100 km at 50 km/h is 7200 s, scaled down to 360 s.
        assert_eq!(duration, Duration::from_secs_f64(360.0));
    }

    #[test]
    fn assign_flips_availability_and_queues_the_request() {
        let vehicle = Vehicle::new(spec(1, 50.0));
        assert!(vehicle.state().available);
        let request = ServiceRequest::new("c-1", Point::new(1.0, 1.0), Point::new(2.0, 2.0), 1);
        vehicle.assign(request);
        {
            let state = vehicle.state();
            assert!(!state.available);
            assert_eq!(state.phase, VehiclePhase::Assigned);
        }
        let queued = vehicle.next_assignment().expect("queued request");
        assert_eq!(queued.client_id, "c-1");
    }

    #[test]
    fn rating_mean_folds_incrementally() {
        let vehicle = Vehicle::new(spec(1, 50.0));
        {
            let mut state = vehicle.state();
            state.apply_rating(3.0);
            state.apply_rating(5.0);
        }
        let state = vehicle.state();
        assert_eq!(state.trips_total, 2);
        // First rating replaces the seeded 5.0 mean, second folds in.
        assert_eq!(state.rating, 4.0);
    }
}
