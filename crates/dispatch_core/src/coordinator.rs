//! The dispatch coordinator: shared-state hub for matching, settlement, and
//! end-of-day synchronization.
//!
//! Lock layout, outermost first: the match gate serializes vehicle selection
//! and reservation; the settlement ledger guards earnings, profiles, the
//! tally, and the tracking log; the control log and the active-service
//! counter have their own finer locks. No lock is held across a suspension
//! point, and settlement never takes the match gate, so settling one trip
//! cannot block a concurrent match.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::PricingEngine;
use crate::error::DispatchError;
use crate::lock;
use crate::matching::{CandidateVehicle, RiderContext};
use crate::pricing::TariffKind;
use crate::records::ServiceRecord;
use crate::request::ServiceRequest;
use crate::spatial::round2;
use crate::tally::DailySummary;
use crate::vehicle::{spawn_vehicle_agent, Vehicle, VehicleSpec};

/// Tracking-log sample size per day.
const TRACKED_SERVICES_PER_DAY: usize = 5;

/// Platform share of every vehicle's earnings in the monthly summary.
const PLATFORM_CUT: f64 = 0.20;

/// Settlement-side ledgers: everything mutated when a trip completes.
#[derive(Default)]
struct Ledger {
    earnings_by_vehicle: HashMap<u64, f64>,
    daily_earnings: f64,
    tracking_log: Vec<ServiceRecord>,
    clients: crate::clients::ClientRegistry,
}

/// Submitted-but-unsettled request count plus the quiescence signal: one
/// permit is released each time the count returns to zero.
#[derive(Default)]
struct ActiveServices {
    count: u32,
    quiescence_permits: u32,
}

/// Read-only daily aggregate for the reporting layer.
#[derive(Debug, Clone, Serialize)]
pub struct DailySnapshot {
    pub day: u32,
    pub total_earnings: f64,
    pub tracked_services: Vec<ServiceRecord>,
}

/// Per-vehicle monthly totals with the platform split applied.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub vehicle_id: u64,
    pub name: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub total_earned: f64,
    pub platform_cut: f64,
    pub driver_share: f64,
}

pub struct Dispatcher {
    vehicles: RwLock<Vec<Arc<Vehicle>>>,
    engine: PricingEngine,
    match_gate: Mutex<()>,
    ledger: Mutex<Ledger>,
    control_log: Mutex<Vec<ServiceRecord>>,
    active: Mutex<ActiveServices>,
    quiescent: Condvar,
    current_day: AtomicU32,
    monitor_stop: Mutex<Option<Sender<()>>>,
    /// Handle to the owning `Arc`, for passing the dispatcher into agent
    /// and monitor threads from `&self` methods.
    self_handle: Weak<Dispatcher>,
}

impl Dispatcher {
    pub fn new(engine: PricingEngine) -> Arc<Self> {
        Arc::new_cyclic(|self_handle| Self {
            vehicles: RwLock::new(Vec::new()),
            engine,
            match_gate: Mutex::new(()),
            ledger: Mutex::new(Ledger::default()),
            control_log: Mutex::new(Vec::new()),
            active: Mutex::new(ActiveServices::default()),
            quiescent: Condvar::new(),
            current_day: AtomicU32::new(1),
            monitor_stop: Mutex::new(None),
            self_handle: self_handle.clone(),
        })
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    pub fn current_day(&self) -> u32 {
        self.current_day.load(Ordering::Relaxed)
    }

    /// Adds an existing vehicle to the roster without starting an agent
    /// thread; callers drive its state machine themselves (tests, custom
    /// runtimes).
    pub fn add_vehicle(&self, vehicle: Arc<Vehicle>) {
        write(&self.vehicles).push(vehicle);
    }

    /// Creates the vehicle, adds it to the roster, and spawns its agent
    /// thread. Re-registering an id already on the roster returns the
    /// existing vehicle, so daily roster loads stay idempotent.
    pub fn register_vehicle(&self, spec: VehicleSpec) -> Arc<Vehicle> {
        if let Some(existing) = read(&self.vehicles)
            .iter()
            .find(|vehicle| vehicle.id == spec.id)
        {
            return existing.clone();
        }
        let vehicle = Vehicle::new(spec);
        self.add_vehicle(vehicle.clone());
        if let Some(dispatcher) = self.self_handle.upgrade() {
            spawn_vehicle_agent(vehicle.clone(), dispatcher);
        }
        info!("vehicle {} ({}) joined the roster", vehicle.id, vehicle.name);
        vehicle
    }

    /// Snapshot of the current roster.
    pub fn vehicles(&self) -> Vec<Arc<Vehicle>> {
        read(&self.vehicles).clone()
    }

    /// Registers an affiliated client under a display name.
    pub fn register_affiliated_client(&self, id: &str, name: &str) {
        lock(&self.ledger).clients.register(id, name);
    }

    /// Stars of a client profile, if one exists yet.
    pub fn client_stars(&self, id: &str) -> Option<u8> {
        lock(&self.ledger).clients.get(id).map(|profile| profile.stars)
    }

    /// Entry point for request agents: bumps the active-service counter and
    /// runs the match step. Never blocks the caller beyond lock contention;
    /// the trip itself executes asynchronously on the vehicle agent.
    pub fn submit(&self, request: ServiceRequest) {
        {
            let mut active = lock(&self.active);
            active.count += 1;
            debug!("service activated, {} in flight", active.count);
        }

        if let Err((request, err)) = self.match_request(request) {
            warn!("{err}");
            self.log_control(rejected_record(&request));
            self.finish_service();
        }
    }

    /// Critical section: at most one match computation runs at a time, and
    /// choosing the winner and flipping it unavailable happen as one atomic
    /// step under the match gate.
    fn match_request(
        &self,
        mut request: ServiceRequest,
    ) -> Result<Arc<Vehicle>, (ServiceRequest, DispatchError)> {
        let _gate = lock(&self.match_gate);

        let vehicles = read(&self.vehicles).clone();
        let candidates: Vec<CandidateVehicle> = vehicles
            .iter()
            .enumerate()
            .map(|(index, vehicle)| {
                let state = vehicle.state();
                CandidateVehicle {
                    index,
                    available: state.available,
                    position: state.position,
                    rating: state.rating,
                    trips_today: state.trips_today,
                    rest_secs: state.rest_secs(),
                }
            })
            .collect();

        let stars = lock(&self.ledger)
            .clients
            .get_or_create(&request.client_id)
            .stars;
        let rider = RiderContext {
            client_id: request.client_id.clone(),
            origin: request.origin,
            stars,
        };

        let Some(result) = self.engine.select_vehicle(&rider, &candidates) else {
            let err = DispatchError::NoVehicleAvailable {
                client_id: request.client_id.clone(),
            };
            return Err((request, err));
        };

        let vehicle = vehicles[result.vehicle_index].clone();
        request.tariff = Some((result.tariff, result.tariff_kind));
        request.selected_by = Some(result.reason);
        info!(
            "vehicle {} assigned to client {} ({:.2} km away, {})",
            vehicle.id,
            request.client_id,
            result.distance_km,
            result.reason.as_str()
        );
        vehicle.assign(request);
        Ok(vehicle)
    }

    /// Settles one completed trip: vehicle rating and earnings, the
    /// per-vehicle and daily ledgers, the client profile, both logs, then
    /// the active-service counter. Invoked exactly once per trip by the
    /// owning vehicle agent.
    pub fn settle_trip(
        &self,
        vehicle: &Vehicle,
        request: &ServiceRequest,
        total_km: f64,
        fare: f64,
        tariff_kind: TariffKind,
        rating: f64,
    ) {
        {
            let mut ledger = lock(&self.ledger);

            let trips_today = {
                let mut state = vehicle.state();
                state.apply_rating(rating);
                state.earnings += fare;
                state.trips_today += 1;
                state.trips_today
            };

            *ledger.earnings_by_vehicle.entry(vehicle.id).or_insert(0.0) += fare;
            ledger.daily_earnings += fare;

            let (client_name, client_stars) = {
                let profile = ledger.clients.get_or_create(&request.client_id);
                profile.record_trip(rating);
                (profile.name.clone(), profile.stars)
            };

            self.engine.record_trip(
                fare,
                tariff_kind,
                &vehicle.name,
                trips_today,
                &client_name,
                client_stars,
            );

            if ledger.tracking_log.len() < TRACKED_SERVICES_PER_DAY {
                ledger
                    .tracking_log
                    .push(accepted_record(request, vehicle.id, total_km, fare, rating));
            }
        }

        self.log_control(accepted_record(request, vehicle.id, total_km, fare, rating));
        self.finish_service();
    }

    /// Decrements the active counter; releases one quiescence permit when
    /// the counter returns to zero.
    fn finish_service(&self) {
        let mut active = lock(&self.active);
        active.count = active.count.saturating_sub(1);
        debug!("service finished, {} in flight", active.count);
        if active.count == 0 {
            active.quiescence_permits += 1;
            self.quiescent.notify_all();
        }
    }

    /// Blocks until the active-service counter next returns to zero,
    /// consuming one quiescence permit. Day-boundary callers use this to
    /// know no requests are in flight.
    pub fn end_of_day_barrier(&self) {
        let mut active = lock(&self.active);
        while active.quiescence_permits == 0 {
            active = self
                .quiescent
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        active.quiescence_permits -= 1;
    }

    /// Requests currently submitted but not yet settled or rejected.
    pub fn active_services(&self) -> u32 {
        lock(&self.active).count
    }

    fn log_control(&self, record: ServiceRecord) {
        lock(&self.control_log).push(record);
    }

    /// Snapshot of the unbounded control log.
    pub fn control_log(&self) -> Vec<ServiceRecord> {
        lock(&self.control_log).clone()
    }

    /// Read-only aggregation: the daily snapshot and the per-vehicle
    /// monthly summaries with the 80/20 split applied.
    pub fn reports(&self) -> (DailySnapshot, Vec<MonthlySummary>) {
        let (daily_earnings, tracked, earnings_by_vehicle) = {
            let ledger = lock(&self.ledger);
            (
                ledger.daily_earnings,
                ledger.tracking_log.clone(),
                ledger.earnings_by_vehicle.clone(),
            )
        };

        let daily = DailySnapshot {
            day: self.current_day(),
            total_earnings: round2(daily_earnings),
            tracked_services: tracked,
        };

        let monthly = read(&self.vehicles)
            .iter()
            .map(|vehicle| {
                let lifetime = vehicle.state().earnings;
                MonthlySummary {
                    vehicle_id: vehicle.id,
                    name: vehicle.name.clone(),
                    plate: vehicle.plate.clone(),
                    brand: vehicle.brand.clone(),
                    model: vehicle.model.clone(),
                    total_earned: round2(
                        earnings_by_vehicle.get(&vehicle.id).copied().unwrap_or(0.0),
                    ),
                    platform_cut: round2(lifetime * PLATFORM_CUT),
                    driver_share: round2(lifetime * (1.0 - PLATFORM_CUT)),
                }
            })
            .collect();

        (daily, monthly)
    }

    /// Archived end-of-day summaries from the engine's rollover history.
    pub fn daily_history(&self) -> Vec<DailySummary> {
        self.engine.history()
    }

    /// Rotates the coordinator onto a new roster day: resets the daily
    /// earnings figure and the tracking-log sample.
    pub fn start_new_day(&self, day: u32) {
        self.current_day.store(day, Ordering::Relaxed);
        let mut ledger = lock(&self.ledger);
        ledger.daily_earnings = 0.0;
        ledger.tracking_log.clear();
    }

    /// Starts the hour-boundary timer task: sleeps until the next virtual
    /// hour, then refreshes the tariff band and rolls the day over when
    /// due. Returns the join handle; [Dispatcher::stop_monitor] ends it.
    pub fn spawn_hour_monitor(&self) -> JoinHandle<()> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        *lock(&self.monitor_stop) = Some(stop_tx);
        let handle = self.self_handle.clone();
        thread::spawn(move || loop {
            // Weak handle: the monitor dies with the dispatcher.
            let Some(dispatcher) = handle.upgrade() else { break };
            let wait = dispatcher.engine.clock().wall_until_next_hour();
            drop(dispatcher);
            match stop_rx.recv_timeout(wait) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    let Some(dispatcher) = handle.upgrade() else { break };
                    dispatcher.on_hour_boundary();
                }
            }
        })
    }

    /// Signals the hour monitor to exit.
    pub fn stop_monitor(&self) {
        if let Some(stop) = lock(&self.monitor_stop).take() {
            let _ = stop.send(());
        }
    }

    /// Tariff switching and daily rollover, driven by the virtual clock.
    /// Normally invoked by the hour monitor on boundary crossings.
    pub fn on_hour_boundary(&self) {
        let hour = self.engine.clock().hour_of_day();
        self.engine.refresh_tariff_mode(hour);
        if self.engine.rollover_if_due(hour) {
            // New virtual day: clear every vehicle's daily trip counter.
            // Rest counters are wall-clock-derived and stay untouched.
            for vehicle in read(&self.vehicles).iter() {
                vehicle.state().trips_today = 0;
            }
        }
    }
}

fn accepted_record(
    request: &ServiceRequest,
    vehicle_id: u64,
    km: f64,
    fare: f64,
    rating: f64,
) -> ServiceRecord {
    ServiceRecord {
        day: request.day,
        vehicle_id: Some(vehicle_id),
        client_id: request.client_id.clone(),
        origin: request.origin,
        destination: request.destination,
        origin_address: request.origin_address.clone(),
        destination_address: request.destination_address.clone(),
        km: round2(km),
        fare,
        rating: Some(rating),
        accepted: true,
        selected_by: request.selected_by,
    }
}

fn rejected_record(request: &ServiceRequest) -> ServiceRecord {
    ServiceRecord {
        day: request.day,
        vehicle_id: None,
        client_id: request.client_id.clone(),
        origin: request.origin,
        destination: request.destination,
        origin_address: request.origin_address.clone(),
        destination_address: request.destination_address.clone(),
        km: 0.0,
        fare: 0.0,
        rating: None,
        accepted: false,
        selected_by: None,
    }
}

fn read<T>(rwlock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}
