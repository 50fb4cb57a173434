//! End-to-end coordinator flows: matching, settlement, rejection, and
//! day-boundary synchronization.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::geocode::{AddressResolver, HashGeocoder};
use dispatch_core::pricing::{fare, TariffKind};
use dispatch_core::request::{spawn_request_agent, RideAsk, ServiceRequest};
use dispatch_core::spatial::Point;
use dispatch_core::test_helpers::{dispatcher_at_hour, vehicle_at, vehicle_spec};
use dispatch_core::vehicle::VehiclePhase;

#[test]
fn nearest_vehicle_wins_and_settlement_round_trips() {
    let dispatcher = dispatcher_at_hour(12);
    let v1 = vehicle_at(1, 0.0, 0.0);
    let v2 = vehicle_at(2, 5.0, 5.0);
    let v3 = vehicle_at(3, 10.0, 0.0);
    dispatcher.add_vehicle(v1.clone());
    dispatcher.add_vehicle(v2.clone());
    dispatcher.add_vehicle(v3.clone());

    dispatcher.submit(ServiceRequest::new(
        "c-1",
        Point::new(0.0, 1.0),
        Point::new(0.0, 6.0),
        1,
    ));

    assert_eq!(dispatcher.active_services(), 1);
    assert!(!v1.state().available, "nearest vehicle must be reserved");
    assert!(v2.state().available);
    assert!(v3.state().available);

    let request = v1.next_assignment().expect("assignment");
    let (tariff, kind) = request.tariff.expect("captured tariff");
    assert_eq!(kind, TariffKind::Normal);
    let trip_fare = fare(tariff, 5.0);
    assert_eq!(trip_fare, 5.5);

    dispatcher.settle_trip(&v1, &request, 6.0, trip_fare, kind, 4.0);
    assert_eq!(dispatcher.active_services(), 0);
    v1.state().available = true; // the agent loop does this after settling

    // One quiescence permit from the zero transition.
    dispatcher.end_of_day_barrier();

    let control = dispatcher.control_log();
    assert_eq!(control.len(), 1);
    assert!(control[0].accepted);
    assert_eq!(control[0].vehicle_id, Some(1));

    let (daily, monthly) = dispatcher.reports();
    assert_eq!(daily.total_earnings, 5.5);
    assert_eq!(daily.tracked_services.len(), 1);
    let row = monthly
        .iter()
        .find(|summary| summary.vehicle_id == 1)
        .expect("monthly row");
    assert_eq!(row.total_earned, 5.5);
    assert_eq!(row.platform_cut, 1.1);
    assert_eq!(row.driver_share, 4.4);
}

#[test]
fn requests_beyond_fleet_capacity_are_rejected() {
    let dispatcher = dispatcher_at_hour(12);
    let v1 = vehicle_at(1, 0.0, 0.0);
    dispatcher.add_vehicle(v1.clone());

    dispatcher.submit(ServiceRequest::new(
        "c-1",
        Point::new(0.0, 1.0),
        Point::new(3.0, 3.0),
        1,
    ));
    dispatcher.submit(ServiceRequest::new(
        "c-2",
        Point::new(0.0, 2.0),
        Point::new(4.0, 4.0),
        1,
    ));

    // Only the rejection is logged at submit time; the accepted trip logs
    // at settlement.
    let control = dispatcher.control_log();
    assert_eq!(control.len(), 1);
    assert!(!control[0].accepted);
    assert_eq!(control[0].client_id, "c-2");
    assert_eq!(control[0].vehicle_id, None);
    assert!(control[0].rating.is_none());
    assert_eq!(dispatcher.active_services(), 1);
}

#[test]
fn fare_uses_the_tariff_captured_at_match_time() {
    let dispatcher = dispatcher_at_hour(20);
    let v1 = vehicle_at(1, 0.0, 0.0);
    dispatcher.add_vehicle(v1.clone());

    dispatcher.submit(ServiceRequest::new(
        "c-1",
        Point::new(0.0, 0.0),
        Point::new(0.0, 5.0),
        1,
    ));
    let request = v1.next_assignment().expect("assignment");
    let (tariff, kind) = request.tariff.expect("captured tariff");
    assert_eq!(kind, TariffKind::Normal);

    // The band flips to high while the trip is in progress.
    dispatcher.engine().refresh_tariff_mode(21);
    assert_eq!(dispatcher.engine().current_tariff().1, TariffKind::High);

    let trip_fare = fare(tariff, 5.0);
    assert_eq!(trip_fare, 5.5, "not the 8.50 the high band would charge");
    dispatcher.settle_trip(&v1, &request, 5.0, trip_fare, kind, 5.0);
    assert_eq!(dispatcher.engine().tally().fares_high_tariff, 0.0);
}

#[test]
fn settlement_advances_client_frequency_and_stars() {
    let dispatcher = dispatcher_at_hour(12);
    let v1 = vehicle_at(1, 0.0, 0.0);
    dispatcher.add_vehicle(v1.clone());

    for trip in 0..3u32 {
        dispatcher.submit(ServiceRequest::new(
            "c-9",
            Point::new(0.0, 1.0),
            Point::new(2.0, 2.0),
            1,
        ));
        let request = v1.next_assignment().expect("assignment");
        dispatcher.settle_trip(&v1, &request, 3.0, 3.5, TariffKind::Normal, 4.0);
        v1.state().available = true;

        let expected_stars = if trip < 2 { 1 } else { 2 };
        assert_eq!(dispatcher.client_stars("c-9"), Some(expected_stars));
    }
}

#[test]
fn quiescence_permits_accumulate_one_per_zero_transition() {
    let dispatcher = dispatcher_at_hour(12);
    let v1 = vehicle_at(1, 0.0, 0.0);
    dispatcher.add_vehicle(v1.clone());

    for _ in 0..2 {
        dispatcher.submit(ServiceRequest::new(
            "c-1",
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            1,
        ));
        let request = v1.next_assignment().expect("assignment");
        dispatcher.settle_trip(&v1, &request, 1.0, 1.5, TariffKind::Normal, 4.0);
        v1.state().available = true;
    }

    // Two transitions to zero banked two permits; neither call blocks.
    dispatcher.end_of_day_barrier();
    dispatcher.end_of_day_barrier();
    assert_eq!(dispatcher.active_services(), 0);
}

#[test]
fn midnight_boundary_resets_daily_trip_counters_once() {
    let dispatcher = dispatcher_at_hour(0);
    let v1 = vehicle_at(1, 0.0, 0.0);
    dispatcher.add_vehicle(v1.clone());
    v1.state().trips_today = 4;

    dispatcher.on_hour_boundary();
    assert_eq!(v1.state().trips_today, 0);
    assert_eq!(dispatcher.daily_history().len(), 1);

    // Same hour again: the guard holds, counters accumulate normally.
    v1.state().trips_today = 2;
    dispatcher.on_hour_boundary();
    assert_eq!(v1.state().trips_today, 2);
    assert_eq!(dispatcher.daily_history().len(), 1);
}

#[test]
fn threaded_day_reaches_quiescence() {
    let dispatcher = dispatcher_at_hour(12);
    for (id, x, y) in [(1u64, 0.0, 0.0), (2, 5.0, 5.0), (3, 10.0, 0.0)] {
        dispatcher.register_vehicle(vehicle_spec(id, &format!("driver-{id}"), x, y));
    }

    let resolver: Arc<dyn AddressResolver> = Arc::new(HashGeocoder);
    let submitted = 5u64;
    let mut agents = Vec::new();
    for i in 0..submitted {
        let ask = RideAsk {
            origin: Some(Point::new(i as f64, 1.0)),
            destination: Some(Point::new(i as f64, 4.0)),
            ..RideAsk::default()
        };
        agents.push(spawn_request_agent(
            dispatcher.clone(),
            format!("c-{i}"),
            1,
            ask,
            resolver.clone(),
            i,
        ));
    }
    for agent in agents {
        agent.join().expect("request agent");
    }

    dispatcher.end_of_day_barrier();
    assert_eq!(dispatcher.active_services(), 0);

    let control = dispatcher.control_log();
    assert_eq!(control.len() as u64, submitted);
    let accepted = control.iter().filter(|record| record.accepted).count();
    let rejected = control.iter().filter(|record| !record.accepted).count();
    assert_eq!(accepted + rejected, submitted as usize);
    assert!(accepted >= 3, "three vehicles should each take a trip");

    // Give the agents a beat to flip availability after their settlements.
    std::thread::sleep(Duration::from_millis(200));
    for vehicle in dispatcher.vehicles() {
        let state = vehicle.state();
        assert!(state.available);
        assert_eq!(state.phase, VehiclePhase::Idle);
    }

    let (daily, _) = dispatcher.reports();
    assert_eq!(daily.tracked_services.len(), accepted.min(5));
}
