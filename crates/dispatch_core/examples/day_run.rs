//! Minimal scripted run: three vehicles, address-based requests, reports on
//! stdout.

use std::sync::Arc;
use std::time::Duration;

use dispatch_core::clock::{VirtualClock, DEFAULT_MULTIPLIER};
use dispatch_core::coordinator::Dispatcher;
use dispatch_core::engine::PricingEngine;
use dispatch_core::geocode::{AddressResolver, HashGeocoder};
use dispatch_core::matching::SelectionPolicyKind;
use dispatch_core::pricing::TariffSchedule;
use dispatch_core::request::{spawn_request_agent, RideAsk};
use dispatch_core::spatial::Point;
use dispatch_core::vehicle::VehicleSpec;

fn main() {
    let engine = PricingEngine::new(
        VirtualClock::new(DEFAULT_MULTIPLIER),
        TariffSchedule::default(),
        SelectionPolicyKind::Nearest,
    );
    let dispatcher = Dispatcher::new(engine);
    dispatcher.spawn_hour_monitor();

    for (id, name, plate, speed, x, y) in [
        (1u64, "Ana", "ABC123", 50.0, 0.0, 0.0),
        (2, "Luis", "DEF456", 60.0, 5.0, 5.0),
        (3, "Marta", "GHI789", 45.0, 10.0, 0.0),
    ] {
        dispatcher.register_vehicle(VehicleSpec {
            id,
            name: name.to_string(),
            plate: plate.to_string(),
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            speed_kmh: speed,
            position: Point::new(x, y),
            available: true,
        });
    }

    let resolver: Arc<dyn AddressResolver> = Arc::new(HashGeocoder);
    let rides = [
        ("Calle Gran Via, 28013, Madrid", "Plaza Mayor, 28012, Madrid"),
        ("Calle Serrano, 28001, Madrid", "Paseo de la Castellana, 28046, Madrid"),
        ("Plaza de Espana, 28008, Madrid", "Calle Alcala, 28014, Madrid"),
    ];
    let mut agents = Vec::new();
    for (i, (origin, destination)) in rides.into_iter().enumerate() {
        let ask = RideAsk {
            origin_address: Some(origin.to_string()),
            destination_address: Some(destination.to_string()),
            ..RideAsk::default()
        };
        agents.push(spawn_request_agent(
            dispatcher.clone(),
            format!("client-{}", i + 1),
            1,
            ask,
            resolver.clone(),
            i as u64,
        ));
    }
    for agent in agents {
        let _ = agent.join();
    }

    dispatcher.end_of_day_barrier();
    std::thread::sleep(Duration::from_millis(100));

    let (daily, monthly) = dispatcher.reports();
    println!("day {} earned {:.2}", daily.day, daily.total_earnings);
    for record in &daily.tracked_services {
        println!(
            "  {} -> vehicle {:?}, {:.2} km, fare {:.2}",
            record.client_id, record.vehicle_id, record.km, record.fare
        );
    }
    for row in &monthly {
        println!(
            "{} ({}) earned {:.2}, driver share {:.2}",
            row.name, row.plate, row.total_earned, row.driver_share
        );
    }
    dispatcher.stop_monitor();
}
