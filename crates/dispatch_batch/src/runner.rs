//! Day-by-day batch driver.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use dispatch_core::coordinator::Dispatcher;
use dispatch_core::geocode::{AddressResolver, HashGeocoder};
use dispatch_core::request::{spawn_request_agent, RideAsk};
use dispatch_core::spatial::Point;
use dispatch_core::vehicle::VehicleSpec;

use crate::roster::{ClientRecord, VehicleSchedule};

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Ride requests generated per simulated day.
    pub requests_per_day: usize,
    /// Seed for the request-traffic RNG, for reproducible runs.
    pub seed: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            requests_per_day: 5,
            seed: 0,
        }
    }
}

/// Runs the whole schedule: per day, register the day's vehicles, fire the
/// day's request agents, and block on the end-of-day barrier before handing
/// the day to `on_day_end` (report rendering, snapshots).
pub fn run_schedule<F>(
    dispatcher: &Arc<Dispatcher>,
    schedule: &VehicleSchedule,
    clients: &[ClientRecord],
    config: &BatchConfig,
    mut on_day_end: F,
) where
    F: FnMut(u32, &Arc<Dispatcher>),
{
    let mut rng = StdRng::seed_from_u64(config.seed);
    let resolver: Arc<dyn AddressResolver> = Arc::new(HashGeocoder);

    for client in clients {
        dispatcher.register_affiliated_client(&client.id, &client.display_name());
    }
    info!("affiliated {} clients", clients.len());

    for day in 1..=schedule.days {
        info!("--- day {day} ---");
        dispatcher.start_new_day(day);

        for record in schedule.for_day(day) {
            dispatcher.register_vehicle(VehicleSpec {
                id: record.id,
                name: record.display_name(),
                plate: record.plate.clone(),
                brand: record.brand.clone(),
                model: record.model.clone(),
                speed_kmh: record.speed_kmh,
                position: random_point(&mut rng),
                available: record.available,
            });
        }

        let mut agents: Vec<JoinHandle<()>> = Vec::new();
        for _ in 0..config.requests_per_day {
            let Some(client) = clients.choose(&mut rng) else {
                break;
            };
            let ask = RideAsk {
                origin: Some(random_point(&mut rng)),
                destination: Some(random_point(&mut rng)),
                ..RideAsk::default()
            };
            agents.push(spawn_request_agent(
                dispatcher.clone(),
                client.id.clone(),
                day,
                ask,
                resolver.clone(),
                rng.gen(),
            ));
        }

        let spawned = agents.len();
        for agent in agents {
            let _ = agent.join();
        }
        if spawned > 0 {
            dispatcher.end_of_day_barrier();
        }
        info!("day {day} quiesced after {spawned} requests");
        on_day_end(day, dispatcher);
    }
}

fn random_point(rng: &mut StdRng) -> Point {
    Point::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0))
}
