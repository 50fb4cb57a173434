//! Ride requests and the short-lived agents that submit them.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coordinator::Dispatcher;
use crate::geocode::{resolve_or_fallback, AddressResolver};
use crate::matching::SelectionReason;
use crate::pricing::{Tariff, TariffKind};
use crate::spatial::Point;

/// A ride request. Immutable once created; the match step fills in the
/// captured tariff and the selection rationale before handing it to the
/// winning vehicle.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub client_id: String,
    pub origin: Point,
    pub destination: Point,
    /// Simulation day the request belongs to.
    pub day: u32,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
    /// Tariff pair captured at match time; the trip is priced with this
    /// even if the active band flips mid-trip.
    pub tariff: Option<(Tariff, TariffKind)>,
    pub selected_by: Option<SelectionReason>,
}

impl ServiceRequest {
    pub fn new(client_id: impl Into<String>, origin: Point, destination: Point, day: u32) -> Self {
        Self {
            client_id: client_id.into(),
            origin,
            destination,
            day,
            origin_address: None,
            destination_address: None,
            tariff: None,
            selected_by: None,
        }
    }

    pub fn with_addresses(
        mut self,
        origin_address: impl Into<String>,
        destination_address: impl Into<String>,
    ) -> Self {
        self.origin_address = Some(origin_address.into());
        self.destination_address = Some(destination_address.into());
        self
    }
}

/// One ride ask as a request agent receives it: explicit coordinates win,
/// then addresses (geocoded), then random positions on the grid.
#[derive(Debug, Clone, Default)]
pub struct RideAsk {
    pub origin: Option<Point>,
    pub destination: Option<Point>,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
}

/// Spawns a request agent: converts the ask into a [ServiceRequest],
/// submits it, and terminates. The trip itself runs on the vehicle agent.
pub fn spawn_request_agent(
    dispatcher: Arc<Dispatcher>,
    client_id: String,
    day: u32,
    ask: RideAsk,
    resolver: Arc<dyn AddressResolver>,
    seed: u64,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(seed);
        let origin = endpoint(
            ask.origin,
            ask.origin_address.as_deref(),
            resolver.as_ref(),
            &mut rng,
        );
        let destination = endpoint(
            ask.destination,
            ask.destination_address.as_deref(),
            resolver.as_ref(),
            &mut rng,
        );

        let mut request = ServiceRequest::new(client_id, origin, destination, day);
        request.origin_address = ask.origin_address;
        request.destination_address = ask.destination_address;

        info!(
            "client {} requests a ride ({:.1},{:.1}) -> ({:.1},{:.1})",
            request.client_id, origin.x, origin.y, destination.x, destination.y
        );
        dispatcher.submit(request);
    })
}

fn endpoint(
    point: Option<Point>,
    address: Option<&str>,
    resolver: &dyn AddressResolver,
    rng: &mut StdRng,
) -> Point {
    if let Some(point) = point {
        return point;
    }
    if let Some(address) = address {
        return resolve_or_fallback(resolver, address);
    }
    Point::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0))
}
