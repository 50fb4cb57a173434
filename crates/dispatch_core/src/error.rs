//! Error taxonomy. Everything here is recovered locally; nothing halts the
//! coordinator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no vehicle available for client {client_id}")]
    NoVehicleAvailable { client_id: String },
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder unreachable: {0}")]
    Unreachable(String),
}
