use serde::{Deserialize, Serialize};

use crate::pricing::{Tariff, TariffKind};
use crate::spatial::Point;

/// Read-only snapshot of one vehicle, taken under the match lock.
#[derive(Debug, Clone)]
pub struct CandidateVehicle {
    /// Roster index at snapshot time.
    pub index: usize,
    pub available: bool,
    pub position: Point,
    pub rating: f64,
    pub trips_today: u32,
    pub rest_secs: f64,
}

/// Value object assembled once from the client profile and the request
/// origin; policies never see the profile registry itself.
#[derive(Debug, Clone)]
pub struct RiderContext {
    pub client_id: String,
    pub origin: Point,
    pub stars: u8,
}

/// Why the winning vehicle was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionReason {
    /// Unique nearest candidate.
    Distance,
    /// Nearest-distance tie broken by fitness score.
    FitnessTiebreak,
    /// Least-loaded candidate won under a non-zero trip spread.
    Balanced,
    /// Combined scores within epsilon of each other.
    Tiebreak,
}

impl SelectionReason {
    /// Rationale string recorded on service records.
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionReason::Distance => "distance",
            SelectionReason::FitnessTiebreak => "fitness-tiebreak",
            SelectionReason::Balanced => "balanced",
            SelectionReason::Tiebreak => "tiebreak",
        }
    }
}

/// Outcome of a policy run: which candidate won and why.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    /// Index into the candidates slice the policy was given.
    pub candidate: usize,
    /// Distance from the winner to the request origin, rounded.
    pub distance_km: f64,
    pub reason: SelectionReason,
}

/// Full match outcome handed back to the coordinator.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Roster index of the winning vehicle.
    pub vehicle_index: usize,
    pub distance_km: f64,
    /// Tariff pair in force at match time; the trip is priced with this
    /// even if the band flips mid-trip.
    pub tariff: Tariff,
    pub tariff_kind: TariffKind,
    pub client_stars: u8,
    pub reason: SelectionReason,
}
