//! Append-only service history records.

use serde::Serialize;

use crate::matching::SelectionReason;
use crate::spatial::Point;

/// One request outcome, accepted or rejected.
///
/// The same shape feeds both logs: the unbounded control log keeps every
/// request for the whole run, the tracking log keeps a small per-day sample
/// for the daily report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRecord {
    pub day: u32,
    pub vehicle_id: Option<u64>,
    pub client_id: String,
    pub origin: Point,
    pub destination: Point,
    pub origin_address: Option<String>,
    pub destination_address: Option<String>,
    pub km: f64,
    pub fare: f64,
    pub rating: Option<f64>,
    pub accepted: bool,
    pub selected_by: Option<SelectionReason>,
}
