//! Report renderers for the accumulated dispatch records.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use dispatch_core::coordinator::{DailySnapshot, MonthlySummary};
use dispatch_core::records::ServiceRecord;

use crate::error::ReportError;

/// Appends one day's snapshot to the daily report file.
pub fn append_daily_report(path: &Path, snapshot: &DailySnapshot) -> Result<(), ReportError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write_daily_report(&mut file, snapshot)?;
    Ok(())
}

pub fn write_daily_report(out: &mut dyn Write, snapshot: &DailySnapshot) -> std::io::Result<()> {
    writeln!(out, "Day {}", snapshot.day)?;
    writeln!(out, "Total earnings: {:.2}", snapshot.total_earnings)?;
    for (i, record) in snapshot.tracked_services.iter().enumerate() {
        writeln!(
            out,
            "{}- vehicle: {} client: {} origin: ({:.1},{:.1}) destination: ({:.1},{:.1}) km: {:.2} fare: {:.2} rating: {}",
            i + 1,
            fmt_vehicle(record.vehicle_id),
            record.client_id,
            record.origin.x,
            record.origin.y,
            record.destination.x,
            record.destination.y,
            record.km,
            record.fare,
            fmt_rating(record.rating),
        )?;
    }
    writeln!(out)
}

/// Writes the monthly earnings report: per-vehicle totals with the platform
/// cut and the driver share.
pub fn write_monthly_report(
    out: &mut dyn Write,
    summaries: &[MonthlySummary],
) -> std::io::Result<()> {
    writeln!(out, "MONTHLY EARNINGS REPORT")?;
    writeln!(out, "=======================")?;
    writeln!(out)?;
    for summary in summaries {
        writeln!(out, "Driver: {} :: Name: {}", summary.vehicle_id, summary.name)?;
        writeln!(
            out,
            "Plate: {} :: Brand: {} :: Model: {}",
            summary.plate, summary.brand, summary.model
        )?;
        writeln!(
            out,
            "Total earned: {:.2} :: Platform cut: {:.2} :: Driver share: {:.2}",
            summary.total_earned, summary.platform_cut, summary.driver_share
        )?;
        writeln!(out, "{}", "-".repeat(50))?;
    }
    Ok(())
}

/// Writes the full control-services history.
pub fn write_control_log(out: &mut dyn Write, records: &[ServiceRecord]) -> std::io::Result<()> {
    writeln!(out, "SERVICE CONTROL LOG")?;
    writeln!(out, "===================")?;
    writeln!(out)?;
    for record in records {
        let status = if record.accepted { "ACCEPTED" } else { "REJECTED" };
        writeln!(out, "Day: {} | Status: {status}", record.day)?;
        writeln!(
            out,
            "Vehicle: {} | Client: {}",
            fmt_vehicle(record.vehicle_id),
            record.client_id
        )?;
        writeln!(
            out,
            "Origin: ({:.1},{:.1}) -> Destination: ({:.1},{:.1})",
            record.origin.x, record.origin.y, record.destination.x, record.destination.y
        )?;
        writeln!(out, "Distance: {:.2} km | Fare: {:.2}", record.km, record.fare)?;
        writeln!(out, "Rating: {}", fmt_rating(record.rating))?;
        writeln!(out, "{}", "-".repeat(40))?;
    }
    Ok(())
}

/// Flat row shape for the CSV export; the nested coordinates are expanded
/// into scalar columns.
#[derive(Serialize)]
struct ControlLogRow<'a> {
    day: u32,
    vehicle_id: Option<u64>,
    client_id: &'a str,
    origin_x: f64,
    origin_y: f64,
    destination_x: f64,
    destination_y: f64,
    km: f64,
    fare: f64,
    rating: Option<f64>,
    accepted: bool,
    selected_by: Option<&'static str>,
}

/// CSV export of the control log for downstream analysis.
pub fn export_control_log_csv(path: &Path, records: &[ServiceRecord]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(ControlLogRow {
            day: record.day,
            vehicle_id: record.vehicle_id,
            client_id: &record.client_id,
            origin_x: record.origin.x,
            origin_y: record.origin.y,
            destination_x: record.destination.x,
            destination_y: record.destination.y,
            km: record.km,
            fare: record.fare,
            rating: record.rating,
            accepted: record.accepted,
            selected_by: record.selected_by.map(|reason| reason.as_str()),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn fmt_vehicle(vehicle_id: Option<u64>) -> String {
    vehicle_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_rating(rating: Option<f64>) -> String {
    rating
        .map(|rating| format!("{rating:.0}"))
        .unwrap_or_else(|| "N/A".to_string())
}
