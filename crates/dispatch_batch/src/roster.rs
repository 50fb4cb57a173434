//! Flat-file roster loaders.
//!
//! Vehicle schedule format, one value per line except records:
//!
//! ```text
//! d                 (number of days)
//! M1                (vehicles for day 1)
//! id, name, surname, plate, brand, model, speed, availability
//! ...
//! M2
//! ...
//! ```
//!
//! Affiliated clients: `id, name, surname, card`, one record per line.
//! Malformed records are skipped with a warning so a day's processing can
//! continue; a malformed header is an error.

use std::fs;
use std::path::Path;

use log::warn;

use crate::error::RosterError;

/// One vehicle line from the schedule file.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub id: u64,
    pub name: String,
    pub surname: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub speed_kmh: f64,
    pub available: bool,
}

impl VehicleRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// One affiliated client line.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub card: String,
}

impl ClientRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// Per-day vehicle rosters.
#[derive(Debug, Clone, Default)]
pub struct VehicleSchedule {
    pub days: u32,
    per_day: Vec<Vec<VehicleRecord>>,
}

impl VehicleSchedule {
    /// Records for a 1-based day; an unknown day is an empty roster.
    pub fn for_day(&self, day: u32) -> &[VehicleRecord] {
        day.checked_sub(1)
            .and_then(|index| self.per_day.get(index as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn load_vehicle_schedule(path: &Path) -> Result<VehicleSchedule, RosterError> {
    let text = fs::read_to_string(path)?;
    parse_vehicle_schedule(&text)
}

pub fn parse_vehicle_schedule(text: &str) -> Result<VehicleSchedule, RosterError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let days: u32 = lines
        .next()
        .ok_or(RosterError::EmptySchedule)?
        .parse()
        .map_err(|_| RosterError::MalformedHeader)?;

    let mut per_day = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let Some(count_line) = lines.next() else { break };
        let count: usize = match count_line.parse() {
            Ok(count) => count,
            Err(_) => {
                warn!("day {day}: bad vehicle count {count_line:?}, skipping day");
                per_day.push(Vec::new());
                continue;
            }
        };

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(line) = lines.next() else { break };
            match parse_vehicle_record(line) {
                Some(record) => records.push(record),
                None => warn!("day {day}: skipping malformed vehicle record {line:?}"),
            }
        }
        per_day.push(records);
    }

    Ok(VehicleSchedule { days, per_day })
}

fn parse_vehicle_record(line: &str) -> Option<VehicleRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 8 {
        return None;
    }
    Some(VehicleRecord {
        id: fields[0].parse().ok()?,
        name: fields[1].to_string(),
        surname: fields[2].to_string(),
        plate: fields[3].to_string(),
        brand: fields[4].to_string(),
        model: fields[5].to_string(),
        speed_kmh: fields[6].parse().ok()?,
        available: fields[7] == "1",
    })
}

pub fn load_clients(path: &Path) -> Result<Vec<ClientRecord>, RosterError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_clients(&text))
}

pub fn parse_clients(text: &str) -> Vec<ClientRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 4 {
                warn!("skipping malformed client record {line:?}");
                return None;
            }
            Some(ClientRecord {
                id: fields[0].to_string(),
                name: fields[1].to_string(),
                surname: fields[2].to_string(),
                card: fields[3].to_string(),
            })
        })
        .collect()
}

/// Writes example input files when they do not exist yet, so a fresh
/// checkout can run end to end.
pub fn write_example_inputs(vehicles_path: &Path, clients_path: &Path) -> Result<(), RosterError> {
    if !vehicles_path.exists() {
        fs::write(
            vehicles_path,
            "2\n\
             3\n\
             1001, Juan, Perez, ABC1234, Toyota, Corolla, 60, 1\n\
             1002, Ana, Lopez, XYZ9876, Ford, Fiesta, 55, 1\n\
             1003, Carlos, Ruiz, DEF4567, Chevrolet, Spark, 50, 0\n\
             2\n\
             1001, Juan, Perez, ABC1234, Toyota, Corolla, 60, 1\n\
             1004, Marta, Diaz, GHI1122, Nissan, Sentra, 65, 1\n",
        )?;
    }
    if !clients_path.exists() {
        fs::write(
            clients_path,
            "5001, Pedro, Gomez, 123456789\n\
             5002, Lucia, Fernandez, 987654321\n\
             5003, Roberto, Silva, 456123789\n",
        )?;
    }
    Ok(())
}
