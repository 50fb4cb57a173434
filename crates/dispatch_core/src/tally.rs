//! Per-day aggregates and the permanent daily-summary archive.

use serde::Serialize;

use crate::spatial::round2;

/// Running aggregates for the current virtual day. Reset at rollover after
/// being archived.
#[derive(Debug, Clone, Default)]
pub struct DailyTally {
    pub trips: u64,
    pub fares_total: f64,
    pub fares_high_tariff: f64,
    /// Vehicle with the most trips today: (display name, trip count).
    pub busiest_vehicle: Option<(String, u32)>,
    /// Highest-starred client seen today: (display name, stars).
    pub top_client: Option<(String, u8)>,
}

impl DailyTally {
    pub fn record_trip(
        &mut self,
        fare: f64,
        high_tariff: bool,
        vehicle_name: &str,
        vehicle_trips_today: u32,
        client_name: &str,
        client_stars: u8,
    ) {
        self.trips += 1;
        self.fares_total += fare;
        if high_tariff {
            self.fares_high_tariff += fare;
        }
        match &self.busiest_vehicle {
            Some((_, trips)) if *trips >= vehicle_trips_today => {}
            _ => self.busiest_vehicle = Some((vehicle_name.to_string(), vehicle_trips_today)),
        }
        match &self.top_client {
            Some((_, stars)) if *stars >= client_stars => {}
            _ => self.top_client = Some((client_name.to_string(), client_stars)),
        }
    }

    /// Archives the current figures under `day` and resets to zero.
    pub fn archive(&mut self, day: u64) -> DailySummary {
        let summary = DailySummary {
            day,
            trips: self.trips,
            fares_total: round2(self.fares_total),
            fares_high_tariff: round2(self.fares_high_tariff),
            busiest_vehicle: self.busiest_vehicle.take(),
            top_client: self.top_client.take(),
        };
        *self = DailyTally::default();
        summary
    }
}

/// Immutable end-of-day summary. The archive holding these is never reset.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub day: u64,
    pub trips: u64,
    pub fares_total: f64,
    pub fares_high_tariff: f64,
    pub busiest_vehicle: Option<(String, u32)>,
    pub top_client: Option<(String, u8)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_tariff_fares_accumulate_separately() {
        let mut tally = DailyTally::default();
        tally.record_trip(5.5, false, "Ana", 1, "c-1", 1);
        tally.record_trip(8.5, true, "Luis", 1, "c-2", 2);
        assert_eq!(tally.trips, 2);
        assert_eq!(tally.fares_total, 14.0);
        assert_eq!(tally.fares_high_tariff, 8.5);
    }

    #[test]
    fn busiest_vehicle_tracks_the_max_and_keeps_first_on_tie() {
        let mut tally = DailyTally::default();
        tally.record_trip(5.0, false, "Ana", 1, "c-1", 1);
        tally.record_trip(5.0, false, "Luis", 1, "c-1", 1);
        assert_eq!(tally.busiest_vehicle, Some(("Ana".to_string(), 1)));
        tally.record_trip(5.0, false, "Luis", 2, "c-1", 1);
        assert_eq!(tally.busiest_vehicle, Some(("Luis".to_string(), 2)));
    }

    #[test]
    fn archive_resets_the_tally() {
        let mut tally = DailyTally::default();
        tally.record_trip(5.5, true, "Ana", 1, "c-1", 3);
        let summary = tally.archive(2);
        assert_eq!(summary.day, 2);
        assert_eq!(summary.trips, 1);
        assert_eq!(summary.fares_high_tariff, 5.5);
        assert_eq!(summary.top_client, Some(("c-1".to_string(), 3)));
        assert_eq!(tally.trips, 0);
        assert_eq!(tally.fares_total, 0.0);
        assert!(tally.busiest_vehicle.is_none());
    }
}
