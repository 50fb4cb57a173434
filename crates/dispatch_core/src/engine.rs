//! Scoring & pricing engine: selection policy, tariff mode, the virtual
//! clock, today's tally, and the daily rollover.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::info;

use crate::clock::VirtualClock;
use crate::lock;
use crate::matching::{
    CandidateVehicle, RiderContext, SelectionPolicy, SelectionPolicyKind, SelectionResult,
};
use crate::pricing::{Tariff, TariffKind, TariffSchedule};
use crate::tally::{DailySummary, DailyTally};

pub struct PricingEngine {
    clock: VirtualClock,
    schedule: TariffSchedule,
    high_mode: AtomicBool,
    policy: Box<dyn SelectionPolicy>,
    tally: Mutex<DailyTally>,
    history: Mutex<Vec<DailySummary>>,
    /// Last virtual hour the rollover fired at. `Some(0)` blocks re-entry
    /// within hour zero; any later hour clears it.
    rollover_guard: Mutex<Option<u8>>,
}

impl PricingEngine {
    pub fn new(clock: VirtualClock, schedule: TariffSchedule, policy: SelectionPolicyKind) -> Self {
        let high = schedule.kind_for_hour(clock.hour_of_day()) == TariffKind::High;
        Self {
            clock,
            schedule,
            high_mode: AtomicBool::new(high),
            policy: policy.build(),
            tally: Mutex::new(DailyTally::default()),
            history: Mutex::new(Vec::new()),
            rollover_guard: Mutex::new(None),
        }
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn schedule(&self) -> &TariffSchedule {
        &self.schedule
    }

    /// The tariff pair in force right now. Stable between hour boundaries.
    pub fn current_tariff(&self) -> (Tariff, TariffKind) {
        let kind = if self.high_mode.load(Ordering::Relaxed) {
            TariffKind::High
        } else {
            TariffKind::Normal
        };
        (self.schedule.tariff(kind), kind)
    }

    /// Recomputes the tariff mode for `hour`. Called on hour boundaries
    /// only, never per request.
    pub fn refresh_tariff_mode(&self, hour: u8) {
        let high = self.schedule.kind_for_hour(hour) == TariffKind::High;
        let was = self.high_mode.swap(high, Ordering::Relaxed);
        if was != high {
            info!(
                "tariff switched to {} at virtual hour {hour}",
                if high { "high" } else { "normal" }
            );
        }
    }

    /// Runs the selection policy over the snapshot and packages the full
    /// match outcome: winner, distance, captured tariff, client stars.
    pub fn select_vehicle(
        &self,
        rider: &RiderContext,
        candidates: &[CandidateVehicle],
    ) -> Option<SelectionResult> {
        let selection = self.policy.select(rider, candidates)?;
        let (tariff, tariff_kind) = self.current_tariff();
        Some(SelectionResult {
            vehicle_index: candidates[selection.candidate].index,
            distance_km: selection.distance_km,
            tariff,
            tariff_kind,
            client_stars: rider.stars,
            reason: selection.reason,
        })
    }

    /// Folds one settled trip into today's tally.
    pub fn record_trip(
        &self,
        fare: f64,
        tariff_kind: TariffKind,
        vehicle_name: &str,
        vehicle_trips_today: u32,
        client_name: &str,
        client_stars: u8,
    ) {
        lock(&self.tally).record_trip(
            fare,
            tariff_kind == TariffKind::High,
            vehicle_name,
            vehicle_trips_today,
            client_name,
            client_stars,
        );
    }

    /// Fires at most once per virtual-hour-zero crossing: archives the
    /// tally into the permanent history and resets it. Returns whether the
    /// rollover fired, so the caller can clear per-day vehicle counters.
    pub fn rollover_if_due(&self, hour: u8) -> bool {
        {
            let mut guard = lock(&self.rollover_guard);
            if hour != 0 {
                *guard = None;
                return false;
            }
            if *guard == Some(0) {
                return false;
            }
            *guard = Some(0);
        }

        let day = self.clock.virtual_day();
        let summary = lock(&self.tally).archive(day);
        info!(
            "daily rollover: day {day}, {} trips, {:.2} total fares",
            summary.trips, summary.fares_total
        );
        lock(&self.history).push(summary);
        true
    }

    /// Archived daily summaries; never reset.
    pub fn history(&self) -> Vec<DailySummary> {
        lock(&self.history).clone()
    }

    /// Snapshot of today's tally.
    pub fn tally(&self) -> DailyTally {
        lock(&self.tally).clone()
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(
            VirtualClock::new(crate::clock::DEFAULT_MULTIPLIER),
            TariffSchedule::default(),
            SelectionPolicyKind::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::SECS_PER_HOUR;

    use super::*;

    fn engine_at_hour(hour: u8) -> PricingEngine {
        PricingEngine::new(
            VirtualClock::with_epoch(hour as u64 * SECS_PER_HOUR, 30.0),
            TariffSchedule::default(),
            SelectionPolicyKind::Nearest,
        )
    }

    #[test]
    fn startup_captures_the_tariff_band_for_the_epoch_hour() {
        assert_eq!(engine_at_hour(12).current_tariff().1, TariffKind::Normal);
        assert_eq!(engine_at_hour(22).current_tariff().1, TariffKind::High);
    }

    #[test]
    fn tariff_mode_follows_hour_boundaries() {
        let engine = engine_at_hour(20);
        engine.refresh_tariff_mode(21);
        assert_eq!(engine.current_tariff().1, TariffKind::High);
        engine.refresh_tariff_mode(0);
        assert_eq!(engine.current_tariff().1, TariffKind::Normal);
    }

    #[test]
    fn rollover_fires_once_per_midnight_crossing() {
        let engine = engine_at_hour(0);
        engine.record_trip(5.5, TariffKind::Normal, "Ana", 1, "c-1", 1);

        assert!(engine.rollover_if_due(0));
        // Re-entry within hour zero must not double-fire.
        assert!(!engine.rollover_if_due(0));
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.tally().trips, 0);

        // A later hour re-arms the guard for the next midnight.
        assert!(!engine.rollover_if_due(1));
        assert!(engine.rollover_if_due(0));
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn rollover_archives_the_day_figures() {
        let engine = engine_at_hour(0);
        engine.record_trip(8.5, TariffKind::High, "Luis", 2, "c-9", 4);
        assert!(engine.rollover_if_due(0));
        let history = engine.history();
        assert_eq!(history[0].trips, 1);
        assert_eq!(history[0].fares_high_tariff, 8.5);
        assert_eq!(history[0].busiest_vehicle, Some(("Luis".to_string(), 2)));
    }
}
