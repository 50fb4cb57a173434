//! Accelerated virtual clock.
//!
//! Wall-clock time elapsed since engine startup is scaled by a fixed
//! multiplier and added to the virtual seconds-of-day captured at the epoch.
//! Tariff switching and daily rollover read this clock and nothing else.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub const SECS_PER_DAY: u64 = 24 * 60 * 60;
pub const SECS_PER_HOUR: u64 = 60 * 60;

/// Default acceleration: one wall minute is half a virtual hour.
pub const DEFAULT_MULTIPLIER: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct VirtualClock {
    started: Instant,
    epoch_secs_of_day: u64,
    multiplier: f64,
}

impl VirtualClock {
    /// Captures the current wall time-of-day as the virtual epoch.
    pub fn new(multiplier: f64) -> Self {
        let wall_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self::with_epoch(wall_secs % SECS_PER_DAY, multiplier)
    }

    /// Fixed-epoch constructor for tests and scripted runs. `epoch_secs_of_day`
    /// is the virtual time-of-day at startup, in seconds past midnight.
    pub fn with_epoch(epoch_secs_of_day: u64, multiplier: f64) -> Self {
        Self {
            started: Instant::now(),
            epoch_secs_of_day: epoch_secs_of_day % SECS_PER_DAY,
            multiplier: if multiplier > 0.0 {
                multiplier
            } else {
                DEFAULT_MULTIPLIER
            },
        }
    }

    /// Total virtual seconds since the virtual midnight preceding the epoch.
    pub fn virtual_secs(&self) -> u64 {
        let scaled = self.started.elapsed().as_secs_f64() * self.multiplier;
        self.epoch_secs_of_day + scaled as u64
    }

    pub fn seconds_of_day(&self) -> u64 {
        self.virtual_secs() % SECS_PER_DAY
    }

    pub fn hour_of_day(&self) -> u8 {
        (self.seconds_of_day() / SECS_PER_HOUR) as u8
    }

    /// Virtual days elapsed since the virtual midnight preceding the epoch.
    pub fn virtual_day(&self) -> u64 {
        self.virtual_secs() / SECS_PER_DAY
    }

    /// Wall-clock duration until the next virtual hour boundary. The hour
    /// monitor sleeps exactly this long instead of polling.
    pub fn wall_until_next_hour(&self) -> Duration {
        let into_hour = self.virtual_secs() % SECS_PER_HOUR;
        let remaining = SECS_PER_HOUR - into_hour;
        Duration::from_secs_f64(remaining as f64 / self.multiplier)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_fixes_the_virtual_hour() {
        let clock = VirtualClock::with_epoch(21 * SECS_PER_HOUR + 120, 30.0);
        assert_eq!(clock.hour_of_day(), 21);
        assert_eq!(clock.virtual_day(), 0);
    }

    #[test]
    fn epoch_wraps_past_midnight() {
        let clock = VirtualClock::with_epoch(SECS_PER_DAY + 3600, 30.0);
        assert_eq!(clock.hour_of_day(), 1);
    }

    #[test]
    fn non_positive_multiplier_falls_back_to_default() {
        let clock = VirtualClock::with_epoch(0, 0.0);
        assert_eq!(clock.multiplier(), DEFAULT_MULTIPLIER);
    }

    #[test]
    fn wall_until_next_hour_is_bounded_by_the_multiplier() {
        let clock = VirtualClock::with_epoch(0, 60.0);
        // A virtual hour at 60x lasts at most one wall minute.
        assert!(clock.wall_until_next_hour() <= Duration::from_secs(60));
    }
}
