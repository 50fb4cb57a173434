//! Time-of-day tariffs and fare calculation.

use serde::{Deserialize, Serialize};

use crate::spatial::round2;

/// A (base fare, per-kilometer rate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub base: f64,
    pub per_km: f64,
}

/// Which tariff band was in force when a trip was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffKind {
    Normal,
    High,
}

/// The two fixed tariff pairs plus the evening activation hour.
///
/// Band changes are recomputed on virtual hour boundaries only, never per
/// request; requests capture the pair in force at match time.
#[derive(Debug, Clone, Copy)]
pub struct TariffSchedule {
    pub normal: Tariff,
    pub high: Tariff,
    /// Virtual hour-of-day at which the high tariff activates.
    pub high_tariff_start_hour: u8,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            normal: Tariff {
                base: 0.5,
                per_km: 1.0,
            },
            high: Tariff {
                base: 1.0,
                per_km: 1.5,
            },
            high_tariff_start_hour: 21,
        }
    }
}

impl TariffSchedule {
    pub fn kind_for_hour(&self, hour: u8) -> TariffKind {
        if hour >= self.high_tariff_start_hour {
            TariffKind::High
        } else {
            TariffKind::Normal
        }
    }

    pub fn tariff(&self, kind: TariffKind) -> Tariff {
        match kind {
            TariffKind::Normal => self.normal,
            TariffKind::High => self.high,
        }
    }
}

/// Trip fare under a tariff, rounded to cents.
pub fn fare(tariff: Tariff, km: f64) -> f64 {
    round2(tariff.base + tariff.per_km * km)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_km_trip_under_both_bands() {
        let schedule = TariffSchedule::default();
        assert_eq!(fare(schedule.normal, 5.0), 5.5);
        assert_eq!(fare(schedule.high, 5.0), 8.5);
    }

    #[test]
    fn high_band_starts_at_the_configured_hour() {
        let schedule = TariffSchedule::default();
        assert_eq!(schedule.kind_for_hour(20), TariffKind::Normal);
        assert_eq!(schedule.kind_for_hour(21), TariffKind::High);
        assert_eq!(schedule.kind_for_hour(23), TariffKind::High);
        assert_eq!(schedule.kind_for_hour(0), TariffKind::Normal);
    }
}
