//! Driver fitness score: reputation, load balance, and rest time.

use crate::spatial::round2;

const REPUTATION_WEIGHT: f64 = 0.4;
const LOAD_WEIGHT: f64 = 0.4;
const REST_WEIGHT: f64 = 0.2;

/// Composite driver-ranking score in 0–100, higher is better.
///
/// Reputation maps the 0–5 rating onto 0–100, load drops 10 points per trip
/// already driven today, and rest saturates after one idle hour.
pub fn fitness_score(rating: f64, trips_today: u32, rest_secs: f64) -> f64 {
    let reputation = rating * 20.0;
    let load = (100.0 - trips_today as f64 * 10.0).max(0.0);
    let rest = (rest_secs / 36.0).min(100.0);
    round2(reputation * REPUTATION_WEIGHT + load * LOAD_WEIGHT + rest * REST_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_rested_driver_scores_a_clean_hundred() {
        assert_eq!(fitness_score(5.0, 0, 3600.0), 100.0);
    }

    #[test]
    fn load_term_floors_at_zero() {
        // 15 trips would be -50 load; the term clamps so the composite
        // still reflects reputation and rest.
        assert_eq!(fitness_score(5.0, 15, 3600.0), 60.0);
    }

    #[test]
    fn rest_term_saturates_after_an_hour() {
        let one_hour = fitness_score(4.0, 2, 3600.0);
        let two_hours = fitness_score(4.0, 2, 7200.0);
        assert_eq!(one_hour, two_hours);
    }

    #[test]
    fn busier_driver_scores_lower() {
        let idle = fitness_score(4.5, 0, 1800.0);
        let busy = fitness_score(4.5, 6, 1800.0);
        assert!(busy < idle);
    }
}
