use crate::spatial::{distance_between, round2};

use super::policy::SelectionPolicy;
use super::types::{CandidateVehicle, RiderContext, Selection, SelectionReason};

/// Score margin below which two candidates count as tied.
const SCORE_EPSILON: f64 = 1e-6;

/// Penalty added per trip a candidate has driven beyond today's minimum.
const EXCESS_TRIP_PENALTY: f64 = 0.5;

/// Bonus granted to the least-loaded candidates.
const LEAST_LOADED_BONUS: f64 = 0.25;

/// Load-balancing selection: distance plus a workload-spread penalty.
///
/// Candidates carrying more trips than today's minimum are penalized
/// proportionally to the excess, and the least-loaded candidates get a
/// small bonus, so daily work evens out across the fleet. The minimum
/// combined score wins; earlier roster position wins a full tie.
#[derive(Debug, Default)]
pub struct BalancedLoad;

impl SelectionPolicy for BalancedLoad {
    fn select(&self, rider: &RiderContext, candidates: &[CandidateVehicle]) -> Option<Selection> {
        let available: Vec<(usize, &CandidateVehicle)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.available)
            .collect();

        let min_trips = available
            .iter()
            .map(|(_, candidate)| candidate.trips_today)
            .min()?;
        let max_trips = available
            .iter()
            .map(|(_, candidate)| candidate.trips_today)
            .max()
            .unwrap_or(min_trips);
        let spread = max_trips - min_trips;

        let scored: Vec<(usize, f64, f64)> = available
            .iter()
            .map(|(i, candidate)| {
                let distance = distance_between(candidate.position, rider.origin);
                let excess = (candidate.trips_today - min_trips) as f64;
                let mut score = distance + excess * EXCESS_TRIP_PENALTY;
                if candidate.trips_today == min_trips {
                    score -= LEAST_LOADED_BONUS;
                }
                (*i, score, distance)
            })
            .collect();

        let &(winner, best_score, distance) =
            scored.iter().min_by(|a, b| a.1.total_cmp(&b.1))?;
        let runner_up = scored
            .iter()
            .filter(|(i, _, _)| *i != winner)
            .map(|(_, score, _)| *score)
            .min_by(f64::total_cmp);

        let reason = if spread > 0 && candidates[winner].trips_today == min_trips {
            SelectionReason::Balanced
        } else if matches!(runner_up, Some(second) if (second - best_score).abs() <= SCORE_EPSILON)
        {
            SelectionReason::Tiebreak
        } else {
            SelectionReason::Distance
        };

        Some(Selection {
            candidate: winner,
            distance_km: round2(distance),
            reason,
        })
    }
}
