use crate::spatial::{distance_between, round2};

use super::fitness::fitness_score;
use super::policy::SelectionPolicy;
use super::types::{CandidateVehicle, RiderContext, Selection, SelectionReason};

/// Nearest-vehicle selection with a fitness tie-break.
///
/// Ranks available candidates by Euclidean distance to the request origin
/// and picks the minimum. On an exact distance tie the candidate with the
/// highest fitness score wins; earlier roster position wins a full tie.
#[derive(Debug, Default)]
pub struct NearestVehicle;

impl SelectionPolicy for NearestVehicle {
    fn select(&self, rider: &RiderContext, candidates: &[CandidateVehicle]) -> Option<Selection> {
        let ranked: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.available)
            .map(|(i, candidate)| (i, distance_between(candidate.position, rider.origin)))
            .collect();

        let (_, best_distance) = *ranked.iter().min_by(|a, b| a.1.total_cmp(&b.1))?;

        let tied: Vec<usize> = ranked
            .iter()
            .filter(|(_, distance)| *distance == best_distance)
            .map(|(i, _)| *i)
            .collect();

        let (winner, reason) = if tied.len() > 1 {
            let mut winner = tied[0];
            let mut best_fitness = fitness_of(&candidates[winner]);
            for &i in &tied[1..] {
                let fitness = fitness_of(&candidates[i]);
                if fitness > best_fitness {
                    best_fitness = fitness;
                    winner = i;
                }
            }
            (winner, SelectionReason::FitnessTiebreak)
        } else {
            (tied[0], SelectionReason::Distance)
        };

        Some(Selection {
            candidate: winner,
            distance_km: round2(best_distance),
            reason,
        })
    }
}

fn fitness_of(candidate: &CandidateVehicle) -> f64 {
    fitness_score(candidate.rating, candidate.trips_today, candidate.rest_secs)
}
