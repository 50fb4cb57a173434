//! Client profiles: trip frequency, derived stars, and the running mean of
//! ratings drivers give each client.

use std::collections::HashMap;

/// Stars are a pure step function of trip frequency.
pub fn stars_for_frequency(frequency: u32) -> u8 {
    match frequency {
        0..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        11..=20 => 4,
        _ => 5,
    }
}

#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub id: String,
    pub name: String,
    /// Completed trips; monotonic, never decremented.
    pub frequency: u32,
    pub stars: u8,
    pub average_rating: f64,
}

impl ClientProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            frequency: 0,
            stars: stars_for_frequency(0),
            average_rating: 5.0,
        }
    }

    /// Folds one completed trip into the profile: bumps the frequency,
    /// recomputes the stars, and updates the running rating mean.
    pub fn record_trip(&mut self, rating: f64) {
        self.frequency += 1;
        self.stars = stars_for_frequency(self.frequency);
        self.average_rating =
            (self.average_rating * (self.frequency - 1) as f64 + rating) / self.frequency as f64;
    }
}

/// Profile registry, owned by the coordinator and mutated only under its
/// settlement lock.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    profiles: HashMap<String, ClientProfile>,
}

impl ClientRegistry {
    /// Looks up a profile, creating a default one on a client's first
    /// request.
    pub fn get_or_create(&mut self, id: &str) -> &mut ClientProfile {
        self.profiles
            .entry(id.to_string())
            .or_insert_with(|| ClientProfile::new(id, id))
    }

    /// Registers an affiliated client under a display name. Overwrites the
    /// placeholder name of an auto-created profile, keeps its history.
    pub fn register(&mut self, id: &str, name: &str) {
        self.get_or_create(id).name = name.to_string();
    }

    pub fn get(&self, id: &str) -> Option<&ClientProfile> {
        self.profiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
