//! Vehicle selection: candidate snapshots, fitness scoring, and pluggable
//! selection policies run under the coordinator's match lock.

mod balanced;
mod fitness;
mod nearest;
mod policy;
mod types;

pub use balanced::BalancedLoad;
pub use fitness::fitness_score;
pub use nearest::NearestVehicle;
pub use policy::SelectionPolicy;
pub use types::{CandidateVehicle, RiderContext, Selection, SelectionReason, SelectionResult};

/// Which selection policy a scenario runs with.
///
/// The two policies use disjoint rationale sets and are never blended:
/// `Nearest` records `distance`/`fitness-tiebreak`, `Balanced` records
/// `balanced`/`tiebreak`/`distance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicyKind {
    #[default]
    Nearest,
    Balanced,
}

impl SelectionPolicyKind {
    pub fn build(self) -> Box<dyn SelectionPolicy> {
        match self {
            SelectionPolicyKind::Nearest => Box::new(NearestVehicle),
            SelectionPolicyKind::Balanced => Box::new(BalancedLoad),
        }
    }
}
