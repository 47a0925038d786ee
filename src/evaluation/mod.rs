//! Static evaluation of simulation snapshots.

use std::sync::Arc;

use crate::position::{Snapshot, Team};

pub mod features;
mod material;
pub mod network;

pub use material::MaterialEvaluator;
pub use network::Network;

/// Scores a snapshot from the perspective of `team`. Higher is better for `team`.
///
/// Implementations must be deterministic, since searches compare scores across many calls.
pub trait Evaluator: Send + Sync {
    fn score(&self, snapshot: &Snapshot, team: Team) -> f32;
}

impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn score(&self, snapshot: &Snapshot, team: Team) -> f32 {
        (**self).score(snapshot, team)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn score(&self, snapshot: &Snapshot, team: Team) -> f32 {
        (**self).score(snapshot, team)
    }
}
