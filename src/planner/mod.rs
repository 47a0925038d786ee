//! Full-turn planners. Both strategies turn the legal-action tree of one team into a list of complete turns.
//!
//! Planners never touch the caller's simulation, and plan from its current turn state.
//! Callers must reset the team's turn first if they want a fresh turn.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluator;
use crate::position::{Action, Sequence, Simulation, Team};

mod beam;
mod dfs;

pub use beam::BeamPlanner;
pub use dfs::DfsPlanner;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Planner {
    Dfs(DfsPlanner),
    Beam(BeamPlanner),
}

impl Default for Planner {
    fn default() -> Self {
        Planner::Dfs(DfsPlanner::default())
    }
}

impl Planner {
    pub fn plan_sequences<R: Rng>(
        &self,
        sim: &Simulation,
        team: Team,
        evaluator: &dyn Evaluator,
        rng: &mut R,
    ) -> Vec<Sequence> {
        match self {
            Planner::Dfs(dfs) => dfs.plan_sequences(sim, team, rng),
            Planner::Beam(beam) => beam.plan_sequences(sim, team, evaluator, rng),
        }
    }

    /// Probability of playing a uniformly random candidate instead of the best one
    pub fn exploration_rate(&self) -> f32 {
        match self {
            Planner::Dfs(dfs) => dfs.exploration_rate,
            Planner::Beam(beam) => beam.exploration_rate,
        }
    }

    pub fn with_exploration_rate(mut self, rate: f32) -> Self {
        match &mut self {
            Planner::Dfs(dfs) => dfs.exploration_rate = rate,
            Planner::Beam(beam) => beam.exploration_rate = rate,
        }
        self
    }

    /// Picks one full turn: the best-scoring candidate, or a random one with the exploration probability.
    /// Returns an empty sequence if the team cannot act.
    pub fn plan<R: Rng>(
        &self,
        sim: &Simulation,
        team: Team,
        evaluator: &dyn Evaluator,
        rng: &mut R,
    ) -> Sequence {
        let sequences = self.plan_sequences(sim, team, evaluator, rng);
        if sequences.is_empty() {
            return vec![];
        }
        if rng.gen::<f32>() < self.exploration_rate() {
            debug!("Exploring: picking a random sequence out of {}", sequences.len());
            return sequences.choose(rng).cloned().unwrap_or_default();
        }
        rank_sequences(sim, team, sequences, evaluator)
            .into_iter()
            .next()
            .map(|(sequence, _)| sequence)
            .unwrap_or_default()
    }
}

/// Score of the position reached by playing `sequence` on a copy of `sim`
pub fn score_sequence(
    sim: &Simulation,
    team: Team,
    sequence: &[Action],
    evaluator: &dyn Evaluator,
) -> f32 {
    let mut replay = sim.clone();
    replay.apply_sequence(sequence);
    evaluator.score(&replay.snapshot(), team)
}

/// Scores every sequence and sorts them best-first. Equal scores keep their original order.
pub fn rank_sequences(
    sim: &Simulation,
    team: Team,
    sequences: Vec<Sequence>,
    evaluator: &dyn Evaluator,
) -> Vec<(Sequence, f32)> {
    let mut scored: Vec<(Sequence, f32)> = sequences
        .into_iter()
        .map(|sequence| {
            let score = score_sequence(sim, team, &sequence, evaluator);
            (sequence, score)
        })
        .collect();
    scored.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    scored
}
