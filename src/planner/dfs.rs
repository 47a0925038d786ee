use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::position::{Sequence, Simulation, Team};

/// Depth-first enumeration of full turns.
///
/// Mutates a single private copy of the simulation in place, undoing each action after recursing.
/// Legal actions are shuffled before being cut down to `max_branching`, so truncation is not biased
/// towards any particular unit or action kind.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DfsPlanner {
    pub max_sets: usize,
    pub max_branching: usize,
    pub max_depth: usize,
    pub exploration_rate: f32,
}

impl Default for DfsPlanner {
    fn default() -> Self {
        DfsPlanner {
            max_sets: 500,
            max_branching: 14,
            max_depth: 64,
            exploration_rate: 0.0,
        }
    }
}

impl DfsPlanner {
    pub fn new(max_sets: usize, max_branching: usize) -> Self {
        DfsPlanner {
            max_sets,
            max_branching,
            ..Default::default()
        }
    }

    pub fn plan_sequences<R: Rng>(&self, sim: &Simulation, team: Team, rng: &mut R) -> Vec<Sequence> {
        let mut scratch = sim.clone();
        let mut sequences = vec![];
        let mut current = vec![];
        self.search(&mut scratch, team, &mut current, &mut sequences, rng);
        debug_assert_eq!(&scratch, sim, "Simulation was not restored after planning");
        sequences
    }

    fn search<R: Rng>(
        &self,
        sim: &mut Simulation,
        team: Team,
        current: &mut Sequence,
        sequences: &mut Vec<Sequence>,
        rng: &mut R,
    ) {
        if sequences.len() >= self.max_sets {
            return;
        }
        if current.len() >= self.max_depth || sim.is_turn_over(team) || sim.is_game_over() {
            sequences.push(current.clone());
            return;
        }
        let mut actions = sim.legal_actions(team);
        if actions.is_empty() {
            sequences.push(current.clone());
            return;
        }
        actions.shuffle(rng);
        actions.truncate(self.max_branching.max(1));

        for action in actions {
            if sequences.len() >= self.max_sets {
                break;
            }
            let Some(patch) = sim.do_action(action) else {
                continue;
            };
            current.push(action);
            self.search(sim, team, current, sequences, rng);
            current.pop();
            sim.undo(patch);
        }
    }
}
