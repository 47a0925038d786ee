use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluator;
use crate::position::{Sequence, Simulation, Team};

/// Breadth-first planning that keeps only the `beam_width` best partial turns at each depth.
/// Each node owns its own copy of the simulation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BeamPlanner {
    pub beam_width: usize,
    pub branching_limit: usize,
    pub max_depth: usize,
    pub exploration_rate: f32,
}

impl Default for BeamPlanner {
    fn default() -> Self {
        BeamPlanner {
            beam_width: 12,
            branching_limit: 16,
            max_depth: 32,
            exploration_rate: 0.0,
        }
    }
}

struct BeamNode {
    sim: Simulation,
    sequence: Sequence,
    score: f32,
}

impl BeamPlanner {
    pub fn new(beam_width: usize, branching_limit: usize) -> Self {
        BeamPlanner {
            beam_width,
            branching_limit,
            ..Default::default()
        }
    }

    /// Returns finished turns sorted best-first. If no turn finished within `max_depth`,
    /// the last frontier is returned instead.
    pub fn plan_sequences<R: Rng>(
        &self,
        sim: &Simulation,
        team: Team,
        evaluator: &dyn Evaluator,
        rng: &mut R,
    ) -> Vec<Sequence> {
        let mut beam = vec![BeamNode {
            score: evaluator.score(&sim.snapshot(), team),
            sim: sim.clone(),
            sequence: vec![],
        }];
        let mut finished: Vec<BeamNode> = vec![];

        for _ in 0..self.max_depth {
            if beam.is_empty() {
                break;
            }
            let mut candidates = vec![];
            for node in beam {
                if node.sim.is_turn_over(team) || node.sim.is_game_over() {
                    finished.push(node);
                    continue;
                }
                let mut actions = node.sim.legal_actions(team);
                if actions.is_empty() {
                    finished.push(node);
                    continue;
                }
                actions.shuffle(rng);
                actions.truncate(self.branching_limit.max(1));
                for action in actions {
                    let mut child = node.sim.clone();
                    if !child.apply(action) {
                        continue;
                    }
                    let mut sequence = node.sequence.clone();
                    sequence.push(action);
                    candidates.push(BeamNode {
                        score: evaluator.score(&child.snapshot(), team),
                        sim: child,
                        sequence,
                    });
                }
            }
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(self.beam_width.max(1));
            beam = candidates;
        }

        if finished.is_empty() {
            finished = beam;
        }
        finished.sort_by(|a, b| b.score.total_cmp(&a.score));
        finished.into_iter().map(|node| node.sequence).collect()
    }
}
