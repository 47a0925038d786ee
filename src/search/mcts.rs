//! Monte Carlo search over root moves only.
//!
//! The planner's full turns are the arms of a flat multi-armed bandit. Each iteration picks an arm with UCB1,
//! plays it on a fresh copy of the position, continues with a few turns of uniformly random play for both sides,
//! and backs the evaluation up into that arm. There is no tree below the root,
//! since generating full turns is by far the most expensive step.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluator;
use crate::planner::{rank_sequences, DfsPlanner, Planner};
use crate::position::{Sequence, Simulation, Team};
use crate::search::{execute, Agent, AgentError};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MctsSettings {
    pub planner: Planner,
    pub max_root_children: usize,
    pub iterations: u32,
    pub rollout_turns: u32,
    pub c_puct: f32,
    /// Stop iterating early once this much time has passed
    pub time_limit: Option<Duration>,
}

impl Default for MctsSettings {
    fn default() -> Self {
        MctsSettings {
            planner: Planner::Dfs(DfsPlanner::new(200, 20)),
            max_root_children: 8,
            iterations: 80,
            rollout_turns: 2,
            c_puct: 1.4,
            time_limit: None,
        }
    }
}

impl MctsSettings {
    pub fn add_planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    pub fn add_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn add_root_children(mut self, max_root_children: usize) -> Self {
        self.max_root_children = max_root_children;
        self
    }

    pub fn add_rollout_turns(mut self, rollout_turns: u32) -> Self {
        self.rollout_turns = rollout_turns;
        self
    }

    pub fn add_exploration(mut self, c_puct: f32) -> Self {
        self.c_puct = c_puct;
        self
    }

    pub fn add_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = Some(time_limit);
        self
    }
}

/// One candidate full turn at the root, with its bandit statistics
#[derive(Clone, PartialEq, Debug)]
pub struct RootArm {
    pub sequence: Sequence,
    /// Static evaluation after playing the sequence, used to select the arms
    pub prior: f32,
    pub visits: u32,
    pub value_sum: f32,
}

impl RootArm {
    pub fn mean_value(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f32
        }
    }

    fn ucb(&self, log_total: f32, c_puct: f32) -> f32 {
        if self.visits == 0 {
            f32::INFINITY
        } else {
            self.mean_value() + c_puct * (log_total / self.visits as f32).sqrt()
        }
    }
}

/// The arm to play: most visits, ties broken by mean value, then by the earliest arm.
pub fn best_arm(arms: &[RootArm]) -> Option<&RootArm> {
    arms.iter().reduce(|best, arm| {
        if (arm.visits, arm.mean_value()) > (best.visits, best.mean_value()) {
            arm
        } else {
            best
        }
    })
}

pub struct MctsAgent {
    settings: MctsSettings,
    evaluator: Option<Arc<dyn Evaluator>>,
    rng: SmallRng,
}

impl MctsAgent {
    pub fn new(settings: MctsSettings, seed: u64) -> Self {
        MctsAgent {
            settings,
            evaluator: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn settings(&self) -> &MctsSettings {
        &self.settings
    }

    /// Runs the bandit search without playing anything, and returns the root arms with their statistics.
    pub fn search(&mut self, sim: &Simulation, team: Team) -> Result<Vec<RootArm>, AgentError> {
        let evaluator = self
            .evaluator
            .clone()
            .ok_or(AgentError::NoEvaluator(self.name()))?;
        let mut arms = self.root_arms(sim, team, &*evaluator);
        if arms.is_empty() {
            return Ok(arms);
        }

        let start_time = Instant::now();
        let mut total_visits: u32 = 0;
        for _ in 0..self.settings.iterations {
            if let Some(time_limit) = self.settings.time_limit {
                if total_visits > 0 && start_time.elapsed() >= time_limit {
                    debug!("Time limit reached after {} iterations", total_visits);
                    break;
                }
            }
            let log_total = (total_visits as f32 + 1.0).ln();
            let mut best_index = 0;
            let mut best_ucb = f32::NEG_INFINITY;
            for (i, arm) in arms.iter().enumerate() {
                let ucb = arm.ucb(log_total, self.settings.c_puct);
                if ucb > best_ucb {
                    best_ucb = ucb;
                    best_index = i;
                }
            }

            let mut playout = sim.clone();
            playout.apply_sequence(&arms[best_index].sequence);
            let value = self.rollout(playout, team, &*evaluator);

            let arm = &mut arms[best_index];
            arm.visits += 1;
            arm.value_sum += value;
            total_visits += 1;
        }

        info!(
            "MCTS ran {} iterations over {} root moves in {:.3}s",
            total_visits,
            arms.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(arms)
    }

    fn root_arms(&mut self, sim: &Simulation, team: Team, evaluator: &dyn Evaluator) -> Vec<RootArm> {
        let start_time = Instant::now();
        let sequences = self
            .settings
            .planner
            .plan_sequences(sim, team, evaluator, &mut self.rng);
        debug!(
            "Planner generated {} sequences for {} in {:.3}s",
            sequences.len(),
            team,
            start_time.elapsed().as_secs_f64()
        );

        let mut ranked = rank_sequences(sim, team, sequences, evaluator);
        if self.settings.max_root_children > 0 {
            ranked.truncate(self.settings.max_root_children);
        }
        ranked
            .into_iter()
            .map(|(sequence, prior)| RootArm {
                sequence,
                prior,
                visits: 0,
                value_sum: 0.0,
            })
            .collect()
    }

    /// Plays random full turns for both sides, starting with the opponent,
    /// and evaluates the final position from `team`'s perspective.
    fn rollout(&mut self, mut sim: Simulation, team: Team, evaluator: &dyn Evaluator) -> f32 {
        let mut current = !team;
        for _ in 0..self.settings.rollout_turns {
            if sim.is_game_over() {
                break;
            }
            sim.turn_begin_reset(current);
            while !sim.turn_end(current) {
                let actions = sim.legal_actions(current);
                let Some(action) = actions.choose(&mut self.rng) else {
                    break;
                };
                if !sim.apply(*action) || sim.is_game_over() {
                    break;
                }
            }
            current = !current;
        }
        evaluator.score(&sim.snapshot(), team)
    }
}

impl Agent for MctsAgent {
    fn name(&self) -> &'static str {
        "MCTS"
    }

    fn play_turn(&mut self, sim: &mut Simulation, team: Team) -> Result<Sequence, AgentError> {
        let arms = self.search(sim, team)?;
        let Some(best) = best_arm(&arms) else {
            warn!("No sequences available for {}, ending turn", team);
            return Ok(vec![]);
        };
        info!(
            "Playing sequence of {} actions: {} visits, mean value {:.4}",
            best.sequence.len(),
            best.visits,
            best.mean_value()
        );
        Ok(execute(sim, &best.sequence))
    }
}
