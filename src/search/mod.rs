//! Agents that choose and play a full turn for one team.
//!
//! Every agent reasons about complete turns produced by a `Planner`, never about single actions.
//! An agent without an evaluator refuses to act.

use std::sync::Arc;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluation::Evaluator;
use crate::planner::Planner;
use crate::position::{Action, Sequence, Simulation, Team};

pub mod mcts;
pub mod minmax;

pub use mcts::{MctsAgent, MctsSettings, RootArm};
pub use minmax::{MinimaxAgent, MinimaxSettings};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("{0} agent has no evaluator configured")]
    NoEvaluator(&'static str),
}

pub trait Agent {
    fn name(&self) -> &'static str;

    /// Chooses a full turn for `team` and plays it on `sim`. Returns the actions that were applied.
    /// An empty sequence means the agent ends its turn without acting.
    fn play_turn(&mut self, sim: &mut Simulation, team: Team) -> Result<Sequence, AgentError>;
}

pub(crate) fn execute(sim: &mut Simulation, sequence: &[Action]) -> Sequence {
    let applied = sim.apply_sequence(sequence);
    if applied.len() != sequence.len() {
        debug!(
            "{} of {} planned actions could not be applied",
            sequence.len() - applied.len(),
            sequence.len()
        );
    }
    for action in applied.iter() {
        debug!("Played {}", action);
    }
    applied
}

/// Plans with a single planner and plays the best-scoring turn, or a random one with the planner's exploration rate.
pub struct GreedyAgent {
    planner: Planner,
    evaluator: Option<Arc<dyn Evaluator>>,
    rng: SmallRng,
}

impl GreedyAgent {
    pub fn new(planner: Planner, seed: u64) -> Self {
        GreedyAgent {
            planner,
            evaluator: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }
}

impl Agent for GreedyAgent {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn play_turn(&mut self, sim: &mut Simulation, team: Team) -> Result<Sequence, AgentError> {
        let evaluator = self
            .evaluator
            .clone()
            .ok_or(AgentError::NoEvaluator(self.name()))?;
        let sequence = self.planner.plan(sim, team, &*evaluator, &mut self.rng);
        if sequence.is_empty() {
            warn!("No sequence available for {}, ending turn", team);
        }
        Ok(execute(sim, &sequence))
    }
}

/// Serializable description of an agent, so that agents can be rebuilt inside worker threads.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum AgentConfig {
    Greedy(Planner),
    Mcts(MctsSettings),
    Minimax(MinimaxSettings),
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig::Greedy(Planner::default())
    }
}

impl AgentConfig {
    pub fn build(&self, evaluator: Option<Arc<dyn Evaluator>>, seed: u64) -> Box<dyn Agent> {
        match self {
            AgentConfig::Greedy(planner) => {
                let agent = GreedyAgent::new(planner.clone(), seed);
                Box::new(match evaluator {
                    Some(evaluator) => agent.with_evaluator(evaluator),
                    None => agent,
                })
            }
            AgentConfig::Mcts(settings) => {
                let agent = MctsAgent::new(settings.clone(), seed);
                Box::new(match evaluator {
                    Some(evaluator) => agent.with_evaluator(evaluator),
                    None => agent,
                })
            }
            AgentConfig::Minimax(settings) => {
                let agent = MinimaxAgent::new(settings.clone(), seed);
                Box::new(match evaluator {
                    Some(evaluator) => agent.with_evaluator(evaluator),
                    None => agent,
                })
            }
        }
    }

    /// Sets the exploration rate of a greedy agent's planner. Only meant for self-play.
    /// MCTS and minimax always consider every candidate, and are returned unchanged.
    pub fn with_exploration_rate(self, rate: f32) -> Self {
        match self {
            AgentConfig::Greedy(planner) => AgentConfig::Greedy(planner.with_exploration_rate(rate)),
            config => config,
        }
    }
}
