//! Alpha-beta search where every ply is a full turn.
//!
//! Candidate turns are planned once per acting team and decision, and reused at every node where that team acts.
//! At each node, only the `child_limit` candidates with the best one-ply evaluation are searched.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluator;
use crate::planner::{DfsPlanner, Planner};
use crate::position::{Sequence, Simulation, Team};
use crate::search::{execute, Agent, AgentError};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MinimaxSettings {
    pub planner: Planner,
    pub depth: u32,
    pub child_limit: usize,
    /// Disabling the cutoffs gives a plain minimax search over the same children
    pub alpha_beta: bool,
}

impl Default for MinimaxSettings {
    fn default() -> Self {
        MinimaxSettings {
            planner: Planner::Dfs(DfsPlanner::default()),
            depth: 2,
            child_limit: 2,
            alpha_beta: true,
        }
    }
}

impl MinimaxSettings {
    pub fn add_planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    pub fn add_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn add_child_limit(mut self, child_limit: usize) -> Self {
        self.child_limit = child_limit;
        self
    }

    pub fn add_alpha_beta(mut self, alpha_beta: bool) -> Self {
        self.alpha_beta = alpha_beta;
        self
    }
}

pub struct MinimaxAgent {
    settings: MinimaxSettings,
    evaluator: Option<Arc<dyn Evaluator>>,
    rng: SmallRng,
}

impl MinimaxAgent {
    pub fn new(settings: MinimaxSettings, seed: u64) -> Self {
        MinimaxAgent {
            settings,
            evaluator: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn settings(&self) -> &MinimaxSettings {
        &self.settings
    }

    /// Returns the best root sequence and its minimax value, or `None` if there is nothing to search.
    pub fn search(
        &mut self,
        sim: &Simulation,
        team: Team,
    ) -> Result<Option<(Sequence, f32)>, AgentError> {
        let evaluator = self
            .evaluator
            .clone()
            .ok_or(AgentError::NoEvaluator(self.name()))?;
        let start_time = Instant::now();
        let mut search = Search {
            settings: &self.settings,
            evaluator: &*evaluator,
            rng: &mut self.rng,
            perspective: team,
            sequence_cache: HashMap::new(),
            nodes: 0,
        };
        let result = search.root(sim);
        info!(
            "Minimax searched {} nodes to depth {} in {:.3}s",
            search.nodes,
            self.settings.depth,
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

impl Agent for MinimaxAgent {
    fn name(&self) -> &'static str {
        "Minimax"
    }

    fn play_turn(&mut self, sim: &mut Simulation, team: Team) -> Result<Sequence, AgentError> {
        match self.search(sim, team)? {
            Some((sequence, value)) => {
                info!(
                    "Playing sequence of {} actions with value {:.4}",
                    sequence.len(),
                    value
                );
                Ok(execute(sim, &sequence))
            }
            None => {
                warn!("No sequences available for {}, ending turn", team);
                Ok(vec![])
            }
        }
    }
}

/// State of a single top-level decision
struct Search<'a> {
    settings: &'a MinimaxSettings,
    evaluator: &'a dyn Evaluator,
    rng: &'a mut SmallRng,
    /// The side the agent plays. All evaluations are from this side's point of view.
    perspective: Team,
    sequence_cache: HashMap<Team, Vec<Sequence>>,
    nodes: u64,
}

impl Search<'_> {
    fn evaluate(&self, sim: &Simulation) -> f32 {
        self.evaluator.score(&sim.snapshot(), self.perspective)
    }

    fn root(&mut self, sim: &Simulation) -> Option<(Sequence, f32)> {
        let children = self.children(sim.clone(), self.perspective, true);
        let mut alpha = f32::NEG_INFINITY;
        let mut best: Option<(Sequence, f32)> = None;
        for (sequence, child) in children {
            let value = self.minimax(
                &child,
                self.settings.depth.saturating_sub(1),
                alpha,
                f32::INFINITY,
                false,
            );
            debug!("Root sequence of {} actions has value {:.4}", sequence.len(), value);
            if best.as_ref().map_or(true, |(_, best_value)| value > *best_value) {
                best = Some((sequence, value));
            }
            if self.settings.alpha_beta {
                alpha = alpha.max(value);
            }
        }
        best
    }

    fn minimax(
        &mut self,
        sim: &Simulation,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
        maximizing: bool,
    ) -> f32 {
        self.nodes += 1;
        if depth == 0 || sim.is_game_over() {
            return self.evaluate(sim);
        }
        let acting = if maximizing {
            self.perspective
        } else {
            !self.perspective
        };
        let mut node = sim.clone();
        node.turn_begin_reset(acting);
        let children = self.children(node, acting, maximizing);
        if children.is_empty() {
            return self.evaluate(sim);
        }

        if maximizing {
            let mut value = f32::NEG_INFINITY;
            for (_, child) in children {
                value = value.max(self.minimax(&child, depth - 1, alpha, beta, false));
                if self.settings.alpha_beta {
                    alpha = alpha.max(value);
                    if alpha >= beta {
                        break;
                    }
                }
            }
            value
        } else {
            let mut value = f32::INFINITY;
            for (_, child) in children {
                value = value.min(self.minimax(&child, depth - 1, alpha, beta, true));
                if self.settings.alpha_beta {
                    beta = beta.min(value);
                    if alpha >= beta {
                        break;
                    }
                }
            }
            value
        }
    }

    /// Plays every cached candidate turn of `acting` on `node`, and keeps the `child_limit` most promising ones,
    /// ordered by the acting side's preference.
    fn children(
        &mut self,
        node: Simulation,
        acting: Team,
        maximizing: bool,
    ) -> Vec<(Sequence, Simulation)> {
        let planner = &self.settings.planner;
        let evaluator = self.evaluator;
        let rng = &mut *self.rng;
        let sequences = self
            .sequence_cache
            .entry(acting)
            .or_insert_with(|| planner.plan_sequences(&node, acting, evaluator, rng))
            .clone();

        let mut scored: Vec<(Sequence, Simulation, f32)> = sequences
            .into_iter()
            .map(|sequence| {
                let mut child = node.clone();
                child.apply_sequence(&sequence);
                let score = evaluator.score(&child.snapshot(), self.perspective);
                (sequence, child, score)
            })
            .collect();
        if maximizing {
            scored.sort_by(|(_, _, a), (_, _, b)| b.total_cmp(a));
        } else {
            scored.sort_by(|(_, _, a), (_, _, b)| a.total_cmp(b));
        }
        scored.truncate(self.settings.child_limit.max(1));
        scored
            .into_iter()
            .map(|(sequence, child, _)| (sequence, child))
            .collect()
    }
}
