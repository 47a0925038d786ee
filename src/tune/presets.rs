//! Named agent configurations for benchmarking.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::planner::{DfsPlanner, Planner};
use crate::search::{AgentConfig, MctsSettings, MinimaxSettings};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub config: AgentConfig,
}

impl Preset {
    pub fn new(name: &str, config: AgentConfig) -> Self {
        Preset {
            name: name.to_string(),
            config,
        }
    }
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to read presets: {0}")]
    Io(#[from] io::Error),
    #[error("malformed presets: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("preset file contains no presets")]
    Empty,
}

fn mcts(
    max_sets: usize,
    max_branching: usize,
    root_children: usize,
    iterations: u32,
    rollout_turns: u32,
    c_puct: f32,
) -> AgentConfig {
    AgentConfig::Mcts(
        MctsSettings::default()
            .add_planner(Planner::Dfs(DfsPlanner::new(max_sets, max_branching)))
            .add_root_children(root_children)
            .add_iterations(iterations)
            .add_rollout_turns(rollout_turns)
            .add_exploration(c_puct),
    )
}

fn minimax(depth: u32, child_limit: usize) -> AgentConfig {
    AgentConfig::Minimax(
        MinimaxSettings::default()
            .add_depth(depth)
            .add_child_limit(child_limit),
    )
}

pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new("MCTS_default", mcts(300, 20, 10, 100, 3, 1.4)),
        Preset::new("MCTS_fast", mcts(100, 10, 4, 30, 1, 1.2)),
        Preset::new("MCTS_deep", mcts(500, 30, 20, 150, 4, 1.6)),
        Preset::new("Minimax_default", minimax(2, 2)),
        Preset::new("Minimax_deep", minimax(3, 3)),
        Preset::new("Minimax_wide", minimax(2, 4)),
        Preset::new("Greedy", AgentConfig::Greedy(Planner::default())),
    ]
}

/// Reads a JSON list of presets, which replaces the built-in ones
pub fn load_presets<P: AsRef<Path>>(path: P) -> Result<Vec<Preset>, PresetError> {
    let contents = fs::read_to_string(path)?;
    let presets: Vec<Preset> = serde_json::from_str(&contents)?;
    if presets.is_empty() {
        return Err(PresetError::Empty);
    }
    Ok(presets)
}

pub fn save_presets<P: AsRef<Path>>(presets: &[Preset], path: P) -> Result<(), PresetError> {
    fs::write(path, serde_json::to_string_pretty(presets)?)?;
    Ok(())
}
