//! Round-robin tournaments between agent presets.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::evaluation::Evaluator;
use crate::position::Team;
use crate::tune::play_match::{play_match, MatchRecord, MatchSetup};
use crate::tune::presets::Preset;

pub const CSV_HEADER: &str = "agent_a,agent_b,winner,turns,initial_unit_count_team1,initial_unit_count_team2,alive1,alive2,max_hp_team1,max_hp_team2,hp1,hp2";

#[derive(Clone, PartialEq, Debug)]
pub struct BenchmarkOptions {
    pub games_per_pair: usize,
    pub setup: MatchSetup,
    pub workers: usize,
    pub seed: u64,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        BenchmarkOptions {
            games_per_pair: 2,
            setup: MatchSetup::default(),
            workers: 4,
            seed: 0,
        }
    }
}

/// One played game. `agent_a` always plays team one.
#[derive(Clone, PartialEq, Debug)]
pub struct BenchmarkRow {
    pub agent_a: String,
    pub agent_b: String,
    pub record: MatchRecord,
}

impl BenchmarkRow {
    /// Name of the winning preset, if any
    pub fn winner(&self) -> Option<&str> {
        match self.record.winner()? {
            Team::One => Some(&self.agent_a),
            Team::Two => Some(&self.agent_b),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct AgentSummary {
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl AgentSummary {
    pub fn win_rate(&self) -> f32 {
        self.wins as f32 / self.games.max(1) as f32
    }
}

/// Plays `games_per_pair` games for every ordered pair of distinct presets.
/// All games share the same evaluator, and run on a pool of `workers` threads.
pub fn round_robin(
    presets: &[Preset],
    evaluator: Arc<dyn Evaluator>,
    options: &BenchmarkOptions,
) -> Result<Vec<BenchmarkRow>, rayon::ThreadPoolBuildError> {
    let mut games = vec![];
    for (i, a) in presets.iter().enumerate() {
        for (j, b) in presets.iter().enumerate() {
            if i == j {
                continue;
            }
            for _ in 0..options.games_per_pair {
                let seed = options.seed.wrapping_add(games.len() as u64);
                games.push((a, b, seed));
            }
        }
    }
    info!(
        "Benchmarking {} presets over {} games on {} threads",
        presets.len(),
        games.len(),
        options.workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()?;
    let start_time = Instant::now();
    let rows: Vec<BenchmarkRow> = pool.install(|| {
        games
            .into_par_iter()
            .map(|(a, b, seed)| {
                let setup = options.setup.with_seed(seed);
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut team_one = a.config.build(Some(evaluator.clone()), seed);
                    let mut team_two = b.config.build(Some(evaluator.clone()), seed.wrapping_add(1));
                    play_match(setup.build(), &mut *team_one, &mut *team_two, setup.max_turns)
                }));
                let record = match result {
                    Ok(Ok(record)) => record,
                    Ok(Err(err)) => {
                        warn!("{} vs {} failed: {}", a.name, b.name, err);
                        MatchRecord::aborted()
                    }
                    Err(_) => {
                        warn!("{} vs {} panicked", a.name, b.name);
                        MatchRecord::aborted()
                    }
                };
                BenchmarkRow {
                    agent_a: a.name.clone(),
                    agent_b: b.name.clone(),
                    record,
                }
            })
            .collect()
    });
    info!(
        "Played {} games in {:.1}s",
        rows.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(rows)
}

pub fn write_csv<W: Write>(rows: &[BenchmarkRow], mut out: W) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for row in rows {
        let one = row.record.stats(Team::One);
        let two = row.record.stats(Team::Two);
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            row.agent_a,
            row.agent_b,
            row.winner().unwrap_or("draw"),
            row.record.turns,
            one.initial_units,
            two.initial_units,
            one.alive,
            two.alive,
            one.max_health,
            two.max_health,
            one.health,
            two.health
        )?;
    }
    out.flush()
}

/// Aggregates results per preset name, in alphabetical order
pub fn summarize(rows: &[BenchmarkRow]) -> BTreeMap<String, AgentSummary> {
    let mut summaries: BTreeMap<String, AgentSummary> = BTreeMap::new();
    for row in rows {
        let winner = row.record.winner();
        for (name, team) in [(&row.agent_a, Team::One), (&row.agent_b, Team::Two)] {
            let summary = summaries.entry(name.clone()).or_default();
            summary.games += 1;
            match winner {
                Some(winning_team) if winning_team == team => summary.wins += 1,
                Some(_) => summary.losses += 1,
                None => summary.draws += 1,
            }
        }
    }
    summaries
}
