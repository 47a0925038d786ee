use std::fmt;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::position::draft::{deploy, DraftStrategy};
use crate::position::unit::STARTING_FUNDS;
use crate::position::{Board, GameResult, MapKind, Simulation, Team};
use crate::search::{Agent, AgentError};

/// Everything needed to rebuild the starting position of a match
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MatchSetup {
    pub width: usize,
    pub height: usize,
    pub map: MapKind,
    pub funds: u32,
    pub max_turns: u32,
    pub seed: u64,
}

impl Default for MatchSetup {
    fn default() -> Self {
        MatchSetup {
            width: 8,
            height: 8,
            map: MapKind::Random,
            funds: STARTING_FUNDS,
            max_turns: 30,
            seed: 0,
        }
    }
}

impl MatchSetup {
    pub fn with_seed(&self, seed: u64) -> Self {
        MatchSetup {
            seed,
            ..self.clone()
        }
    }

    /// Generates the board and drafts both armies. The same setup always produces the same simulation.
    pub fn build(&self) -> Simulation {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let board = Board::generate(self.map, self.width, self.height, &mut rng);
        let mut sim = Simulation::new(board);
        for team in Team::BOTH {
            let strategy = DraftStrategy::random(&mut rng);
            let army = strategy.draft(self.funds, &mut rng);
            debug!("{} drafted {:?} with the {:?} strategy", team, army, strategy);
            deploy(&mut sim, team, &army);
        }
        sim
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub initial_units: u32,
    pub alive: u32,
    pub max_health: i32,
    pub health: i32,
}

impl TeamStats {
    pub fn of(sim: &Simulation, team: Team) -> Self {
        let units = sim.team_size(team) as u32;
        TeamStats {
            initial_units: units,
            alive: units,
            max_health: sim.units_of(team).map(|unit| unit.max_health).sum(),
            health: sim.team_health(team),
        }
    }

    fn update(&mut self, sim: &Simulation, team: Team) {
        self.alive = sim.team_size(team) as u32;
        self.health = sim.team_health(team);
    }

    pub fn health_ratio(&self) -> f32 {
        self.health.max(0) as f32 / self.max_health.max(1) as f32
    }

    pub fn survival_ratio(&self) -> f32 {
        self.alive as f32 / self.initial_units.max(1) as f32
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `None` if the turn limit was reached first
    pub result: Option<GameResult>,
    pub turns: u32,
    pub stats: [TeamStats; 2],
    /// Set when the match could not be played, and is only recorded as a draw
    pub aborted: bool,
}

impl MatchRecord {
    pub fn aborted() -> Self {
        MatchRecord {
            result: Some(GameResult::Draw),
            turns: 0,
            stats: [TeamStats::default(); 2],
            aborted: true,
        }
    }

    pub fn winner(&self) -> Option<Team> {
        self.result.and_then(GameResult::winner)
    }

    pub fn stats(&self, team: Team) -> &TeamStats {
        &self.stats[team.index()]
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner() {
            Some(team) => write!(f, "{} won after {} turns", team, self.turns)?,
            None => write!(f, "draw after {} turns", self.turns)?,
        }
        for team in Team::BOTH {
            let stats = self.stats(team);
            write!(
                f,
                ", {}: {}/{} units, {}/{} hp",
                team, stats.alive, stats.initial_units, stats.health, stats.max_health
            )?;
        }
        Ok(())
    }
}

/// Plays a match to completion or until `max_turns` rounds have passed.
/// Each round, both teams reset their turn and let their agent act, team one first.
pub fn play_match<'a>(
    mut sim: Simulation,
    team_one: &'a mut dyn Agent,
    team_two: &'a mut dyn Agent,
    max_turns: u32,
) -> Result<MatchRecord, AgentError> {
    let mut stats = [TeamStats::of(&sim, Team::One), TeamStats::of(&sim, Team::Two)];
    let mut turns = 0;

    while turns < max_turns && !sim.is_game_over() {
        turns += 1;
        for (team, agent) in [(Team::One, &mut *team_one), (Team::Two, &mut *team_two)] {
            sim.turn_begin_reset(team);
            let played = agent.play_turn(&mut sim, team)?;
            debug!(
                "Turn {}: {} ({}) played {} actions",
                turns,
                team,
                agent.name(),
                played.len()
            );
            if sim.is_game_over() {
                break;
            }
        }
    }

    for team in Team::BOTH {
        stats[team.index()].update(&sim, team);
    }
    let record = MatchRecord {
        result: sim.game_result(),
        turns,
        stats,
        aborted: false,
    };
    info!("Match finished: {}", record);
    Ok(record)
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GameStats {
    pub team_one_wins: u64,
    pub draws: u64,
    pub team_two_wins: u64,
    pub aborted: u64,
}

impl GameStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut stats = GameStats::default();
        for record in records {
            if record.aborted {
                stats.aborted += 1;
                continue;
            }
            match record.winner() {
                Some(Team::One) => stats.team_one_wins += 1,
                Some(Team::Two) => stats.team_two_wins += 1,
                None => stats.draws += 1,
            }
        }
        stats
    }
}
