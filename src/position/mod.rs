//! The simulation substrate: board, units, and the rules for applying actions.
//!
//! `Simulation` is the only type allowed to mutate unit state. Searches either clone it,
//! or use `do_action`/`undo` to mutate it in place and restore it exactly.

use std::fmt;
use std::ops;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

pub mod combat;
pub mod draft;
pub mod pathing;
pub mod terrain;
pub mod unit;

pub use terrain::{Board, MapKind, Terrain};
pub use unit::{MovePoints, Unit, UnitId, UnitKind};

use unit::UnitState;

/// One of the two sides of a match
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::One, Team::Two];

    /// The numeric id, 1 or 2
    pub fn id(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Team> {
        match id {
            1 => Some(Team::One),
            2 => Some(Team::Two),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.id() as usize - 1
    }
}

impl ops::Not for Team {
    type Output = Team;

    fn not(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.id())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Action {
    Move { unit: UnitId, x: i32, y: i32 },
    Attack { unit: UnitId, target: UnitId },
    Wait { unit: UnitId },
}

impl Action {
    /// The unit carrying out the action
    pub fn unit(self) -> UnitId {
        match self {
            Action::Move { unit, .. } | Action::Attack { unit, .. } | Action::Wait { unit } => unit,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { unit, x, y } => write!(f, "#{} moves to ({}, {})", unit, x, y),
            Action::Attack { unit, target } => write!(f, "#{} attacks #{}", unit, target),
            Action::Wait { unit } => write!(f, "#{} waits", unit),
        }
    }
}

/// A candidate full turn: actions applied one after another for a single team
pub type Sequence = Vec<Action>;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GameResult {
    Win(Team),
    Draw,
}

impl GameResult {
    pub fn winner(self) -> Option<Team> {
        match self {
            GameResult::Win(team) => Some(team),
            GameResult::Draw => None,
        }
    }
}

/// The counterpart of an `Action`. When passed to `Simulation::undo`, it fully reverses the accompanying action,
/// including reviving any unit the action removed.
///
/// A patch must be handed back to the simulation it came from, in reverse order of creation.
/// Use `commit` to keep the action instead.
#[must_use = "a patch must either be undone or committed"]
#[derive(PartialEq, Debug)]
pub struct Patch {
    saved: ArrayVec<(UnitId, UnitState), 2>,
    // Ascending by index in the unit list before removal
    removed: ArrayVec<(usize, Unit), 2>,
}

impl Patch {
    fn saving(units: &[&Unit]) -> Self {
        Patch {
            saved: units.iter().map(|unit| (unit.id, unit.state())).collect(),
            removed: ArrayVec::new(),
        }
    }

    /// Keep the action, discarding the means to reverse it
    pub fn commit(self) {}

    /// Number of units the action removed from the board
    pub fn casualties(&self) -> usize {
        self.removed.len()
    }
}

/// Read-only projection of a simulation, passed to evaluators
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Snapshot<'a> {
    pub board: &'a Board,
    pub units: &'a [Unit],
}

impl<'a> Snapshot<'a> {
    pub fn allies(&self, team: Team) -> impl Iterator<Item = &'a Unit> {
        self.units.iter().filter(move |unit| unit.team == team)
    }

    pub fn enemies(&self, team: Team) -> impl Iterator<Item = &'a Unit> {
        self.units.iter().filter(move |unit| unit.team != team)
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Simulation {
    board: Board,
    units: Vec<Unit>,
    next_id: UnitId,
}

impl Simulation {
    pub fn new(board: Board) -> Self {
        Simulation {
            board,
            units: vec![],
            next_id: 1,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == id)
    }

    pub fn unit_at(&self, x: i32, y: i32) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.x == x && unit.y == y)
    }

    pub fn units_of(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |unit| unit.team == team)
    }

    pub fn team_size(&self, team: Team) -> usize {
        self.units_of(team).count()
    }

    pub fn team_health(&self, team: Team) -> i32 {
        self.units_of(team).map(|unit| unit.health).sum()
    }

    /// Whether a unit could be placed on the tile
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.board.get(x, y).is_some_and(Terrain::is_passable) && self.unit_at(x, y).is_none()
    }

    /// Places a fresh unit with full move points. Returns `None` if the tile is taken or impassable.
    pub fn add_unit(&mut self, kind: UnitKind, team: Team, x: i32, y: i32) -> Option<UnitId> {
        if !self.is_free(x, y) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.units.push(Unit::new(id, kind, team, x, y));
        Some(id)
    }

    #[cfg(test)]
    pub(crate) fn set_health(&mut self, id: UnitId, health: i32) {
        if let Some(index) = self.unit_index(id) {
            self.units[index].health = health;
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: &self.board,
            units: &self.units,
        }
    }

    pub fn generate_actions(&self, team: Team, actions: &mut Vec<Action>) {
        for unit in self.units_of(team).filter(|unit| unit.can_act()) {
            for (x, y, _) in pathing::reachable_tiles(self, (unit.x, unit.y), unit.move_points) {
                actions.push(Action::Move {
                    unit: unit.id,
                    x,
                    y,
                });
            }
            for enemy in self
                .units
                .iter()
                .filter(|other| other.team != team && unit.in_attack_range(other))
            {
                actions.push(Action::Attack {
                    unit: unit.id,
                    target: enemy.id,
                });
            }
            actions.push(Action::Wait { unit: unit.id });
        }
    }

    pub fn legal_actions(&self, team: Team) -> Vec<Action> {
        let mut actions = vec![];
        self.generate_actions(team, &mut actions);
        actions
    }

    /// Applies the action if its preconditions hold. On failure, the simulation is unchanged.
    pub fn apply(&mut self, action: Action) -> bool {
        self.do_action(action).map(Patch::commit).is_some()
    }

    /// Applies actions in order, skipping the ones that fail, until the game is over.
    /// Returns the actions that were applied.
    pub fn apply_sequence(&mut self, sequence: &[Action]) -> Sequence {
        let mut applied = vec![];
        for action in sequence {
            if self.is_game_over() {
                break;
            }
            if self.apply(*action) {
                applied.push(*action);
            }
        }
        applied
    }

    /// Reversible version of `apply`. Returns `None`, leaving the simulation unchanged, if the action is illegal.
    pub fn do_action(&mut self, action: Action) -> Option<Patch> {
        match action {
            Action::Move { unit, x, y } => {
                let index = self.unit_index(unit)?;
                let mover = &self.units[index];
                if !mover.can_act() || !self.is_free(x, y) {
                    return None;
                }
                let cost = pathing::path_cost(self, (mover.x, mover.y), (x, y))?;
                if cost > mover.move_points {
                    return None;
                }
                let patch = Patch::saving(&[mover]);

                let mover = &mut self.units[index];
                mover.x = x;
                mover.y = y;
                mover.move_points -= cost;
                if mover.move_points == 0 {
                    mover.has_acted = true;
                }
                Some(patch)
            }
            Action::Attack { unit, target } => {
                let attacker_index = self.unit_index(unit)?;
                let defender_index = self.unit_index(target)?;
                let attacker = &self.units[attacker_index];
                let defender = &self.units[defender_index];
                if !attacker.can_act()
                    || attacker.team == defender.team
                    || !attacker.in_attack_range(defender)
                {
                    return None;
                }
                let exchange = combat::resolve(&self.board, attacker, defender);
                let mut patch = Patch::saving(&[attacker, defender]);

                self.units[defender_index].health -= exchange.dealt;
                let attacker = &mut self.units[attacker_index];
                attacker.health -= exchange.retaliation;
                attacker.has_attacked = true;
                attacker.move_points = 0;

                self.remove_dead(&mut patch);
                Some(patch)
            }
            Action::Wait { unit } => {
                let index = self.unit_index(unit)?;
                if self.units[index].has_acted {
                    return None;
                }
                let patch = Patch::saving(&[&self.units[index]]);
                self.units[index].has_acted = true;
                Some(patch)
            }
        }
    }

    /// Reverses the action that produced `patch`.
    pub fn undo(&mut self, patch: Patch) {
        for (index, unit) in patch.removed {
            self.units.insert(index, unit);
        }
        for (id, state) in patch.saved.iter() {
            if let Some(index) = self.unit_index(*id) {
                self.units[index].restore(state);
            }
        }
    }

    fn remove_dead(&mut self, patch: &mut Patch) {
        let dead: ArrayVec<usize, 2> = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, unit)| !unit.is_alive())
            .map(|(index, _)| index)
            .take(2)
            .collect();
        for &index in dead.iter().rev() {
            let unit = self.units.remove(index);
            patch.removed.insert(0, (index, unit));
        }
    }

    /// Restores move points and clears the per-turn flags of every unit of `team`.
    pub fn turn_begin_reset(&mut self, team: Team) {
        for unit in self.units.iter_mut().filter(|unit| unit.team == team) {
            unit.move_points = unit.move_range;
            unit.has_attacked = false;
            unit.has_acted = false;
        }
    }

    /// Marks every unit of `team` without move points as having acted.
    pub fn finalize_exhausted(&mut self, team: Team) {
        for unit in self.units.iter_mut().filter(|unit| unit.team == team) {
            if unit.move_points == 0 {
                unit.has_acted = true;
            }
        }
    }

    /// Whether `team` has nothing left to do this turn. Does not modify the simulation.
    pub fn is_turn_over(&self, team: Team) -> bool {
        self.units_of(team)
            .all(|unit| unit.has_acted || unit.move_points == 0)
    }

    /// Marks exhausted units as having acted, then reports whether every unit of `team` has acted.
    pub fn turn_end(&mut self, team: Team) -> bool {
        self.finalize_exhausted(team);
        self.units_of(team).all(|unit| unit.has_acted)
    }

    pub fn game_result(&self) -> Option<GameResult> {
        let team_one_alive = self.units_of(Team::One).next().is_some();
        let team_two_alive = self.units_of(Team::Two).next().is_some();
        match (team_one_alive, team_two_alive) {
            (true, true) => None,
            (true, false) => Some(GameResult::Win(Team::One)),
            (false, true) => Some(GameResult::Win(Team::Two)),
            (false, false) => Some(GameResult::Draw),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_result().is_some()
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.board.height() as i32 {
            for x in 0..self.board.width() as i32 {
                match self.unit_at(x, y) {
                    Some(unit) if unit.team == Team::One => {
                        write!(f, "{}", unit.kind.symbol().to_ascii_uppercase())?
                    }
                    Some(unit) => write!(f, "{}", unit.kind.symbol())?,
                    None => write!(f, "{}", self.board.terrain(x, y).symbol())?,
                }
            }
            writeln!(f)?;
        }
        for unit in self.units.iter() {
            writeln!(
                f,
                "#{} {} {} at ({}, {}): {}/{} hp",
                unit.id, unit.team, unit.kind, unit.x, unit.y, unit.health, unit.max_health
            )?;
        }
        Ok(())
    }
}
