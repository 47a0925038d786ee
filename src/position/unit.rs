use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::position::Team;

/// Identifies a unit for its whole lifetime. Ids are never reused within one simulation.
pub type UnitId = u32;

/// Movement is measured in thousandths of an orthogonal plain-tile step.
pub type MovePoints = u32;

pub const MOVE_POINT_SCALE: MovePoints = 1000;

/// Funds each side receives for the draft
pub const STARTING_FUNDS: u32 = 100;

/// Fraction of attack power that scales with the attacker's remaining health
pub const HEALTH_INFLUENCE: f64 = 0.9;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum UnitKind {
    Swordsman,
    Archer,
    Horseman,
    Spearman,
}

pub const ALL_KINDS: [UnitKind; 4] = [
    UnitKind::Swordsman,
    UnitKind::Archer,
    UnitKind::Horseman,
    UnitKind::Spearman,
];

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct UnitStats {
    pub health: i32,
    pub armor: u32,
    pub attack_power: u32,
    pub attack_range: u32,
    pub move_range: MovePoints,
    pub cost: u32,
}

impl UnitKind {
    pub const fn stats(self) -> UnitStats {
        match self {
            UnitKind::Swordsman => UnitStats {
                health: 110,
                armor: 40,
                attack_power: 50,
                attack_range: 1,
                move_range: 2 * MOVE_POINT_SCALE,
                cost: 20,
            },
            UnitKind::Archer => UnitStats {
                health: 70,
                armor: 15,
                attack_power: 45,
                attack_range: 3,
                move_range: 3 * MOVE_POINT_SCALE,
                cost: 25,
            },
            UnitKind::Horseman => UnitStats {
                health: 100,
                armor: 30,
                attack_power: 50,
                attack_range: 1,
                move_range: 4 * MOVE_POINT_SCALE,
                cost: 30,
            },
            UnitKind::Spearman => UnitStats {
                health: 115,
                armor: 35,
                attack_power: 50,
                attack_range: 1,
                move_range: 2 * MOVE_POINT_SCALE,
                cost: 20,
            },
        }
    }

    /// Damage multiplier when `self` attacks `defender`.
    pub fn effectiveness(self, defender: UnitKind) -> f64 {
        use UnitKind::*;
        match (self, defender) {
            (Archer, Horseman) => 0.8,
            (Horseman, Archer) => 1.3,
            (Horseman, Swordsman) => 1.1,
            (Horseman, Spearman) => 0.8,
            (Spearman, Swordsman) => 0.9,
            (Spearman, Horseman) => 1.3,
            _ => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Swordsman => "Swordsman",
            UnitKind::Archer => "Archer",
            UnitKind::Horseman => "Horseman",
            UnitKind::Spearman => "Spearman",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            UnitKind::Swordsman => 's',
            UnitKind::Archer => 'a',
            UnitKind::Horseman => 'h',
            UnitKind::Spearman => 'p',
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(input))
            .copied()
            .ok_or_else(|| format!("Unknown unit kind \"{}\"", input))
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub team: Team,
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub max_health: i32,
    pub armor: u32,
    pub attack_power: u32,
    pub attack_range: u32,
    pub move_range: MovePoints,
    pub move_points: MovePoints,
    pub has_attacked: bool,
    pub has_acted: bool,
}

impl Unit {
    pub fn new(id: UnitId, kind: UnitKind, team: Team, x: i32, y: i32) -> Self {
        let stats = kind.stats();
        Unit {
            id,
            kind,
            team,
            x,
            y,
            health: stats.health,
            max_health: stats.health,
            armor: stats.armor,
            attack_power: stats.attack_power,
            attack_range: stats.attack_range,
            move_range: stats.move_range,
            move_points: stats.move_range,
            has_attacked: false,
            has_acted: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_ranged(&self) -> bool {
        self.attack_range > 1
    }

    /// Whether the unit may still be given an order this turn
    pub fn can_act(&self) -> bool {
        !self.has_acted && !self.has_attacked && self.move_points > 0
    }

    pub fn distance_to(&self, other: &Unit) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn in_attack_range(&self, other: &Unit) -> bool {
        self.distance_to(other) <= self.attack_range.max(1)
    }

    pub(crate) fn state(&self) -> UnitState {
        UnitState {
            x: self.x,
            y: self.y,
            health: self.health,
            move_points: self.move_points,
            has_attacked: self.has_attacked,
            has_acted: self.has_acted,
        }
    }

    pub(crate) fn restore(&mut self, state: &UnitState) {
        self.x = state.x;
        self.y = state.y;
        self.health = state.health;
        self.move_points = state.move_points;
        self.has_attacked = state.has_attacked;
        self.has_acted = state.has_acted;
    }
}

/// The mutable part of a unit, saved before a reversible action touches it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct UnitState {
    x: i32,
    y: i32,
    health: i32,
    move_points: MovePoints,
    has_attacked: bool,
    has_acted: bool,
}
