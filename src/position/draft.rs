//! Army selection within a funds budget, and placement of the drafted units on the board.

use std::str::FromStr;

use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::position::unit::{UnitKind, ALL_KINDS};
use crate::position::{Simulation, Team, UnitId};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DraftStrategy {
    Balanced,
    Rush,
    Defense,
    Ranged,
}

pub const ALL_STRATEGIES: [DraftStrategy; 4] = [
    DraftStrategy::Balanced,
    DraftStrategy::Rush,
    DraftStrategy::Defense,
    DraftStrategy::Ranged,
];

impl DraftStrategy {
    pub fn weight(self, kind: UnitKind) -> f32 {
        use DraftStrategy::*;
        use UnitKind::*;
        match (self, kind) {
            (Balanced, _) => 0.25,
            (Rush, Horseman) => 0.5,
            (Rush, Swordsman) => 0.3,
            (Rush, Archer | Spearman) => 0.1,
            (Defense, Spearman) => 0.4,
            (Defense, Swordsman) => 0.25,
            (Defense, Archer) => 0.35,
            (Defense, Horseman) => 0.0,
            (Ranged, Archer) => 0.5,
            (Ranged, Spearman) => 0.3,
            (Ranged, Swordsman | Horseman) => 0.1,
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        ALL_STRATEGIES[rng.gen_range(0..ALL_STRATEGIES.len())]
    }

    /// Picks affordable unit kinds by weight until nothing with a positive weight is affordable.
    pub fn draft<R: Rng>(self, funds: u32, rng: &mut R) -> Vec<UnitKind> {
        let mut remaining = funds;
        let mut army = vec![];
        loop {
            let affordable: Vec<UnitKind> = ALL_KINDS
                .iter()
                .copied()
                .filter(|kind| kind.stats().cost <= remaining && self.weight(*kind) > 0.0)
                .collect();
            let Ok(kind) = affordable.choose_weighted(rng, |kind| self.weight(*kind)) else {
                break;
            };
            remaining -= kind.stats().cost;
            army.push(*kind);
        }
        army
    }
}

impl FromStr for DraftStrategy {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "balanced" => Ok(DraftStrategy::Balanced),
            "rush" => Ok(DraftStrategy::Rush),
            "defense" => Ok(DraftStrategy::Defense),
            "ranged" => Ok(DraftStrategy::Ranged),
            _ => Err(format!("Unknown draft strategy \"{}\"", input)),
        }
    }
}

const SPACING_X: i32 = 2;
const UNITS_PER_ROW: usize = 3;

/// Places `army` in formation. Team one deploys from the bottom left, team two from the top right.
/// Units that find no free tile nearby are skipped.
pub fn deploy(sim: &mut Simulation, team: Team, army: &[UnitKind]) -> Vec<UnitId> {
    let width = sim.board().width() as i32;
    let height = sim.board().height() as i32;
    let (start_x, start_y) = match team {
        Team::One => (1, height - 4),
        Team::Two => (width - 6, 1),
    };
    let start_x = start_x.clamp(0, width - 1);
    let start_y = start_y.clamp(0, height - 1);

    let mut ids = vec![];
    let (mut x, mut y) = (start_x, start_y);
    for (i, kind) in army.iter().enumerate() {
        match nearest_free_tile(sim, x, y) {
            Some((free_x, free_y)) => {
                if let Some(id) = sim.add_unit(*kind, team, free_x, free_y) {
                    ids.push(id);
                }
                x = free_x;
                y = free_y;
            }
            None => warn!("No room to deploy {} for {}", kind, team),
        }
        x += SPACING_X;
        if (i + 1) % UNITS_PER_ROW == 0 {
            x = start_x;
            y += 1;
        }
    }
    ids
}

// Tries a small window around the anchor first, then rings of growing radius
fn nearest_free_tile(sim: &Simulation, x: i32, y: i32) -> Option<(i32, i32)> {
    for dy in -1..3 {
        for dx in -1..3 {
            if sim.is_free(x + dx, y + dy) {
                return Some((x + dx, y + dy));
            }
        }
    }
    let max_radius = sim.board().width().max(sim.board().height()) as i32;
    for radius in 1..=max_radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs().max(dy.abs()) == radius && sim.is_free(x + dx, y + dy) {
                    return Some((x + dx, y + dy));
                }
            }
        }
    }
    None
}
