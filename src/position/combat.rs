use crate::position::terrain::Board;
use crate::position::unit::{Unit, HEALTH_INFLUENCE};

/// Damage `attacker` deals to `defender` if the attack connects. Always at least 1.
pub fn damage(board: &Board, attacker: &Unit, defender: &Unit) -> i32 {
    let health_fraction = attacker.health.max(0) as f64 / attacker.max_health.max(1) as f64;
    let health_factor = (1.0 - HEALTH_INFLUENCE) + HEALTH_INFLUENCE * health_fraction;
    let armor_factor = 100.0 / (100.0 + 10.0 * defender.armor as f64);
    let type_factor = attacker.kind.effectiveness(defender.kind);
    let attack_bonus = board.terrain(attacker.x, attacker.y).attack_bonus();
    let defense_bonus = board.terrain(defender.x, defender.y).defense_bonus();

    let terrain_factor = (1.0 + attack_bonus) * (1.0 - defense_bonus);
    let raw =
        attacker.attack_power as f64 * health_factor * armor_factor * type_factor * terrain_factor;

    // Truncates towards zero
    (raw as i32).max(1)
}

/// The result of one attack, computed from the health both sides had before it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Exchange {
    pub dealt: i32,
    pub retaliation: i32,
}

pub fn resolve(board: &Board, attacker: &Unit, defender: &Unit) -> Exchange {
    let dealt = damage(board, attacker, defender);
    let retaliation = if !attacker.is_ranged()
        && defender.health > dealt
        && attacker.distance_to(defender) == 1
    {
        damage(board, defender, attacker)
    } else {
        0
    };
    Exchange { dealt, retaliation }
}
